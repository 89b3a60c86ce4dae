//! qualreg CLI: harvest the qualifications register into JSON.
//!
//! Walks the accredited-institution listing, follows every institution and
//! program detail page, and writes the assembled records as JSON.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
