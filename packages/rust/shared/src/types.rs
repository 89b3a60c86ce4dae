//! Record types assembled by the harvester.
//!
//! The hierarchy is strict ownership: an [`Institution`] owns its [`Program`]s,
//! and each program owns exactly one [`ProgramDetails`] block. Optional scalars
//! are omitted from serialized output when unset.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Institution
// ---------------------------------------------------------------------------

/// A higher-education provider listed in the register.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    /// Register identifier (`IDAkrIPTS`). Empty when the listing row had no link.
    pub id: String,
    /// Display name, with any "previously known as" annotation removed.
    pub name: String,
    /// State or region column from the listing.
    pub state: String,
    /// Former name parsed out of the listing annotation.
    #[serde(
        rename = "previous_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub former_name: Option<String>,
    /// Contact block from the institution detail page.
    #[serde(flatten)]
    pub contact: Contact,
    /// Accredited programs, in source row order.
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl Institution {
    /// Create a bare listing entry; contact and programs are filled in later.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        state: impl Into<String>,
        former_name: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: state.into(),
            former_name,
            contact: Contact::default(),
            programs: Vec::new(),
        }
    }

    /// Whether the entry carries an identifier that detail pages can be fetched with.
    pub fn is_linked(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Contact fields; each defaults to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub fax: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// One accredited qualification offered by an institution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Program identifier (`IdAkrKP`).
    pub id: String,
    /// Register reference number (`NoRujA`).
    pub reference_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub level: String,
    pub field: String,
    #[serde(default)]
    pub details: ProgramDetails,
}

impl Program {
    /// Whether both link parameters needed for the detail page are present.
    pub fn is_linked(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Scalar fields and sub-tables from a program's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
    #[serde(
        rename = "previous_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub former_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accreditation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_audit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqf_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nec_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_credits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_of_delivery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Duration rows, in source order.
    #[serde(default)]
    pub duration_table: Vec<DurationRow>,
    /// Study-schedule rows, in source order.
    #[serde(default)]
    pub study_schedule: Vec<StudyScheduleRow>,
}

/// One row of a "Duration of Study" sub-table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRow {
    /// Composite label, e.g. `"Full Time - Long"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub weeks_per_semester: String,
    pub semesters: String,
    /// Total duration shared by every row of the originating sub-table.
    pub duration: String,
}

/// One row of the study-schedule sub-table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyScheduleRow {
    pub starting: String,
    pub weeks_per_semester: String,
    pub semesters: String,
    pub industrial_training: String,
    pub years: String,
    pub credits: String,
}
