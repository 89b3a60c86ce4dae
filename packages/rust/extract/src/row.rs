//! Row and cell text helpers.
//!
//! Cells are every `td` below a row in document order, so a row that wraps a
//! nested table also exposes the nested cells after its own. Parsers rely on
//! the leading indices (label at 0, separator at 1, value at 2) staying stable.

use scraper::{ElementRef, Node};
use url::form_urlencoded;

use crate::table::{ANCHOR, TD};

/// Elements that break a text run, the way a browser would render them.
const BLOCK_TAGS: &[&str] = &[
    "br", "p", "div", "table", "tr", "td", "th", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5",
    "h6",
];

/// Visible text of an element with whitespace (including NBSP) collapsed and trimmed.
pub fn text_of(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(e) if BLOCK_TAGS.contains(&e.name()) => raw.push(' '),
            _ => {}
        }
    }
    normalize_ws(&raw)
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cell elements of a row.
pub fn cell_elements(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.select(&TD).collect()
}

/// Ordered, trimmed cell texts of a row.
pub fn cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&TD).map(text_of).collect()
}

/// A `label : value` row.
#[derive(Debug, Clone)]
pub struct LabelValue<'a> {
    /// Label text without its trailing colon.
    pub label: String,
    /// Text of the value cell.
    pub value: String,
    /// The value cell itself, for callers that read nested markup.
    pub value_cell: ElementRef<'a>,
}

/// Read a three-cell `label | : | value` row. Rows with fewer cells yield `None`.
pub fn label_value(row: ElementRef<'_>) -> Option<LabelValue<'_>> {
    let cells = cell_elements(row);
    if cells.len() < 3 {
        return None;
    }

    let raw_label = text_of(cells[0]);
    let label = raw_label
        .strip_suffix(':')
        .map(str::trim_end)
        .unwrap_or(&raw_label)
        .to_string();

    Some(LabelValue {
        label,
        value: text_of(cells[2]),
        value_cell: cells[2],
    })
}

/// Decoded value of the `name` query parameter in an href.
///
/// Values come back percent-decoded so that rebuilding a URL with
/// `append_pair` encodes them exactly once.
pub fn query_param(href: &str, name: &str) -> Option<String> {
    let query = href.split_once('?').map_or(href, |(_, q)| q);
    let query = query.split_once('#').map_or(query, |(q, _)| q);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// `query_param` applied to the first link inside `el`.
pub fn link_param(el: ElementRef<'_>, name: &str) -> Option<String> {
    let href = el.select(&ANCHOR).next()?.value().attr("href")?;
    query_param(href, name)
}
