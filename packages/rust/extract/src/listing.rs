//! Listing page parser: one page of institution entries plus the pagination link.

use qualreg_shared::Institution;
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::row::{cell_elements, link_param, text_of};
use crate::table::{ANCHOR, Fingerprint, TR, locate};

/// The institution index table.
pub const LISTING_TABLE: Fingerprint = Fingerprint::new(
    "table",
    &[("border", "2"), ("width", "661"), ("bordercolor", "#80000")],
);

/// Name-cell values that mark a column header row.
pub const HEADER_TOKENS: &[&str] = &["NO", "IPTS NAME"];

/// Substrings that mark a footnote row.
pub const FOOTNOTE_MARKERS: &[&str] = &[
    "Programme that is marked in green colour",
    "ACCREDITATION STATUS",
];

/// Exact link texts of the pagination anchor.
pub const NEXT_PAGE_LABELS: &[&str] = &["Next 25 Records", "Next Record"];

/// Href substring shared by all pagination anchors.
pub const DEFAULT_NEXT_PAGE_PATTERN: &str = "eakrbyipts.cfm?StartRow=";

/// Query parameter carrying the institution identifier.
pub const INSTITUTION_ID_PARAM: &str = "IDAkrIPTS";

const FORMER_NAME_MARKER: &str = "(Previously known as :";
/// Offset from the marker start to the former name (lands on the `:` separator).
const FORMER_NAME_OFFSET: usize = 21;

/// One parsed listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Entries in row order. Unlinked entries carry an empty id.
    pub entries: Vec<Institution>,
    /// Absolute URL of the following page, if the page links one.
    pub next_page: Option<Url>,
}

/// Parse a listing page fetched from `page_url`.
pub fn parse_listing(doc: &Html, page_url: &Url, next_page_pattern: &str) -> ListingPage {
    let entries = match locate(doc, &LISTING_TABLE, 0) {
        Some(table) => table.select(&TR).filter_map(parse_entry).collect(),
        None => {
            debug!(%page_url, "listing table not found");
            Vec::new()
        }
    };

    ListingPage {
        entries,
        next_page: find_next_page(doc, page_url, next_page_pattern),
    }
}

fn parse_entry(row: scraper::ElementRef<'_>) -> Option<Institution> {
    let cells = cell_elements(row);
    if cells.len() < 3 {
        return None;
    }

    let raw_name = text_of(cells[1]);
    if is_sentinel(&raw_name) {
        debug!(name = %raw_name, "skipping header/footnote row");
        return None;
    }

    let state = text_of(cells[2]);
    let id = link_param(cells[1], INSTITUTION_ID_PARAM).unwrap_or_default();
    let (name, former_name) = split_former_name(&raw_name);

    Some(Institution::new(id, name, state, former_name))
}

/// Whether a name cell is a header token, a footnote, or empty padding.
pub fn is_sentinel(name: &str) -> bool {
    name.is_empty()
        || HEADER_TOKENS.contains(&name)
        || FOOTNOTE_MARKERS.iter().any(|m| name.contains(m))
}

/// Split `"X (Previously known as : Y)"` into `("X", Some("Y"))`.
pub fn split_former_name(raw: &str) -> (String, Option<String>) {
    let Some(start) = raw.find(FORMER_NAME_MARKER) else {
        return (raw.to_string(), None);
    };

    let name = raw[..start].trim().to_string();
    let from = start + FORMER_NAME_OFFSET;
    let former = raw
        .rfind(')')
        .filter(|&end| end > from)
        .and_then(|end| clean_former_name(&raw[from..end]));

    (name, former)
}

/// Trim an extracted annotation and drop the leading `:` separator.
pub(crate) fn clean_former_name(slice: &str) -> Option<String> {
    let cleaned = slice.trim().trim_start_matches(':').trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Find the "next page" anchor and resolve it against the current page.
pub fn find_next_page(doc: &Html, page_url: &Url, pattern: &str) -> Option<Url> {
    doc.select(&ANCHOR)
        .filter(|a| a.value().attr("href").is_some_and(|h| h.contains(pattern)))
        .find(|a| NEXT_PAGE_LABELS.contains(&text_of(*a).as_str()))
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://www2.mqa.gov.my/mqr/english/eakrbyipts.cfm").unwrap()
    }

    fn listing(rows: &str, extra: &str) -> Html {
        Html::parse_document(&format!(
            r##"<html><body><table border="2" width="661" bordercolor="#80000">{rows}</table>{extra}</body></html>"##
        ))
    }

    #[test]
    fn header_row_and_former_name() {
        let doc = listing(
            r#"<tr><td>NO</td><td>IPTS NAME</td><td>STATE</td></tr>
               <tr><td>1</td><td><a href="eakrKPList.cfm?IDAkrIPTS=42">Example University (Previously known as : Old Name U)</a></td><td>Selangor</td></tr>"#,
            "",
        );

        let page = parse_listing(&doc, &page_url(), DEFAULT_NEXT_PAGE_PATTERN);
        assert_eq!(page.entries.len(), 1);

        let inst = &page.entries[0];
        assert_eq!(inst.id, "42");
        assert_eq!(inst.name, "Example University");
        assert_eq!(inst.state, "Selangor");
        assert_eq!(inst.former_name.as_deref(), Some("Old Name U"));
        assert!(page.next_page.is_none());
    }

    #[test]
    fn every_sentinel_is_excluded() {
        for token in HEADER_TOKENS {
            assert!(is_sentinel(token), "{token}");
        }
        for marker in FOOTNOTE_MARKERS {
            assert!(is_sentinel(&format!("* {marker} below")), "{marker}");
        }
        assert!(is_sentinel(""));
        assert!(!is_sentinel("Universiti Malaya"));
        // Header tokens are exact matches, not substrings.
        assert!(!is_sentinel("NOTTINGHAM UNIVERSITY"));
    }

    #[test]
    fn unlinked_entry_is_kept_with_empty_id() {
        let doc = listing("<tr><td>3</td><td>Kolej Tanpa Pautan</td><td>Perak</td></tr>", "");
        let page = parse_listing(&doc, &page_url(), DEFAULT_NEXT_PAGE_PATTERN);

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].id, "");
        assert!(!page.entries[0].is_linked());
    }

    #[test]
    fn missing_table_yields_no_entries() {
        let doc = Html::parse_document("<html><body><table><tr><td>1</td><td>X</td><td>Y</td></tr></table></body></html>");
        let page = parse_listing(&doc, &page_url(), DEFAULT_NEXT_PAGE_PATTERN);
        assert!(page.entries.is_empty());
    }

    #[test]
    fn split_former_name_edge_cases() {
        assert_eq!(split_former_name("Plain College"), ("Plain College".into(), None));

        // No closing parenthesis after the marker: name still truncated.
        let (name, former) = split_former_name("Kolej B (Previously known as :");
        assert_eq!(name, "Kolej B");
        assert_eq!(former, None);

        let (name, former) = split_former_name("Kolej C (Previously known as :   Kolej Lama  )");
        assert_eq!(name, "Kolej C");
        assert_eq!(former.as_deref(), Some("Kolej Lama"));
    }

    #[test]
    fn next_page_resolves_root_relative_href() {
        let doc = listing(
            "",
            r#"<a href="/mqr/english/eakrbyipts.cfm?StartRow=1">Previous 25 Records</a>
               <a href="/mqr/english/eakrbyipts.cfm?StartRow=26">Next 25 Records</a>"#,
        );
        let next = find_next_page(&doc, &page_url(), DEFAULT_NEXT_PAGE_PATTERN).unwrap();
        assert_eq!(
            next.as_str(),
            "https://www2.mqa.gov.my/mqr/english/eakrbyipts.cfm?StartRow=26"
        );
    }

    #[test]
    fn next_page_requires_exact_label_and_pattern() {
        let doc = listing(
            "",
            r#"<a href="eakrbyipts.cfm?StartRow=26">Next 25 Records &raquo;</a>
               <a href="other.cfm?StartRow=26">Next Record</a>"#,
        );
        assert!(find_next_page(&doc, &page_url(), DEFAULT_NEXT_PAGE_PATTERN).is_none());

        let doc = listing("", r#"<a href="eakrbyipts.cfm?StartRow=51">Next Record</a>"#);
        let next = find_next_page(&doc, &page_url(), DEFAULT_NEXT_PAGE_PATTERN).unwrap();
        assert!(next.as_str().ends_with("/mqr/english/eakrbyipts.cfm?StartRow=51"));
    }
}
