//! Institution detail page parser: contact block and program summaries.

use qualreg_shared::{Contact, Institution, Program};
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::row::{cell_elements, label_value, link_param, text_of};
use crate::table::{Fingerprint, TR, locate};

/// The contact information table.
pub const INFO_TABLE: Fingerprint = Fingerprint::new(
    "table",
    &[
        ("border", "1"),
        ("width", "100%"),
        ("bordercolor", "80000"),
        ("cellspacing", "0"),
        ("cellpadding", "0"),
    ],
);

/// The program table. The first match on the page is a layout shell.
pub const PROGRAM_TABLE: Fingerprint = Fingerprint::new(
    "table",
    &[
        ("border", "1"),
        ("width", "100%"),
        ("bordercolor", "80000"),
        ("style", "border-collapse: collapse"),
        ("cellpadding", "0"),
    ],
);

/// Matches of [`PROGRAM_TABLE`] to skip before the data table.
pub const PROGRAM_TABLE_SKIP: usize = 1;

/// Minimum cells in a program data row.
const PROGRAM_ROW_CELLS: usize = 6;

/// First-cell text of the program table's header row.
pub const PROGRAM_HEADER_TOKEN: &str = "No.";

/// `(cell index, text)` pairs identifying a restated column-header row.
pub const RESTATED_HEADER_CELLS: &[(usize, &str)] = &[
    (1, "NAME OF QUALIFICATION"),
    (2, "TYPE"),
    (3, "NO OF CREDITS"),
    (4, "NEC FIELD (National Education Code)"),
];

pub const REFERENCE_PARAM: &str = "NoRujA";
pub const PROGRAM_ID_PARAM: &str = "IdAkrKP";

// ---------------------------------------------------------------------------
// Contact mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Address,
    Telephone,
    Fax,
    Email,
    Website,
}

impl ContactField {
    fn slot(self, contact: &mut Contact) -> &mut String {
        match self {
            Self::Address => &mut contact.address,
            Self::Telephone => &mut contact.telephone,
            Self::Fax => &mut contact.fax,
            Self::Email => &mut contact.email,
            Self::Website => &mut contact.website,
        }
    }
}

/// Info-table labels and the contact field each one fills.
pub const CONTACT_LABELS: &[(&str, ContactField)] = &[
    ("Address", ContactField::Address),
    ("Telephone No.", ContactField::Telephone),
    ("Fax No.", ContactField::Fax),
    ("E-Mail", ContactField::Email),
    ("Website", ContactField::Website),
];

pub fn contact_field(label: &str) -> Option<ContactField> {
    CONTACT_LABELS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, field)| *field)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Fill `institution.contact` from its detail page and return the program summaries.
///
/// Summaries carry id, reference number, name, type, level and field; their
/// details are still empty. Identity fields of `institution` are never touched.
pub fn parse_institution(doc: &Html, institution: &mut Institution) -> Vec<Program> {
    match locate(doc, &INFO_TABLE, 0) {
        Some(table) => fill_contact(table, &mut institution.contact),
        None => debug!(id = %institution.id, "info table not found"),
    }

    match locate(doc, &PROGRAM_TABLE, PROGRAM_TABLE_SKIP) {
        Some(table) => table.select(&TR).filter_map(parse_program_row).collect(),
        None => {
            debug!(id = %institution.id, "program table not found");
            Vec::new()
        }
    }
}

fn fill_contact(table: ElementRef<'_>, contact: &mut Contact) {
    for row in table.select(&TR) {
        let Some(lv) = label_value(row) else { continue };
        if let Some(field) = contact_field(&lv.label) {
            *field.slot(contact) = lv.value;
        }
    }
}

fn parse_program_row(row: ElementRef<'_>) -> Option<Program> {
    let cells = cell_elements(row);
    if cells.len() < PROGRAM_ROW_CELLS {
        return None;
    }

    let texts: Vec<String> = cells[..5].iter().map(|c| text_of(*c)).collect();
    if texts[0] == PROGRAM_HEADER_TOKEN || is_restated_header(&texts) {
        return None;
    }

    let name = texts[1].clone();
    if name.is_empty() {
        return None;
    }

    // Both parameters or neither: a half-parsed link cannot address the detail page.
    let (reference_number, id) = match (
        link_param(cells[1], REFERENCE_PARAM),
        link_param(cells[1], PROGRAM_ID_PARAM),
    ) {
        (Some(reference), Some(id)) => (reference, id),
        _ => (String::new(), String::new()),
    };

    Some(Program {
        id,
        reference_number,
        name,
        kind: texts[2].clone(),
        level: texts[3].clone(),
        field: texts[4].clone(),
        details: Default::default(),
    })
}

fn is_restated_header(texts: &[String]) -> bool {
    RESTATED_HEADER_CELLS
        .iter()
        .any(|(idx, header)| texts.get(*idx).is_some_and(|t| t == header))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_OPEN: &str = r#"<table border="1" width="100%" bordercolor="80000" cellspacing="0" cellpadding="0">"#;
    const PROGRAM_OPEN: &str = r#"<table border="1" width="100%" bordercolor="80000" style="border-collapse: collapse" cellpadding="0">"#;

    fn page(info_rows: &str, program_rows: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body>{INFO_OPEN}{info_rows}</table>\
             {PROGRAM_OPEN}<tr><td>shell</td></tr></table>\
             {PROGRAM_OPEN}{program_rows}</table></body></html>"
        ))
    }

    #[test]
    fn contact_labels_map_exactly() {
        let doc = page(
            r#"<tr><td>Address</td><td>:</td><td>Jalan 1, Shah Alam</td></tr>
               <tr><td>Telephone No.</td><td>:</td><td>03-5544 2000</td></tr>
               <tr><td>E-Mail</td><td>:</td><td>info@example.edu.my</td></tr>
               <tr><td>Vice Chancellor</td><td>:</td><td>Someone</td></tr>"#,
            "",
        );
        let mut inst = Institution::new("42", "Example University", "Selangor", None);
        let programs = parse_institution(&doc, &mut inst);

        assert!(programs.is_empty());
        assert_eq!(inst.contact.address, "Jalan 1, Shah Alam");
        assert_eq!(inst.contact.telephone, "03-5544 2000");
        assert_eq!(inst.contact.email, "info@example.edu.my");
        assert_eq!(inst.contact.fax, "");
        assert_eq!(inst.id, "42");
        assert_eq!(inst.name, "Example University");
    }

    #[test]
    fn second_program_table_is_used_and_headers_skipped() {
        let doc = page(
            "",
            r#"<tr><td>No.</td><td>NAME OF QUALIFICATION</td><td>TYPE</td><td>NO OF CREDITS</td><td>NEC</td><td>STATUS</td></tr>
               <tr><td></td><td>NAME OF QUALIFICATION</td><td>x</td><td>x</td><td>x</td><td>x</td></tr>
               <tr><td>1</td><td><a href="epapar.cfm?NoRujA=A1234&IdAkrKP=77">Bachelor of Science</a></td><td>Full Accreditation</td><td>120</td><td>440</td><td>Active</td></tr>
               <tr><td>2</td><td></td><td>spacer</td><td></td><td></td><td></td></tr>
               <tr><td>3</td><td>Diploma in Art</td><td>Provisional</td><td>90</td><td>211</td><td>Active</td></tr>"#,
        );
        let mut inst = Institution::new("42", "Example University", "Selangor", None);
        let programs = parse_institution(&doc, &mut inst);

        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].reference_number, "A1234");
        assert_eq!(programs[0].id, "77");
        assert_eq!(programs[0].name, "Bachelor of Science");
        assert_eq!(programs[0].kind, "Full Accreditation");
        assert_eq!(programs[0].level, "120");
        assert_eq!(programs[0].field, "440");

        assert_eq!(programs[1].name, "Diploma in Art");
        assert!(!programs[1].is_linked());
        // Summaries are handed back; the institution list is filled by the caller.
        assert!(inst.programs.is_empty());
    }

    #[test]
    fn each_restated_header_cell_filters_alone() {
        let doc = page(
            "",
            r#"<tr><td>1</td><td>Certificate A</td><td>TYPE</td><td>x</td><td>x</td><td>x</td></tr>
               <tr><td>2</td><td>Certificate B</td><td>x</td><td>NO OF CREDITS</td><td>x</td><td>x</td></tr>
               <tr><td>3</td><td>Certificate C</td><td>x</td><td>x</td><td>NEC FIELD (National Education Code)</td><td>x</td></tr>
               <tr><td>4</td><td>Diploma in Art</td><td>Provisional</td><td>90</td><td>211</td><td>Active</td></tr>"#,
        );
        let mut inst = Institution::new("1", "X", "Y", None);
        let programs = parse_institution(&doc, &mut inst);

        let names: Vec<&str> = programs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Diploma in Art"]);
    }

    #[test]
    fn restated_header_text_elsewhere_is_kept() {
        // "TYPE" outside the type column is ordinary data.
        let doc = page(
            "",
            r#"<tr><td>1</td><td>TYPE</td><td>Full Accreditation</td><td>60</td><td>x</td><td>x</td></tr>"#,
        );
        let mut inst = Institution::new("1", "X", "Y", None);
        let programs = parse_institution(&doc, &mut inst);
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].name, "TYPE");
    }

    #[test]
    fn encoded_reference_is_decoded() {
        let doc = page(
            "",
            r#"<tr><td>1</td><td><a href="epapar.cfm?NoRujA=MQA%2FFA%201234&amp;IdAkrKP=77">Master of Arts</a></td><td>t</td><td>l</td><td>f</td><td>s</td></tr>"#,
        );
        let mut inst = Institution::new("1", "X", "Y", None);
        let programs = parse_institution(&doc, &mut inst);
        assert_eq!(programs[0].reference_number, "MQA/FA 1234");
        assert_eq!(programs[0].id, "77");
    }

    #[test]
    fn single_program_table_means_absent() {
        let doc = Html::parse_document(&format!(
            "{PROGRAM_OPEN}<tr><td>1</td><td>Bachelor</td><td>a</td><td>b</td><td>c</td><td>d</td></tr></table>"
        ));
        let mut inst = Institution::new("1", "X", "Y", None);
        assert!(parse_institution(&doc, &mut inst).is_empty());
        assert_eq!(inst.contact, Contact::default());
    }

    #[test]
    fn half_link_leaves_both_ids_empty() {
        let doc = page(
            "",
            r#"<tr><td>1</td><td><a href="epapar.cfm?NoRujA=A1">Master of Arts</a></td><td>t</td><td>l</td><td>f</td><td>s</td></tr>"#,
        );
        let mut inst = Institution::new("1", "X", "Y", None);
        let programs = parse_institution(&doc, &mut inst);
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].reference_number, "");
        assert_eq!(programs[0].id, "");
    }

    #[test]
    fn contact_table_is_complete() {
        for (label, field) in CONTACT_LABELS {
            assert_eq!(contact_field(label), Some(*field));
        }
        assert_eq!(contact_field("address"), None);
    }
}
