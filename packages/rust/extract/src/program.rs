//! Program detail page parser.
//!
//! The page is a single label/value table. Most labels map straight onto a
//! scalar field; "Duration of Study (years)" holds nested sub-tables that
//! expand into [`DurationRow`]s and [`StudyScheduleRow`]s.

use qualreg_shared::{DurationRow, ProgramDetails, StudyScheduleRow};
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::listing::clean_former_name;
use crate::row::{cell_elements, cells, label_value};
use crate::table::{TABLE, TR, first_table};

const FORMER_NAME_MARKER: &str = "Previously known as :";
/// Offset from the marker start to the former name (lands before the `:` separator).
const FORMER_NAME_OFFSET: usize = 19;

/// Substring identifying the total-duration cell of a duration sub-table.
pub const DURATION_MARKER: &str = "year/s";

/// A sub-table with a row at least this wide is the study schedule.
const SCHEDULE_ROW_CELLS: usize = 6;
const DURATION_ROW_CELLS: usize = 3;
/// Rows carrying the total duration have the figure in a trailing column.
const DURATION_VALUE_ROW_CELLS: usize = 4;

// ---------------------------------------------------------------------------
// Label table
// ---------------------------------------------------------------------------

/// Scalar fields of [`ProgramDetails`] filled from a single value cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    CertificateNumber,
    AccreditationDate,
    ComplianceAudit,
    MqfLevel,
    NecField,
    NumberOfCredits,
    ModeOfStudy,
    ModeOfDelivery,
    Remarks,
}

impl DetailField {
    fn slot(self, details: &mut ProgramDetails) -> &mut Option<String> {
        match self {
            Self::CertificateNumber => &mut details.certificate_number,
            Self::AccreditationDate => &mut details.accreditation_date,
            Self::ComplianceAudit => &mut details.compliance_audit,
            Self::MqfLevel => &mut details.mqf_level,
            Self::NecField => &mut details.nec_field,
            Self::NumberOfCredits => &mut details.number_of_credits,
            Self::ModeOfStudy => &mut details.mode_of_study,
            Self::ModeOfDelivery => &mut details.mode_of_delivery,
            Self::Remarks => &mut details.remarks,
        }
    }
}

/// What to do with a recognised label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailRule {
    Scalar(DetailField),
    /// Look for a former-name annotation in the value.
    QualificationName,
    /// Expand the value cell's nested duration and schedule tables.
    Duration,
}

pub const DETAIL_LABELS: &[(&str, DetailRule)] = &[
    ("Certificate Number", DetailRule::Scalar(DetailField::CertificateNumber)),
    (
        "Date of Accreditation (dd/mm/yyyy)",
        DetailRule::Scalar(DetailField::AccreditationDate),
    ),
    ("Compliance Audit", DetailRule::Scalar(DetailField::ComplianceAudit)),
    ("MQF Level", DetailRule::Scalar(DetailField::MqfLevel)),
    (
        "NEC Field (National Education Code)",
        DetailRule::Scalar(DetailField::NecField),
    ),
    ("Number of Credits", DetailRule::Scalar(DetailField::NumberOfCredits)),
    ("Mode of Study", DetailRule::Scalar(DetailField::ModeOfStudy)),
    ("Mode of Delivery", DetailRule::Scalar(DetailField::ModeOfDelivery)),
    ("Remark(s)", DetailRule::Scalar(DetailField::Remarks)),
    ("Name of Qualification", DetailRule::QualificationName),
    ("Duration of Study (years)", DetailRule::Duration),
];

pub fn detail_rule(label: &str) -> Option<DetailRule> {
    DETAIL_LABELS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, rule)| *rule)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Populate `details` from a program detail page.
pub fn parse_program_details(doc: &Html, details: &mut ProgramDetails) {
    let Some(table) = first_table(doc) else {
        debug!("program detail table not found");
        return;
    };

    for row in table.select(&TR) {
        let Some(lv) = label_value(row) else { continue };
        let Some(rule) = detail_rule(&lv.label) else { continue };

        match rule {
            DetailRule::Scalar(field) => *field.slot(details) = Some(lv.value),
            DetailRule::QualificationName => {
                if let Some(former) = former_qualification_name(&lv.value) {
                    details.former_name = Some(former);
                }
            }
            DetailRule::Duration => parse_duration_cell(lv.value_cell, details),
        }
    }
}

/// Former name from `"... (Previously known as : X)"`.
pub fn former_qualification_name(value: &str) -> Option<String> {
    let from = value.find(FORMER_NAME_MARKER)? + FORMER_NAME_OFFSET;
    let end = value.rfind(')').filter(|&end| end > from)?;
    clean_former_name(&value[from..end])
}

fn parse_duration_cell(cell: ElementRef<'_>, details: &mut ProgramDetails) {
    let sub_tables: Vec<ElementRef<'_>> = cell.select(&TABLE).collect();
    let duration_tables: Vec<ElementRef<'_>> = sub_tables
        .iter()
        .copied()
        .filter(|t| !is_schedule_table(*t))
        .collect();

    for table in &duration_tables {
        push_duration_rows(*table, &mut details.duration_table);
    }

    let schedule = sub_tables
        .iter()
        .rev()
        .find(|t| !duration_tables.contains(*t));

    match schedule {
        Some(table) => push_schedule_rows(*table, &mut details.study_schedule),
        None => debug!(sub_tables = sub_tables.len(), "no study schedule table"),
    }
}

fn is_schedule_table(table: ElementRef<'_>) -> bool {
    table
        .select(&TR)
        .any(|row| cell_elements(row).len() >= SCHEDULE_ROW_CELLS)
}

fn push_duration_rows(table: ElementRef<'_>, out: &mut Vec<DurationRow>) {
    let rows: Vec<Vec<String>> = table.select(&TR).map(cells).collect();
    let Some(header) = rows.first() else { return };

    let mode = header.first().cloned().unwrap_or_default();
    let duration = rows
        .iter()
        .filter(|r| r.len() >= DURATION_VALUE_ROW_CELLS)
        .filter_map(|r| r.last())
        .find(|last| last.contains(DURATION_MARKER))
        .cloned()
        .unwrap_or_default();

    for row in rows.iter().skip(1) {
        if row.len() < DURATION_ROW_CELLS || row[0].is_empty() {
            continue;
        }
        out.push(DurationRow {
            kind: format!("{mode} - {}", row[0]),
            weeks_per_semester: row[1].clone(),
            semesters: row[2].clone(),
            duration: duration.clone(),
        });
    }
}

fn push_schedule_rows(table: ElementRef<'_>, out: &mut Vec<StudyScheduleRow>) {
    for row in table.select(&TR).skip(1).map(cells) {
        if row.len() < SCHEDULE_ROW_CELLS {
            continue;
        }
        let (starting, weeks, credits) = (&row[0], &row[1], &row[5]);
        if starting.is_empty() || weeks.is_empty() || credits.is_empty() {
            continue;
        }
        out.push(StudyScheduleRow {
            starting: starting.clone(),
            weeks_per_semester: weeks.clone(),
            semesters: row[2].clone(),
            industrial_training: row[3].clone(),
            years: row[4].clone(),
            credits: credits.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_page(rows: &str) -> Html {
        Html::parse_document(&format!("<html><body><table>{rows}</table></body></html>"))
    }

    fn lv(label: &str, value: &str) -> String {
        format!("<tr><td>{label}</td><td>:</td><td>{value}</td></tr>")
    }

    #[test]
    fn scalar_labels_fill_fields() {
        let rows = [
            lv("Certificate Number :", "MQA/FA 1234"),
            lv("MQF Level", "6"),
            lv("Mode of Delivery", "Conventional"),
            lv("Remark(s)", "-"),
            lv("Unknown Label", "ignored"),
        ]
        .concat();

        let mut details = ProgramDetails::default();
        parse_program_details(&detail_page(&rows), &mut details);

        assert_eq!(details.certificate_number.as_deref(), Some("MQA/FA 1234"));
        assert_eq!(details.mqf_level.as_deref(), Some("6"));
        assert_eq!(details.mode_of_delivery.as_deref(), Some("Conventional"));
        assert_eq!(details.remarks.as_deref(), Some("-"));
        assert_eq!(details.accreditation_date, None);
        assert_eq!(details.former_name, None);
    }

    #[test]
    fn qualification_name_annotation() {
        assert_eq!(
            former_qualification_name("Bachelor of IT (Hons) (Previously known as : Bachelor of Computing)")
                .as_deref(),
            Some("Bachelor of Computing")
        );
        assert_eq!(former_qualification_name("Bachelor of IT (Hons)"), None);
        assert_eq!(former_qualification_name("X (Previously known as : )"), None);
    }

    #[test]
    fn every_label_has_a_rule() {
        assert_eq!(DETAIL_LABELS.len(), 11);
        for (label, rule) in DETAIL_LABELS {
            assert_eq!(detail_rule(label), Some(*rule));
        }
    }

    #[test]
    fn schedule_rows_require_key_cells() {
        let value = r#"
            <table><tr><td>Full Time</td><td>Weeks</td><td>Semesters</td><td>Duration</td></tr>
                   <tr><td>Long</td><td>14</td><td>6</td><td>3 year/s</td></tr></table>
            <table>
              <tr><td>Intake</td><td>Weeks</td><td>Sem</td><td>Industrial Training</td><td>Years</td><td>Credits</td></tr>
              <tr><td>July</td><td>14</td><td>6</td><td>Yes</td><td>3</td><td>90</td></tr>
              <tr><td>&nbsp;</td><td></td><td></td><td></td><td></td><td></td></tr>
              <tr><td>March</td><td>14</td><td>6</td><td>No</td><td>3</td><td></td></tr>
            </table>"#;

        let mut details = ProgramDetails::default();
        parse_program_details(&detail_page(&lv("Duration of Study (years)", value)), &mut details);

        assert_eq!(details.duration_table.len(), 1);
        assert_eq!(details.study_schedule.len(), 1);
        let row = &details.study_schedule[0];
        assert_eq!(row.starting, "July");
        assert_eq!(row.industrial_training, "Yes");
        assert_eq!(row.credits, "90");
    }

    #[test]
    fn duration_without_year_marker_is_empty() {
        let value = r#"<table><tr><td>Part Time</td></tr>
                              <tr><td>Short</td><td>10</td><td>4</td></tr></table>"#;

        let mut details = ProgramDetails::default();
        parse_program_details(&detail_page(&lv("Duration of Study (years)", value)), &mut details);

        assert_eq!(details.duration_table.len(), 1);
        assert_eq!(details.duration_table[0].kind, "Part Time - Short");
        assert_eq!(details.duration_table[0].duration, "");
        assert!(details.study_schedule.is_empty());
    }

    #[test]
    fn page_without_table_leaves_defaults() {
        let doc = Html::parse_document("<html><body><p>Record not found</p></body></html>");
        let mut details = ProgramDetails::default();
        parse_program_details(&doc, &mut details);
        assert_eq!(details, ProgramDetails::default());
    }
}
