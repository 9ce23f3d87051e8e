//! Record Projector. Turns a validated [`CertificateRecord`] into the view
//! models the detail and list screens render.
//!
//! Projection borrows the record, never mutates it, and is total: every
//! optional input has a defined rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::keywords::derive_keywords;
use crate::models::{CertificateRecord, RecordStatus, SubjectRow, TabularData, TabularField};
use crate::normalize::{normalize_field, prettify_label, SENTINEL};
use crate::status::{confidence_tier, resolve_status, ConfidenceTier, ResolvedStatus};

const NO_SUMMARY: &str = "No summary available";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectView {
    pub subject_code: String,
    pub subject_name: String,
    pub grade: String,
    pub credits: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedStudentView {
    pub name: String,
    pub enrollment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationPanel {
    pub student_verified: bool,
    pub confidence_percent: u8,
    pub confidence_tier: ConfidenceTier,
    pub status: ResolvedStatus,
    pub matched_student: Option<MatchedStudentView>,
    pub message: Option<String>,
}

/// Full detail view of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    pub id: i64,
    pub filename: String,
    pub status: RecordStatus,
    pub status_label: String,
    pub created: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub header_rows: Vec<FieldRow>,
    pub subjects: Vec<SubjectView>,
    pub verification: Option<VerificationPanel>,
}

/// One line of a record listing. The extracted columns are `-` when the
/// listing carried no tabular data for the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    pub id: i64,
    pub filename: String,
    pub status_label: String,
    pub processed: bool,
    pub summary: String,
    pub created: String,
    pub student_name: String,
    pub degree: String,
    pub branch: String,
    pub university: String,
    pub enrollment_number: String,
    pub sgpa: String,
    pub cgpa: String,
    pub semester: String,
    pub academic_year: String,
}

pub fn project(record: &CertificateRecord) -> RecordView {
    let empty = TabularData::default();
    let data = record.tabular_data.as_ref().unwrap_or(&empty);

    RecordView {
        id: record.id,
        filename: record.display_filename(),
        status: record.status,
        status_label: status_label(record.status),
        created: format_created(record.created_at),
        summary: summary_text(record),
        keywords: derive_keywords(data),
        header_rows: header_rows(data),
        subjects: data.subjects.iter().map(project_subject).collect(),
        verification: verification_panel(record),
    }
}

pub fn project_row(record: &CertificateRecord) -> RecordRow {
    let data = record.tabular_data.as_ref();
    let cell = |field: TabularField| normalize_field(field.key(), data.and_then(|d| d.get(field)));

    RecordRow {
        id: record.id,
        filename: record.display_filename(),
        status_label: status_label(record.status),
        processed: record.status == RecordStatus::Processed,
        summary: summary_text(record),
        created: format_created(record.created_at),
        student_name: cell(TabularField::StudentName),
        degree: cell(TabularField::Degree),
        branch: cell(TabularField::Branch),
        university: cell(TabularField::UniversityName),
        enrollment_number: cell(TabularField::EnrollmentNumber),
        sgpa: cell(TabularField::Sgpa),
        cgpa: cell(TabularField::Cgpa),
        semester: cell(TabularField::Semester),
        academic_year: cell(TabularField::AcademicYear),
    }
}

/// One row per fixed field, whether or not the extractor found it.
fn header_rows(data: &TabularData) -> Vec<FieldRow> {
    TabularField::ALL
        .iter()
        .map(|field| FieldRow {
            label: prettify_label(field.key()),
            value: normalize_field(field.key(), data.get(*field)),
        })
        .collect()
}

fn project_subject(row: &SubjectRow) -> SubjectView {
    let cell = |v: &Option<String>| normalize_field("subject", v.as_deref());
    SubjectView {
        subject_code: cell(&row.subject_code),
        subject_name: cell(&row.subject_name),
        grade: cell(&row.grade),
        credits: cell(&row.credits),
    }
}

fn verification_panel(record: &CertificateRecord) -> Option<VerificationPanel> {
    let verification = record.verification.as_ref()?;
    Some(VerificationPanel {
        student_verified: verification.student_verified,
        confidence_percent: (verification.confidence_score * 100.0).round() as u8,
        confidence_tier: confidence_tier(verification.confidence_score),
        status: resolve_status(record.simple_status.as_deref()),
        matched_student: verification
            .matched_student
            .as_ref()
            .map(|m| MatchedStudentView {
                name: normalize_field("name", m.name.as_deref()),
                enrollment: normalize_field("enrollment", m.enrollment.as_deref()),
            }),
        message: verification.message.clone(),
    })
}

fn status_label(status: RecordStatus) -> String {
    status.as_str().to_ascii_uppercase()
}

fn summary_text(record: &CertificateRecord) -> String {
    record
        .summary
        .clone()
        .unwrap_or_else(|| NO_SUMMARY.to_string())
}

fn format_created(created_at: Option<DateTime<Utc>>) -> String {
    created_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| SENTINEL.to_string())
}
