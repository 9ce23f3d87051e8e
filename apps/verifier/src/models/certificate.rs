use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Backend-owned processing state of a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Uploaded,
    Processing,
    Processed,
    Failed,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Uploaded => "uploaded",
            RecordStatus::Processing => "processing",
            RecordStatus::Processed => "processed",
            RecordStatus::Failed => "failed",
        }
    }

    /// Case-insensitive match against the four wire tags.
    pub fn parse(raw: &str) -> Option<RecordStatus> {
        let raw = raw.trim();
        [
            RecordStatus::Uploaded,
            RecordStatus::Processing,
            RecordStatus::Processed,
            RecordStatus::Failed,
        ]
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(raw))
    }

    fn stage(self) -> u8 {
        match self {
            RecordStatus::Uploaded => 0,
            RecordStatus::Processing => 1,
            RecordStatus::Processed | RecordStatus::Failed => 2,
        }
    }

    /// uploaded → processing → {processed, failed}; staying put is allowed,
    /// moving backwards or between the two terminal states is not.
    pub fn can_advance_to(self, next: RecordStatus) -> bool {
        next == self || next.stage() > self.stage()
    }
}

/// The fifteen fixed extraction fields, in header-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabularField {
    StudentName,
    EnrollmentNumber,
    Degree,
    Branch,
    UniversityName,
    GraduationDate,
    DateOfBirth,
    Grade,
    CertificateType,
    Semester,
    AcademicYear,
    Sgpa,
    Cgpa,
    TotalCredits,
    EarnedCredits,
}

impl TabularField {
    pub const ALL: [TabularField; 15] = [
        TabularField::StudentName,
        TabularField::EnrollmentNumber,
        TabularField::Degree,
        TabularField::Branch,
        TabularField::UniversityName,
        TabularField::GraduationDate,
        TabularField::DateOfBirth,
        TabularField::Grade,
        TabularField::CertificateType,
        TabularField::Semester,
        TabularField::AcademicYear,
        TabularField::Sgpa,
        TabularField::Cgpa,
        TabularField::TotalCredits,
        TabularField::EarnedCredits,
    ];

    /// Wire key as emitted by the backend.
    pub fn key(self) -> &'static str {
        match self {
            TabularField::StudentName => "student_name",
            TabularField::EnrollmentNumber => "enrollment_number",
            TabularField::Degree => "degree",
            TabularField::Branch => "branch",
            TabularField::UniversityName => "university_name",
            TabularField::GraduationDate => "graduation_date",
            TabularField::DateOfBirth => "date_of_birth",
            TabularField::Grade => "grade",
            TabularField::CertificateType => "certificate_type",
            TabularField::Semester => "semester",
            TabularField::AcademicYear => "academic_year",
            TabularField::Sgpa => "sgpa",
            TabularField::Cgpa => "cgpa",
            TabularField::TotalCredits => "total_credits",
            TabularField::EarnedCredits => "earned_credits",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubjectRow {
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    pub grade: Option<String>,
    pub credits: Option<String>,
}

/// AI-extracted structured fields. `None` means the extractor produced nothing usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularData {
    pub student_name: Option<String>,
    pub enrollment_number: Option<String>,
    pub degree: Option<String>,
    pub branch: Option<String>,
    pub university_name: Option<String>,
    pub graduation_date: Option<String>,
    pub date_of_birth: Option<String>,
    pub grade: Option<String>,
    pub certificate_type: Option<String>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub sgpa: Option<String>,
    pub cgpa: Option<String>,
    pub total_credits: Option<String>,
    pub earned_credits: Option<String>,
    pub subjects: Vec<SubjectRow>,
}

impl TabularData {
    pub fn get(&self, field: TabularField) -> Option<&str> {
        let value = match field {
            TabularField::StudentName => &self.student_name,
            TabularField::EnrollmentNumber => &self.enrollment_number,
            TabularField::Degree => &self.degree,
            TabularField::Branch => &self.branch,
            TabularField::UniversityName => &self.university_name,
            TabularField::GraduationDate => &self.graduation_date,
            TabularField::DateOfBirth => &self.date_of_birth,
            TabularField::Grade => &self.grade,
            TabularField::CertificateType => &self.certificate_type,
            TabularField::Semester => &self.semester,
            TabularField::AcademicYear => &self.academic_year,
            TabularField::Sgpa => &self.sgpa,
            TabularField::Cgpa => &self.cgpa,
            TabularField::TotalCredits => &self.total_credits,
            TabularField::EarnedCredits => &self.earned_credits,
        };
        value.as_deref()
    }

    fn slot(&mut self, field: TabularField) -> &mut Option<String> {
        match field {
            TabularField::StudentName => &mut self.student_name,
            TabularField::EnrollmentNumber => &mut self.enrollment_number,
            TabularField::Degree => &mut self.degree,
            TabularField::Branch => &mut self.branch,
            TabularField::UniversityName => &mut self.university_name,
            TabularField::GraduationDate => &mut self.graduation_date,
            TabularField::DateOfBirth => &mut self.date_of_birth,
            TabularField::Grade => &mut self.grade,
            TabularField::CertificateType => &mut self.certificate_type,
            TabularField::Semester => &mut self.semester,
            TabularField::AcademicYear => &mut self.academic_year,
            TabularField::Sgpa => &mut self.sgpa,
            TabularField::Cgpa => &mut self.cgpa,
            TabularField::TotalCredits => &mut self.total_credits,
            TabularField::EarnedCredits => &mut self.earned_credits,
        }
    }

    pub fn set(&mut self, field: TabularField, value: impl Into<String>) {
        *self.slot(field) = Some(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && TabularField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// University record matched during verification, in its canonical shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchedStudent {
    pub name: Option<String>,
    pub enrollment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub student_verified: bool,
    /// Always within [0, 1].
    pub confidence_score: f64,
    pub matched_student: Option<MatchedStudent>,
    pub message: Option<String>,
    pub verification_attempted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateRecord {
    pub id: i64,
    pub original_filename: Option<String>,
    pub status: RecordStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub tabular_data: Option<TabularData>,
    pub verification: Option<VerificationResult>,
    pub simple_status: Option<String>,
    pub file_type: Option<String>,
}

impl CertificateRecord {
    /// Filename shown for the record when the backend did not report one.
    pub fn display_filename(&self) -> String {
        self.original_filename
            .clone()
            .unwrap_or_else(|| format!("certificate_{}.png", self.id))
    }

    /// Applies the outcome of a re-verification: only the verification panel
    /// inputs change, extracted fields and status are kept as they were.
    pub fn with_refreshed_verification(&self, fresh: &CertificateRecord) -> CertificateRecord {
        if fresh.id != self.id {
            warn!(
                "Ignoring verification for record {} while refreshing record {}",
                fresh.id, self.id
            );
            return self.clone();
        }
        if !self.status.can_advance_to(fresh.status) {
            warn!(
                "Record {} status regressed from {} to {} on refresh",
                self.id,
                self.status.as_str(),
                fresh.status.as_str()
            );
        }
        CertificateRecord {
            verification: fresh.verification.clone(),
            simple_status: fresh.simple_status.clone(),
            ..self.clone()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire shapes. Everything the backend sends is lenient here and is validated
// into the strict types above before it leaves the client boundary.
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct RecordWire {
    pub id: i64,
    pub original_filename: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub summary: Option<String>,
    pub tabular_data: Option<Value>,
    pub verification: Option<Value>,
    pub simple_status: Option<String>,
    pub file_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordListWire {
    #[serde(default)]
    pub certificates: Vec<RecordWire>,
}

const MATCHED_NAME_KEYS: [&str; 3] = ["name", "student_name", "studentName"];
const MATCHED_ENROLLMENT_KEYS: [&str; 4] =
    ["reg_no", "regNo", "enrollment_number", "enrollmentNumber"];

/// Resolves the naming variants of a matched university record. The first key
/// carrying a usable scalar wins.
fn matched_from_value(value: &Value) -> Option<MatchedStudent> {
    let map = value.as_object()?;
    let first = |keys: &[&str]| keys.iter().find_map(|key| field_text(map, key));
    let matched = MatchedStudent {
        name: first(&MATCHED_NAME_KEYS),
        enrollment: first(&MATCHED_ENROLLMENT_KEYS),
    };
    (matched.name.is_some() || matched.enrollment.is_some()).then_some(matched)
}

impl From<RecordWire> for CertificateRecord {
    fn from(wire: RecordWire) -> Self {
        let tabular_data = wire.tabular_data.as_ref().and_then(tabular_from_value);
        let known = wire.status.as_deref().and_then(|raw| {
            let status = RecordStatus::parse(raw);
            if status.is_none() {
                warn!("Record {} has unknown status '{raw}', inferring", wire.id);
            }
            status
        });
        let status = known.unwrap_or(if tabular_data.is_some() {
            RecordStatus::Processed
        } else {
            RecordStatus::Uploaded
        });
        let processed = status == RecordStatus::Processed;

        CertificateRecord {
            id: wire.id,
            original_filename: wire.original_filename.filter(|s| !s.trim().is_empty()),
            status,
            created_at: wire.created_at.as_deref().and_then(parse_timestamp),
            summary: wire
                .summary
                .filter(|s| processed && !s.trim().is_empty()),
            tabular_data: tabular_data.filter(|_| processed),
            verification: wire.verification.as_ref().and_then(verification_from_value),
            simple_status: wire.simple_status,
            file_type: wire.file_type,
        }
    }
}

/// Reads a scalar the way the display layer treats it: null, `false`, zero,
/// empty text and the `-` placeholder all mean "absent".
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => (n.as_f64() != Some(0.0)).then(|| n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty() && trimmed != "-").then(|| s.clone())
        }
        other => Some(other.to_string()),
    }
}

fn field_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_text)
}

pub(crate) fn tabular_from_value(value: &Value) -> Option<TabularData> {
    let map = value.as_object()?;
    let mut data = TabularData::default();
    for field in TabularField::ALL {
        if let Some(text) = field_text(map, field.key()) {
            data.set(field, text);
        }
    }
    // The backend sometimes sends the stored text form of the list; only a real
    // array is usable.
    if let Some(Value::Array(rows)) = map.get("subjects") {
        data.subjects = rows
            .iter()
            .filter_map(Value::as_object)
            .map(|row| SubjectRow {
                subject_code: field_text(row, "subject_code"),
                subject_name: field_text(row, "subject_name"),
                grade: field_text(row, "grade"),
                credits: field_text(row, "credits"),
            })
            .collect();
    }
    Some(data)
}

pub(crate) fn verification_from_value(value: &Value) -> Option<VerificationResult> {
    let map = value.as_object()?;
    // `{}` is what the backend sends for a record that was never verified.
    if !map.contains_key("student_verified") && !map.contains_key("confidence_score") {
        return None;
    }

    let confidence_score = match map.get("confidence_score") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    let confidence_score = if confidence_score.is_nan() {
        0.0
    } else {
        confidence_score.clamp(0.0, 1.0)
    };

    let matched_student = map.get("matched_student").and_then(matched_from_value);

    Some(VerificationResult {
        student_verified: map
            .get("student_verified")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        confidence_score,
        matched_student,
        message: map
            .get("message")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
        verification_attempted: map.get("verification_attempted").and_then(Value::as_bool),
    })
}

/// ISO-8601 with an offset, or the backend's offset-less form read as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(Utc.from_utc_datetime(&naive)),
        Err(e) => {
            warn!("Unparseable created_at '{raw}': {e}");
            None
        }
    }
}
