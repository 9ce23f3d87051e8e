use crate::models::{TabularData, TabularField};
use crate::normalize::SENTINEL;

pub const MAX_KEYWORDS: usize = 12;

/// Candidate fields for keyword chips, highest priority first.
const KEYWORD_FIELDS: [TabularField; 13] = [
    TabularField::StudentName,
    TabularField::Degree,
    TabularField::Branch,
    TabularField::CertificateType,
    TabularField::UniversityName,
    TabularField::EnrollmentNumber,
    TabularField::GraduationDate,
    TabularField::DateOfBirth,
    TabularField::Grade,
    TabularField::Sgpa,
    TabularField::Cgpa,
    TabularField::Semester,
    TabularField::AcademicYear,
];

/// Highlight tokens for a record: trimmed, sentinel-free, deduplicated by
/// exact match (first occurrence wins), in field-priority order, at most
/// [`MAX_KEYWORDS`] long.
pub fn derive_keywords(data: &TabularData) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::with_capacity(MAX_KEYWORDS);

    for field in KEYWORD_FIELDS {
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
        let Some(value) = data.get(field).map(str::trim) else {
            continue;
        };
        if value.is_empty() || value == SENTINEL {
            continue;
        }
        if !keywords.iter().any(|k| k == value) {
            keywords.push(value.to_string());
        }
    }

    keywords
}
