//! Field Normalizer: pure string transforms from raw extracted values to
//! display text, and from wire keys to display labels.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder rendered for an absent field value.
pub const SENTINEL: &str = "-";

/// Whole-token label rewrites applied after title-casing.
const IRREGULAR_LABELS: &[(&str, &str)] = &[("Dob", "Date of Birth")];

static ENROLLMENT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(.*?)(enrollment\s*no\s*:\s*.+)$").expect("enrollment pattern is valid")
});

/// Renders a raw value for display. Absent or blank values become [`SENTINEL`].
///
/// The student-name field additionally repairs extraction noise where the
/// enrollment text was glued onto the name:
/// `"Jane Doe Enrollment No: 12AB34"` → `"Jane Doe (Enrollment No: 12AB34)"`.
pub fn normalize_field(label: &str, raw: Option<&str>) -> String {
    let value = match raw {
        Some(v) if !v.trim().is_empty() => v,
        _ => return SENTINEL.to_string(),
    };

    if is_student_name(label) {
        if let Some(split) = split_enrollment(value) {
            return split;
        }
    }
    value.to_string()
}

/// `student_name`, `Student Name`, `STUDENT-NAME` all name the same field.
fn is_student_name(label: &str) -> bool {
    let canonical: String = label
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
        .collect();
    canonical == "student_name"
}

fn split_enrollment(value: &str) -> Option<String> {
    let caps = ENROLLMENT_SUFFIX.captures(value)?;
    let name = caps[1].trim().trim_end_matches('(').trim_end();
    let enrollment = caps[2]
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();

    if name.is_empty() {
        Some(format!("({enrollment})"))
    } else {
        Some(format!("{name} ({enrollment})"))
    }
}

/// Turns a wire key into a display label: separators become spaces, each word
/// is title-cased, and irregular tokens are rewritten.
pub fn prettify_label(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let titled = title_case(word);
            IRREGULAR_LABELS
                .iter()
                .find(|(from, _)| *from == titled)
                .map(|(_, to)| to.to_string())
                .unwrap_or(titled)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
