//! Verification Status Resolver.
//!
//! Two classifiers live here and stay separate: [`resolve_status`] buckets the
//! backend's tri-state tag, [`confidence_tier`] buckets a raw confidence score.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub background: &'static str,
    pub border: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Positive,
    Cautionary,
    Negative,
}

impl StatusTone {
    pub fn palette(self) -> Palette {
        match self {
            StatusTone::Positive => Palette {
                background: "#d4edda",
                border: "#c3e6cb",
                text: "#155724",
            },
            StatusTone::Cautionary => Palette {
                background: "#fff3cd",
                border: "#ffeeba",
                text: "#856404",
            },
            StatusTone::Negative => Palette {
                background: "#f8d7da",
                border: "#f5c6cb",
                text: "#721c24",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedStatus {
    pub label: &'static str,
    pub tone: StatusTone,
    pub colors: Palette,
}

/// Maps the backend's `simple_status` tag to a user-facing status.
/// Unknown, garbled or missing tags fall into "NOT VERIFIED".
pub fn resolve_status(simple_status: Option<&str>) -> ResolvedStatus {
    let tag = simple_status.map(str::trim).unwrap_or_default();
    let (label, tone) = if tag.eq_ignore_ascii_case("verified") {
        ("VERIFIED", StatusTone::Positive)
    } else if tag.eq_ignore_ascii_case("mismatch") {
        ("MISMATCH", StatusTone::Cautionary)
    } else {
        ("NOT VERIFIED", StatusTone::Negative)
    };
    ResolvedStatus {
        label,
        tone,
        colors: tone.palette(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn color(self) -> &'static str {
        match self {
            ConfidenceTier::High => "#4CAF50",
            ConfidenceTier::Medium => "#FF9800",
            ConfidenceTier::Low => "#F44336",
        }
    }
}

/// ≥ 0.8 high, ≥ 0.6 medium, anything else (NaN included) low.
pub fn confidence_tier(confidence: f64) -> ConfidenceTier {
    match confidence {
        c if c >= 0.8 => ConfidenceTier::High,
        c if c >= 0.6 => ConfidenceTier::Medium,
        _ => ConfidenceTier::Low,
    }
}
