// 🎓 Student Entity - One official roster row plus its reconciliation outcome
//
// Identity: normalized_name, computed once in Student::new and never touched again.
// Values:   attendance / registered_in_form / meeting_hours / evidence,
//           written once by the reconciler.

use crate::matcher::NameMatch;
use crate::normalizer::normalize_name;
use serde::{Deserialize, Serialize};

// ============================================================================
// ATTENDANCE FLAG
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceFlag {
    Present,

    #[default]
    Absent,
}

impl AttendanceFlag {
    /// Code written to the attendance sheet ("A" = asistió, "F" = falta)
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceFlag::Present => "A",
            AttendanceFlag::Absent => "F",
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceFlag::Present)
    }
}

// ============================================================================
// EVIDENCE
// ============================================================================

/// Which entry in each source was taken as this student
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvidence {
    /// Matched form entry (key + name as typed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_match: Option<SourceEvidence>,

    /// Matched meeting participant key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_match: Option<SourceEvidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvidence {
    #[serde(flatten)]
    pub matched: NameMatch,

    /// Original text in the source, when the source keeps it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

// ============================================================================
// STUDENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub last_name: String,
    pub first_name: String,
    pub full_name: String,
    pub normalized_name: String,

    pub attendance: AttendanceFlag,
    pub registered_in_form: bool,
    pub meeting_hours: f64,

    #[serde(default)]
    pub evidence: AttendanceEvidence,
}

impl Student {
    /// Create a roster entry in its initial (absent, no evidence) state
    pub fn new(last_name: impl Into<String>, first_name: impl Into<String>) -> Self {
        let last_name = last_name.into();
        let first_name = first_name.into();
        let full_name = format!("{} {}", last_name, first_name);
        let normalized_name = normalize_name(&full_name);

        Student {
            last_name,
            first_name,
            full_name,
            normalized_name,
            attendance: AttendanceFlag::Absent,
            registered_in_form: false,
            meeting_hours: 0.0,
            evidence: AttendanceEvidence::default(),
        }
    }

    pub fn is_present(&self) -> bool {
        self.attendance.is_present()
    }
}

/// Build the roster from (last name, first name) pairs
///
/// Pairs where both fields are blank are dropped; the rest are trimmed.
pub fn roster_from_pairs<I, L, F>(pairs: I) -> Vec<Student>
where
    I: IntoIterator<Item = (L, F)>,
    L: AsRef<str>,
    F: AsRef<str>,
{
    pairs
        .into_iter()
        .filter_map(|(last, first)| {
            let last = last.as_ref().trim();
            let first = first.as_ref().trim();
            if last.is_empty() && first.is_empty() {
                None
            } else {
                Some(Student::new(last, first))
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_student_defaults() {
        let student = Student::new("García López", "Ana María");

        assert_eq!(student.full_name, "García López Ana María");
        assert_eq!(student.normalized_name, "GARCÍA LÓPEZ ANA MARÍA");
        assert_eq!(student.attendance, AttendanceFlag::Absent);
        assert!(!student.registered_in_form);
        assert_eq!(student.meeting_hours, 0.0);
        assert_eq!(student.evidence, AttendanceEvidence::default());
    }

    #[test]
    fn test_flag_codes() {
        assert_eq!(AttendanceFlag::Present.code(), "A");
        assert_eq!(AttendanceFlag::Absent.code(), "F");
        assert!(AttendanceFlag::Present.is_present());
        assert!(!AttendanceFlag::default().is_present());
    }

    #[test]
    fn test_roster_from_pairs_drops_blank_rows() {
        let roster = roster_from_pairs(vec![
            ("GARCIA", "ANA"),
            ("  ", ""),
            ("", "LUIS"),
            (" PEREZ ", " "),
        ]);

        assert_eq!(roster.len(), 3);
        assert_eq!(roster[1].normalized_name, "LUIS");
        assert_eq!(roster[2].last_name, "PEREZ");
        assert_eq!(roster[2].normalized_name, "PEREZ");
    }

    #[test]
    fn test_student_serializes_without_empty_evidence() {
        let student = Student::new("GARCIA", "ANA");
        let json = serde_json::to_value(&student).unwrap();

        assert_eq!(json["attendance"], "Absent");
        assert_eq!(json["evidence"], serde_json::json!({}));
    }
}
