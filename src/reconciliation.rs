// ⚖️ Attendance Reconciler - Roster vs form vs meeting
//
// Decision rule (both signals required):
//   PRESENT  ⇔  registered_in_form  AND  meeting_hours >= min_hours
//
// The roster is the ground truth. A roster name that matches nothing in a
// source is absence of evidence, never an error, so the pass is infallible.

use crate::config::ReconcileConfig;
use crate::entities::{AttendanceFlag, SourceEvidence, Student};
use crate::matcher::{NameMatcher, SimilarityScorer, WordOverlapScorer};
use crate::sources::{FormRecord, MeetingRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ============================================================================
// ABSENCE REASONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AbsenceReason {
    /// No form entry matched the student
    NotInForm,

    /// Meeting time below the required minimum (0.0 when not found at all)
    InsufficientMeetingTime { hours: f64, required: f64 },
}

impl AbsenceReason {
    pub fn describe(&self) -> String {
        match self {
            AbsenceReason::NotInForm => "No registró asistencia en el formulario".to_string(),
            AbsenceReason::InsufficientMeetingTime { hours, required } => format!(
                "Duración en Meet: {:.2} horas (mínimo requerido: {})",
                hours, required
            ),
        }
    }
}

/// Why a student ended up ABSENT (empty for present students)
pub fn absence_reasons(student: &Student, min_hours: f64) -> Vec<AbsenceReason> {
    let mut reasons = Vec::new();

    if student.is_present() {
        return reasons;
    }

    if !student.registered_in_form {
        reasons.push(AbsenceReason::NotInForm);
    }

    if student.meeting_hours < min_hours {
        reasons.push(AbsenceReason::InsufficientMeetingTime {
            hours: student.meeting_hours,
            required: min_hours,
        });
    }

    reasons
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsentStudent {
    pub full_name: String,
    pub reasons: Vec<AbsenceReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub min_hours: f64,
    pub absentees: Vec<AbsentStudent>,
    pub reconciled_at: chrono::DateTime<chrono::Utc>,
}

impl ReconciliationReport {
    pub fn from_students(students: &[Student], min_hours: f64) -> Self {
        let present_count = students.iter().filter(|s| s.is_present()).count();

        let absentees = students
            .iter()
            .filter(|s| !s.is_present())
            .map(|s| AbsentStudent {
                full_name: s.full_name.clone(),
                reasons: absence_reasons(s, min_hours),
            })
            .collect();

        ReconciliationReport {
            total_students: students.len(),
            present_count,
            absent_count: students.len() - present_count,
            min_hours,
            absentees,
            reconciled_at: chrono::Utc::now(),
        }
    }

    /// Present share in percent (0.0 for an empty roster)
    pub fn present_pct(&self) -> f64 {
        percentage(self.present_count, self.total_students)
    }

    /// Absent share in percent (0.0 for an empty roster)
    pub fn absent_pct(&self) -> f64 {
        percentage(self.absent_count, self.total_students)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} students: {} present ({:.1}%), {} absent ({:.1}%), threshold {}h",
            self.total_students,
            self.present_count,
            self.present_pct(),
            self.absent_count,
            self.absent_pct(),
            self.min_hours
        )
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

// ============================================================================
// RECONCILER
// ============================================================================

pub struct AttendanceReconciler<S: SimilarityScorer = WordOverlapScorer> {
    matcher: NameMatcher<S>,

    /// Minimum meeting hours for PRESENT (inclusive)
    pub min_hours: f64,
}

impl AttendanceReconciler<WordOverlapScorer> {
    pub fn new(min_hours: f64) -> Self {
        AttendanceReconciler {
            matcher: NameMatcher::new(),
            min_hours,
        }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        AttendanceReconciler {
            matcher: NameMatcher::with_scorer(WordOverlapScorer, config.match_threshold),
            min_hours: config.min_hours,
        }
    }
}

impl<S: SimilarityScorer> AttendanceReconciler<S> {
    pub fn with_matcher(matcher: NameMatcher<S>, min_hours: f64) -> Self {
        AttendanceReconciler { matcher, min_hours }
    }

    /// Reconcile every roster entry against both sources
    ///
    /// Students are processed in roster order and independently of each other;
    /// the returned vector has exactly the roster's length and order.
    pub fn reconcile(
        &self,
        mut roster: Vec<Student>,
        form: &FormRecord,
        meeting: &MeetingRecord,
    ) -> Vec<Student> {
        info!(
            students = roster.len(),
            form_entries = form.len(),
            meeting_entries = meeting.len(),
            min_hours = self.min_hours,
            "reconciling attendance"
        );

        for student in roster.iter_mut() {
            self.reconcile_student(student, form, meeting);
        }

        let present = roster.iter().filter(|s| s.is_present()).count();
        info!(present, absent = roster.len() - present, "reconciliation complete");

        roster
    }

    /// Apply both lookups and the decision rule to a single student
    pub fn reconcile_student(&self, student: &mut Student, form: &FormRecord, meeting: &MeetingRecord) {
        // 1. Form signal
        if let Some(m) = self
            .matcher
            .find_in_index(&student.normalized_name, form)
        {
            student.registered_in_form = true;
            student.evidence.form_match = Some(SourceEvidence {
                original: form.get(&m.candidate).cloned(),
                matched: m,
            });
        }

        // 2. Meeting signal
        if let Some(m) = self
            .matcher
            .find_in_index(&student.normalized_name, meeting)
        {
            student.meeting_hours = meeting.get(&m.candidate).copied().unwrap_or(0.0);
            student.evidence.meeting_match = Some(SourceEvidence {
                original: None,
                matched: m,
            });
        }

        // 3. Decision rule
        student.attendance = if student.registered_in_form && student.meeting_hours >= self.min_hours {
            AttendanceFlag::Present
        } else {
            AttendanceFlag::Absent
        };

        debug!(
            student = %student.normalized_name,
            in_form = student.registered_in_form,
            hours = student.meeting_hours,
            attendance = student.attendance.code(),
            "decision"
        );
    }
}

impl Default for AttendanceReconciler<WordOverlapScorer> {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MIN_HOURS)
    }
}

/// Reconcile with the default matcher
pub fn reconcile(
    roster: Vec<Student>,
    form: &FormRecord,
    meeting: &MeetingRecord,
    min_hours: f64,
) -> Vec<Student> {
    AttendanceReconciler::new(min_hours).reconcile(roster, form, meeting)
}

// ============================================================================
// TESTS
// ============================================================================
