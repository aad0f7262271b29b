// Attendance Reconciliation - Core Library
// Roster vs form responses vs meeting log → one attendance verdict per student

pub mod normalizer;
pub mod matcher;
pub mod sources;
pub mod entities;
pub mod reconciliation;
pub mod config;
pub mod error;
pub mod parser;     // CSV exports → rows
pub mod report;     // CSV / JSON outputs + console summary
pub mod pipeline;   // files in, reconciled roster out

// Re-export commonly used types
pub use normalizer::normalize_name;
pub use matcher::{
    find_best_match, NameMatch, NameMatcher, SimilarityScorer, WordOverlapScorer,
    DEFAULT_MATCH_THRESHOLD,
};
pub use sources::{
    build_form_record, build_meeting_record, DuplicatePolicy, FormRecord, MeetingRecord,
    SourceIndex,
};
pub use entities::{roster_from_pairs, AttendanceEvidence, AttendanceFlag, SourceEvidence, Student};
pub use reconciliation::{
    absence_reasons, reconcile, AbsenceReason, AbsentStudent, AttendanceReconciler,
    ReconciliationReport,
};
pub use config::{ColumnHints, ReconcileConfig, DEFAULT_MIN_HOURS};
pub use error::ReconcileError;
pub use parser::{
    parse_duration_hours, FormParser, FormRow, MeetingParser, MeetingRow, RosterParser,
    RosterRow, SourceKind, SourceParser,
};
pub use report::{
    render_summary, write_attendance_csv, write_detail_csv, write_outputs, InputDigest,
    OutputFiles, RunManifest,
};
pub use pipeline::{load_sources, run, InputPaths, LoadedSources, RunOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
