// ⚙️ Reconciliation Config - Every knob in one explicit struct
//
// Nothing here points at the filesystem: input and output paths belong to the
// caller (see main.rs). The struct is passed into the engine, the parsers and
// the report writer instead of living in globals.

use crate::error::{ReconcileError, Result as CoreResult};
use crate::matcher::DEFAULT_MATCH_THRESHOLD;
use crate::sources::DuplicatePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default minimum meeting time for a PRESENT verdict
pub const DEFAULT_MIN_HOURS: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum meeting hours required (inclusive)
    pub min_hours: f64,

    /// Similarity must be strictly above this to accept a fuzzy match
    pub match_threshold: f64,

    /// What to do when two rows normalize to the same name
    pub duplicate_policy: DuplicatePolicy,

    /// Column layout hints for the CSV parsers
    pub columns: ColumnHints,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            min_hours: DEFAULT_MIN_HOURS,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            duplicate_policy: DuplicatePolicy::LastWriteWins,
            columns: ColumnHints::default(),
        }
    }
}

impl ReconcileConfig {
    /// Load config from JSON file (missing fields take defaults)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ReconcileConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    pub fn with_min_hours(mut self, min_hours: f64) -> Self {
        self.min_hours = min_hours;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.min_hours.is_finite() || self.min_hours < 0.0 {
            return Err(ReconcileError::InvalidConfig(format!(
                "min_hours must be a non-negative number, got {}",
                self.min_hours
            )));
        }

        if !(0.0..1.0).contains(&self.match_threshold) {
            return Err(ReconcileError::InvalidConfig(format!(
                "match_threshold must be in [0, 1), got {}",
                self.match_threshold
            )));
        }

        Ok(())
    }
}

// ============================================================================
// COLUMN HINTS
// ============================================================================

/// Header tokens used to locate columns in the source CSVs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnHints {
    /// Form: first header containing one of these (case-insensitive) is the name
    pub form_name_tokens: Vec<String>,

    /// Form: column used when no header matches
    pub form_name_fallback: usize,

    /// Meeting: every header containing one of these is part of the name
    pub meeting_name_tokens: Vec<String>,

    /// Meeting: last header containing one of these is the duration
    pub meeting_duration_tokens: Vec<String>,

    pub meeting_name_fallback: Vec<usize>,
    pub meeting_duration_fallback: usize,

    /// Participants whose name starts with one of these are not students
    pub supervisor_markers: Vec<String>,
}

impl Default for ColumnHints {
    fn default() -> Self {
        fn owned(tokens: &[&str]) -> Vec<String> {
            tokens.iter().map(|t| t.to_string()).collect()
        }

        ColumnHints {
            form_name_tokens: owned(&["APELLIDO", "NOMBRE", "POSTULANTE", "SURNAME", "NAME", "APPLICANT"]),
            form_name_fallback: 2,
            meeting_name_tokens: owned(&["apellido", "nombre", "surname", "name"]),
            meeting_duration_tokens: owned(&["duraci", "duration"]),
            meeting_name_fallback: vec![0, 1],
            meeting_duration_fallback: 3,
            supervisor_markers: owned(&["MONITOR", "SUPERVISOR"]),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ReconcileConfig::default();

        assert_eq!(config.min_hours, 4.0);
        assert_eq!(config.match_threshold, 0.5);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::LastWriteWins);
        assert_eq!(config.columns.form_name_fallback, 2);
        assert_eq!(config.columns.meeting_name_fallback, vec![0, 1]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ReconcileConfig::default().with_min_hours(-1.0).validate().is_err());
        assert!(ReconcileConfig::default().with_min_hours(f64::NAN).validate().is_err());

        let mut config = ReconcileConfig::default();
        config.match_threshold = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ReconcileError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_file_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"min_hours": 3.5, "duplicate_policy": "strict", "columns": {{"supervisor_markers": ["DOCENTE"]}}}}"#
        )
        .unwrap();

        let config = ReconcileConfig::from_file(file.path()).unwrap();

        assert_eq!(config.min_hours, 3.5);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Strict);
        assert_eq!(config.columns.supervisor_markers, vec!["DOCENTE".to_string()]);
        // Untouched fields keep defaults
        assert_eq!(config.match_threshold, 0.5);
        assert_eq!(config.columns.meeting_duration_fallback, 3);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"min_hours": -2}}"#).unwrap();

        assert!(ReconcileConfig::from_file(file.path()).is_err());
    }
}
