// 📇 Source Indices - Form and meeting records keyed by normalized name
//
// Each index keeps one entry per normalized key in first-seen order. That order
// is what the matcher iterates, so tie-breaking is reproducible across runs.
//
// Duplicate keys:
//   LastWriteWins → value replaced, key keeps its original position (warned)
//   Strict        → ReconcileError::DuplicateKey when the values differ;
//                   an identical resubmission is accepted as is

use crate::error::{ReconcileError, Result};
use crate::normalizer::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later rows silently replace earlier rows under the same key
    #[default]
    LastWriteWins,

    /// A second row under an existing key with a different value is an error
    Strict,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::LastWriteWins => "last_write_wins",
            DuplicatePolicy::Strict => "strict",
        }
    }
}

// ============================================================================
// SOURCE INDEX
// ============================================================================

#[derive(Debug, Clone)]
pub struct SourceIndex<V> {
    source_name: &'static str,
    policy: DuplicatePolicy,
    keys: Vec<String>,
    values: HashMap<String, V>,
    overwrites: usize,
}

impl<V: Debug + PartialEq> SourceIndex<V> {
    pub fn new(source_name: &'static str, policy: DuplicatePolicy) -> Self {
        SourceIndex {
            source_name,
            policy,
            keys: Vec::new(),
            values: HashMap::new(),
            overwrites: 0,
        }
    }

    /// Insert a value under an already-normalized key
    pub fn insert(&mut self, key: String, value: V) -> Result<()> {
        if let Some(previous) = self.values.get(&key) {
            if *previous == value {
                debug!(source = self.source_name, key = %key, "identical duplicate ignored");
                return Ok(());
            }

            if self.policy == DuplicatePolicy::Strict {
                return Err(ReconcileError::DuplicateKey {
                    source_name: self.source_name.to_string(),
                    key,
                    previous: format!("{:?}", previous),
                    incoming: format!("{:?}", value),
                });
            }

            warn!(
                source = self.source_name,
                key = %key,
                previous = ?previous,
                incoming = ?value,
                "duplicate normalized name, keeping the later entry"
            );
            self.overwrites += 1;
            self.values.insert(key, value);
            return Ok(());
        }

        self.keys.push(key.clone());
        self.values.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Normalized keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> + Clone {
        self.keys.iter().map(String::as_str)
    }

    /// (key, value) pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.keys
            .iter()
            .filter_map(move |k| self.values.get(k).map(|v| (k.as_str(), v)))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of rows that replaced an earlier row under the same key
    pub fn overwrites(&self) -> usize {
        self.overwrites
    }

    pub fn source_name(&self) -> &str {
        self.source_name
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }
}

// ============================================================================
// FORM RECORD
// ============================================================================

/// Normalized name → name as typed in the form
pub type FormRecord = SourceIndex<String>;

/// Normalized name → hours spent in the meeting
pub type MeetingRecord = SourceIndex<f64>;

pub const FORM_SOURCE: &str = "form";
pub const MEETING_SOURCE: &str = "meeting";

/// Index raw form names (names that normalize to nothing are skipped)
pub fn build_form_record<I, S>(names: I, policy: DuplicatePolicy) -> Result<FormRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut record = FormRecord::new(FORM_SOURCE, policy);

    for name in names {
        let original = name.as_ref().trim();
        let key = normalize_name(original);
        if key.is_empty() {
            continue;
        }
        record.insert(key, original.to_string())?;
    }

    Ok(record)
}

/// Index (participant name, hours) rows (blank names are skipped)
pub fn build_meeting_record<I, S>(rows: I, policy: DuplicatePolicy) -> Result<MeetingRecord>
where
    I: IntoIterator<Item = (S, f64)>,
    S: AsRef<str>,
{
    let mut record = MeetingRecord::new(MEETING_SOURCE, policy);

    for (name, hours) in rows {
        let key = normalize_name(name.as_ref());
        if key.is_empty() {
            continue;
        }
        record.insert(key, hours)?;
    }

    Ok(record)
}

// ============================================================================
// TESTS
// ============================================================================
