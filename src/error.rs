// ⚠️ Error types for the reconciliation core
//
// The engine itself never fails: a name that matches nothing is "absence of
// evidence", not an error. The only fallible steps are building the source
// indices under the strict duplicate policy and validating configuration.

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// Two raw entries normalized to the same key while the strict policy is active
    #[error("duplicate {source_name} entry for '{key}': '{previous}' would be overwritten by '{incoming}'")]
    DuplicateKey {
        source_name: String,
        key: String,
        previous: String,
        incoming: String,
    },

    /// Configuration value outside its valid range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
