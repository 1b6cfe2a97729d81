/// Error taxonomy for a triage run.
///
/// Three layers, matching where each fault is recovered:
///
/// - [`NodeError`] is raised by tree collaborators while a single node or
///   subtree is read. The traversal recovers it at the node boundary and
///   logs a [`crate::report::SkippedSubtree`].
/// - [`crate::rules::RuleError`] lives next to the rule engine and is always
///   recovered as "no match".
/// - [`TriageError`] is run-level: configuration, opening the tree, writing
///   reports. `TreeUnavailable` aborts the run.
use std::path::PathBuf;
use thiserror::Error;

/// Shared `Result` alias for run-level operations.
pub type Result<T> = std::result::Result<T, TriageError>;

/// Faults reported by a [`crate::model::TreeNode`] implementation.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Leaf content could not be read (directory/key, or a read fault).
    #[error("content unavailable: {reason}")]
    ContentUnavailable { reason: String },

    /// Child listing failed (access denied, corrupt index, ...).
    #[error("subtree inaccessible: {reason}")]
    SubtreeAccess { reason: String },

    /// One child entry could not be decoded; its siblings are still usable.
    #[error("corrupt entry: {reason}")]
    CorruptEntry { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NodeError {
    pub fn content(reason: impl Into<String>) -> Self {
        Self::ContentUnavailable {
            reason: reason.into(),
        }
    }

    pub fn subtree(reason: impl Into<String>) -> Self {
        Self::SubtreeAccess {
            reason: reason.into(),
        }
    }

    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptEntry {
            reason: reason.into(),
        }
    }
}

/// Run-level failures.
#[derive(Debug, Error)]
pub enum TriageError {
    /// The root could not be opened. No partial traversal is possible.
    #[error("tree unavailable at {root}: {reason}")]
    TreeUnavailable { root: String, reason: String },

    #[error("invalid configuration: {details}")]
    Config { details: String },

    #[error("configuration parse failure: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV failure: {0}")]
    Csv(#[from] csv::Error),

    /// The run thread or worker pool could not be started, or panicked.
    #[error("triage worker failure: {details}")]
    Worker { details: String },
}

impl TriageError {
    pub fn tree_unavailable(root: impl Into<String>, reason: impl ToString) -> Self {
        Self::TreeUnavailable {
            root: root.into(),
            reason: reason.to_string(),
        }
    }

    pub fn config(details: impl Into<String>) -> Self {
        Self::Config {
            details: details.into(),
        }
    }
}
