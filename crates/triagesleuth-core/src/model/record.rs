/// Records produced by a triage run.
///
/// Field names are the stable serialized shape consumed by report writers
/// and chart builders, so renames here are breaking changes.
use super::timestamp::CanonicalTime;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A single heuristic suspicion raised by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyFinding {
    pub rule_id: CompactString,
    pub reason: String,
}

impl AnomalyFinding {
    pub fn new(rule_id: &str, reason: impl Into<String>) -> Self {
        Self {
            rule_id: CompactString::new(rule_id),
            reason: reason.into(),
        }
    }
}

/// Filesystem-domain record (generic, log and network domains).
///
/// Depth is not stored: it is the number of `/` separators in `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub path: String,
    pub size: u64,
    pub created_time: CanonicalTime,
    pub modified_time: CanonicalTime,
    pub accessed_time: CanonicalTime,
    #[serde(rename = "type")]
    pub kind: CompactString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_reason: Option<String>,
    /// Itemized findings; in-memory only, the stable shape carries the
    /// single `anomaly_reason`.
    #[serde(skip)]
    pub findings: Vec<AnomalyFinding>,
}

impl ArtifactRecord {
    pub const SEPARATOR: char = '/';

    #[inline]
    pub fn depth(&self) -> usize {
        self.path.matches(Self::SEPARATOR).count()
    }

    #[inline]
    pub fn is_directory(&self) -> bool {
        self.kind == "Directory"
    }

    #[inline]
    pub fn is_anomalous(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// Operation class inferred for a registry value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationLabel {
    Modify,
    BinaryUpdate,
    Access,
    Unknown,
    /// The value could not be read. Never counted in histograms.
    Error,
}

impl OperationLabel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Modify => "MODIFY",
            Self::BinaryUpdate => "BINARY_UPDATE",
            Self::Access => "ACCESS",
            Self::Unknown => "UNKNOWN",
            Self::Error => "ERROR",
        }
    }

    #[inline]
    pub fn is_countable(self) -> bool {
        self != Self::Error
    }
}

/// Per-key operation counts, in the fixed order reporting expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSummary {
    #[serde(rename = "MODIFY")]
    pub modify: u64,
    #[serde(rename = "BINARY_UPDATE")]
    pub binary_update: u64,
    #[serde(rename = "ACCESS")]
    pub access: u64,
    #[serde(rename = "UNKNOWN")]
    pub unknown: u64,
}

impl OperationSummary {
    pub fn add(&mut self, label: OperationLabel, count: u64) {
        match label {
            OperationLabel::Modify => self.modify += count,
            OperationLabel::BinaryUpdate => self.binary_update += count,
            OperationLabel::Access => self.access += count,
            OperationLabel::Unknown => self.unknown += count,
            OperationLabel::Error => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.modify + self.binary_update + self.access + self.unknown
    }
}

/// One value under a registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub operation: OperationLabel,
}

/// Registry-domain record, one per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub registry_file: String,
    pub key_path: String,
    pub key_depth: usize,
    pub last_write_time: CanonicalTime,
    pub values: Vec<ValueRecord>,
    pub number_of_values: usize,
    pub number_of_subkeys: usize,
    pub operation_summary: OperationSummary,
}

impl KeyRecord {
    pub const SEPARATOR: char = '\\';
}

/// Either record shape, as emitted by the traversal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriageRecord {
    Key(KeyRecord),
    Artifact(ArtifactRecord),
}

impl TriageRecord {
    pub fn path(&self) -> &str {
        match self {
            Self::Artifact(r) => &r.path,
            Self::Key(r) => &r.key_path,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Self::Artifact(r) => r.depth(),
            Self::Key(r) => r.key_depth,
        }
    }

    /// Kind label fed to the kind histogram.
    pub fn kind(&self) -> &str {
        match self {
            Self::Artifact(r) => &r.kind,
            Self::Key(_) => "Key",
        }
    }

    pub fn findings(&self) -> &[AnomalyFinding] {
        match self {
            Self::Artifact(r) => &r.findings,
            Self::Key(_) => &[],
        }
    }

    pub fn as_artifact(&self) -> Option<&ArtifactRecord> {
        match self {
            Self::Artifact(r) => Some(r),
            Self::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&KeyRecord> {
        match self {
            Self::Key(r) => Some(r),
            Self::Artifact(_) => None,
        }
    }
}

impl From<ArtifactRecord> for TriageRecord {
    fn from(r: ArtifactRecord) -> Self {
        Self::Artifact(r)
    }
}

impl From<KeyRecord> for TriageRecord {
    fn from(r: KeyRecord) -> Self {
        Self::Key(r)
    }
}
