/// Node capability: the minimal interface every tree source implements.
///
/// Filesystem entries and registry keys are both `TreeNode`s, so the
/// traversal engine, rule dispatch and statistics are written once. A node
/// is owned by the traversal frame that discovered it and is dropped once
/// its record has been produced.
use crate::error::NodeError;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Boxed node handed between the source and the traversal engine.
pub type BoxedNode = Box<dyn TreeNode>;

/// Lazy child listing. Individual items may fail without poisoning siblings.
pub type ChildIter = Box<dyn Iterator<Item = Result<BoxedNode, NodeError>> + Send>;

/// Structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Directory,
    Key,
}

impl NodeKind {
    /// `true` for kinds whose children are enumerated.
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Directory | Self::Key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Directory => "Directory",
            Self::Key => "Key",
        }
    }
}

/// A node name as the collaborator delivered it.
///
/// Filesystem parsers hand out raw bytes; decoding is the normalizer's job
/// so a bad sequence never fails the extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawName {
    Text(CompactString),
    Bytes(Vec<u8>),
}

impl RawName {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }

    /// `.` and `..` pseudo-entries, compared by identity rather than trusting
    /// the collaborator to filter them.
    #[inline]
    pub fn is_dot_entry(&self) -> bool {
        matches!(self.as_bytes(), b"." | b"..")
    }
}

impl From<&str> for RawName {
    fn from(s: &str) -> Self {
        Self::Text(CompactString::new(s))
    }
}

/// Raw metadata. Every field is individually optional.
///
/// Timestamps are seconds since the Unix epoch (UTC). `size` is signed
/// because some collaborators report garbage negatives for damaged entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMetadata {
    pub size: Option<i64>,
    pub created: Option<i64>,
    pub modified: Option<i64>,
    pub accessed: Option<i64>,
    /// Registry hive last-write instant.
    pub last_write: Option<i64>,
}

impl RawMetadata {
    /// Convert a `SystemTime` to whole epoch seconds (negative before 1970).
    pub fn epoch_seconds(time: SystemTime) -> i64 {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
            Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
        }
    }
}

/// Data carried by a registry value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ValueData {
    Binary(Vec<u8>),
    Integer(i64),
    MultiString(Vec<String>),
    String(String),
    /// Anything else the hive reader could not map, with its type name.
    Other { type_name: String, rendered: String },
}

impl ValueData {
    /// Type label used in value records and the value-type histogram.
    pub fn type_label(&self) -> String {
        match self {
            Self::Binary(_) => "BINARY".to_string(),
            Self::Integer(_) => "INTEGER".to_string(),
            Self::MultiString(_) => "MULTI_STRING".to_string(),
            Self::String(_) => "STRING".to_string(),
            Self::Other { type_name, .. } => format!("OTHER_{type_name}"),
        }
    }

    #[inline]
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Render the data as text for reports. Binary data is lowercase hex.
    pub fn render(&self) -> String {
        match self {
            Self::Binary(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
            Self::Integer(n) => n.to_string(),
            Self::MultiString(items) => format!("{items:?}"),
            Self::String(s) => s.clone(),
            Self::Other { rendered, .. } => rendered.clone(),
        }
    }
}

/// A named registry value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryValue {
    pub name: String,
    pub data: ValueData,
}

/// One value as listed under a key. Its data read can fail on its own.
#[derive(Debug)]
pub struct ValueSlot {
    pub name: String,
    pub data: Result<ValueData, NodeError>,
}

impl From<RegistryValue> for ValueSlot {
    fn from(value: RegistryValue) -> Self {
        Self {
            name: value.name,
            data: Ok(value.data),
        }
    }
}

/// The capability contract over heterogeneous tree sources.
///
/// Implementations perform blocking I/O; the traversal imposes no timeout
/// of its own.
pub trait TreeNode: Send {
    /// Raw name, or `None` when the collaborator has no name record.
    fn name(&self) -> Option<RawName>;

    fn kind(&self) -> NodeKind;

    /// Raw metadata, or `None` when the entry has no metadata record.
    fn metadata(&self) -> Option<RawMetadata>;

    /// Stable identity (inode, cell offset) used for cycle defence.
    fn node_id(&self) -> Option<u64> {
        None
    }

    /// Lazy child listing. Leaves return an empty iterator.
    fn children(&self) -> Result<ChildIter, NodeError>;

    /// Read up to `length` bytes of leaf content starting at `offset`.
    /// Fails with `ContentUnavailable` for containers or on read faults.
    fn content(&self, offset: u64, length: usize) -> Result<Vec<u8>, NodeError>;

    /// Registry values of a key. Each value may fail on its own.
    fn values(&self) -> Result<Vec<ValueSlot>, NodeError> {
        Ok(Vec::new())
    }
}

/// An empty child listing for leaves.
pub fn no_children() -> ChildIter {
    Box::new(std::iter::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_entries_are_recognised_by_bytes() {
        assert!(RawName::from(".").is_dot_entry());
        assert!(RawName::Bytes(b"..".to_vec()).is_dot_entry());
        assert!(!RawName::from(".hidden").is_dot_entry());
        assert!(!RawName::from("...").is_dot_entry());
    }

    #[test]
    fn value_type_labels() {
        assert_eq!(ValueData::Binary(vec![1]).type_label(), "BINARY");
        assert_eq!(ValueData::Integer(4).type_label(), "INTEGER");
        assert_eq!(
            ValueData::MultiString(vec!["a".into()]).type_label(),
            "MULTI_STRING"
        );
        assert_eq!(ValueData::String("x".into()).type_label(), "STRING");
        let other = ValueData::Other {
            type_name: "QWORD_BE".into(),
            rendered: "7".into(),
        };
        assert_eq!(other.type_label(), "OTHER_QWORD_BE");
    }

    #[test]
    fn binary_values_render_as_hex() {
        assert_eq!(ValueData::Binary(vec![0x00, 0xab, 0x10]).render(), "00ab10");
    }

    #[test]
    fn only_directories_and_keys_are_containers() {
        assert!(NodeKind::Directory.is_container());
        assert!(NodeKind::Key.is_container());
        assert!(!NodeKind::File.is_container());
    }
}
