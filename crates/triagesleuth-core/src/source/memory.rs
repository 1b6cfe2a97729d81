/// In-memory tree source.
///
/// Used to feed pre-decoded trees (a registry hive exported as a JSON dump)
/// and to drive the traversal in tests. Faults can be injected per node so
/// every recovery path of the traversal is reachable without a broken disk.
use crate::error::{NodeError, Result, TriageError};
use crate::model::{
    no_children, BoxedNode, ChildIter, NodeKind, RawMetadata, RawName, RegistryValue, TreeNode,
    ValueSlot,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Injected failures. Each one mimics a collaborator fault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Faults {
    /// Child listing fails with this reason.
    pub children: Option<String>,
    /// Extra child entries that fail to decode, appended after the real ones.
    pub corrupt_children: Vec<String>,
    /// Content reads starting at or beyond this offset fail.
    pub content_from: Option<u64>,
    /// The value list as a whole fails with this reason.
    pub values: Option<String>,
    /// Names of values whose data read fails.
    pub failing_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryNode {
    #[serde(default)]
    pub name: Option<String>,
    /// Raw name bytes; wins over `name` when set.
    #[serde(skip)]
    pub raw_name: Option<Vec<u8>>,
    pub kind: NodeKind,
    #[serde(default)]
    pub metadata: Option<RawMetadata>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub content: Vec<u8>,
    #[serde(default)]
    pub values: Vec<RegistryValue>,
    #[serde(default)]
    pub children: Vec<MemoryNode>,
    #[serde(default)]
    pub faults: Faults,
}

impl MemoryNode {
    fn new(name: &str, kind: NodeKind, metadata: RawMetadata) -> Self {
        Self {
            name: Some(name.to_string()),
            raw_name: None,
            kind,
            metadata: Some(metadata),
            id: None,
            content: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
            faults: Faults::default(),
        }
    }

    /// A file whose size is its content length.
    pub fn file(name: &str, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let mut node = Self::new(
            name,
            NodeKind::File,
            RawMetadata {
                size: i64::try_from(content.len()).ok(),
                ..RawMetadata::default()
            },
        );
        node.content = content;
        node
    }

    pub fn directory(name: &str, children: Vec<MemoryNode>) -> Self {
        let mut node = Self::new(name, NodeKind::Directory, RawMetadata::default());
        node.children = children;
        node
    }

    /// A registry key with empty metadata (no last-write time).
    pub fn key(name: &str) -> Self {
        Self::new(name, NodeKind::Key, RawMetadata::default())
    }

    /// Replace the metadata, keeping a file's content-derived size unless
    /// the new metadata carries its own.
    #[must_use]
    pub fn with_metadata(mut self, metadata: RawMetadata) -> Self {
        let size = self.metadata.as_ref().and_then(|m| m.size);
        self.metadata = Some(RawMetadata {
            size: metadata.size.or(size),
            ..metadata
        });
        self
    }

    #[must_use]
    pub fn without_metadata(mut self) -> Self {
        self.metadata = None;
        self
    }

    #[must_use]
    pub fn without_name(mut self) -> Self {
        self.name = None;
        self.raw_name = None;
        self
    }

    #[must_use]
    pub fn with_raw_name(mut self, bytes: &[u8]) -> Self {
        self.raw_name = Some(bytes.to_vec());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: MemoryNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: RegistryValue) -> Self {
        self.values.push(value);
        self
    }

    #[must_use]
    pub fn with_failing_value(mut self, name: &str) -> Self {
        self.faults.failing_values.push(name.to_string());
        self
    }

    #[must_use]
    pub fn failing_children(mut self, reason: &str) -> Self {
        self.faults.children = Some(reason.to_string());
        self
    }

    #[must_use]
    pub fn with_corrupt_child(mut self, reason: &str) -> Self {
        self.faults.corrupt_children.push(reason.to_string());
        self
    }

    #[must_use]
    pub fn failing_content_at(mut self, offset: u64) -> Self {
        self.faults.content_from = Some(offset);
        self
    }

    #[must_use]
    pub fn failing_values(mut self, reason: &str) -> Self {
        self.faults.values = Some(reason.to_string());
        self
    }

    /// Parse a JSON tree dump.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load a JSON tree dump from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| TriageError::tree_unavailable(path.display().to_string(), err))?;
        serde_json::from_str(&raw)
            .map_err(|err| TriageError::tree_unavailable(path.display().to_string(), err))
    }

    /// Nodes in this subtree, the root included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(MemoryNode::count).sum::<usize>()
    }
}

impl TreeNode for MemoryNode {
    fn name(&self) -> Option<RawName> {
        match (&self.raw_name, &self.name) {
            (Some(bytes), _) => Some(RawName::Bytes(bytes.clone())),
            (None, Some(name)) => Some(RawName::from(name.as_str())),
            (None, None) => None,
        }
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn metadata(&self) -> Option<RawMetadata> {
        self.metadata.clone()
    }

    fn node_id(&self) -> Option<u64> {
        self.id
    }

    fn children(&self) -> std::result::Result<ChildIter, NodeError> {
        if !self.kind.is_container() {
            return Ok(no_children());
        }
        if let Some(reason) = &self.faults.children {
            return Err(NodeError::subtree(reason.clone()));
        }
        let mut items: Vec<std::result::Result<BoxedNode, NodeError>> = self
            .children
            .iter()
            .map(|child| Ok(Box::new(child.clone()) as BoxedNode))
            .collect();
        items.extend(
            self.faults
                .corrupt_children
                .iter()
                .map(|reason| Err(NodeError::corrupt(reason.clone()))),
        );
        Ok(Box::new(items.into_iter()))
    }

    fn content(&self, offset: u64, length: usize) -> std::result::Result<Vec<u8>, NodeError> {
        if self.kind.is_container() {
            return Err(NodeError::content(format!("{} has no content", self.kind.label())));
        }
        if self.faults.content_from.is_some_and(|from| offset >= from) {
            return Err(NodeError::content(format!("read fault at offset {offset}")));
        }
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.content.len());
        let end = start.saturating_add(length).min(self.content.len());
        Ok(self.content[start..end].to_vec())
    }

    fn values(&self) -> std::result::Result<Vec<ValueSlot>, NodeError> {
        if let Some(reason) = &self.faults.values {
            return Err(NodeError::content(reason.clone()));
        }
        let mut slots: Vec<ValueSlot> = self.values.iter().cloned().map(ValueSlot::from).collect();
        slots.extend(self.faults.failing_values.iter().map(|name| ValueSlot {
            name: name.clone(),
            data: Err(NodeError::corrupt("value cell unreadable")),
        }));
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueData;

    #[test]
    fn content_reads_are_bounded() {
        let node = MemoryNode::file("a.log", b"hello world".to_vec());
        assert_eq!(node.content(0, 5).unwrap(), b"hello");
        assert_eq!(node.content(6, 100).unwrap(), b"world");
        assert!(node.content(50, 5).unwrap().is_empty());
    }

    #[test]
    fn directories_have_no_content() {
        let dir = MemoryNode::directory("d", Vec::new());
        assert!(matches!(
            dir.content(0, 1),
            Err(NodeError::ContentUnavailable { .. })
        ));
    }

    #[test]
    fn injected_faults_surface_as_node_errors() {
        let dir = MemoryNode::directory("d", vec![MemoryNode::file("x", Vec::new())])
            .with_corrupt_child("bad index entry");
        let items: Vec<_> = dir.children().unwrap().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(NodeError::CorruptEntry { .. })));

        let denied = MemoryNode::directory("d", Vec::new()).failing_children("access denied");
        assert!(matches!(
            denied.children(),
            Err(NodeError::SubtreeAccess { .. })
        ));
    }

    #[test]
    fn raw_name_takes_precedence() {
        let node = MemoryNode::file("ignored", Vec::new()).with_raw_name(&[0x66, 0xff]);
        assert_eq!(node.name(), Some(RawName::Bytes(vec![0x66, 0xff])));
        assert_eq!(node.without_name().name(), None);
    }

    #[test]
    fn parses_a_hive_dump() {
        let dump = r#"{
            "name": "ROOT",
            "kind": "Key",
            "metadata": { "last_write": 1700000000 },
            "values": [
                { "name": "Count", "data": { "type": "integer", "data": 7 } },
                { "name": "Blob", "data": { "type": "binary", "data": [1, 2] } }
            ],
            "children": [
                { "name": "Select", "kind": "Key", "metadata": {} }
            ]
        }"#;
        let root = MemoryNode::from_json(dump).unwrap();
        assert_eq!(root.count(), 2);
        let values = root.values().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].data.as_ref().unwrap(), &ValueData::Integer(7));
        assert_eq!(root.metadata().unwrap().last_write, Some(1_700_000_000));
    }

    #[test]
    fn malformed_dump_is_rejected() {
        assert!(MemoryNode::from_json("{\"kind\": \"Folder\"}").is_err());
    }
}
