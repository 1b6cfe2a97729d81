/// Tree sources: how a run obtains its root node.
///
/// - [`host`] — a directory on the local filesystem.
/// - [`memory`] — an in-memory tree, loadable from a JSON dump.
///
/// Opening is the only fatal step of a run: if the root cannot be opened
/// the run fails with `TreeUnavailable` before any traversal starts.
pub mod host;
pub mod memory;

use crate::config::{Domain, TriageConfig};
use crate::error::{Result, TriageError};
use crate::model::BoxedNode;
use host::HostNode;
use memory::MemoryNode;
use std::path::Path;
use tracing::info;

pub trait TreeSource {
    fn open_tree(&self, root: &Path) -> Result<BoxedNode>;
}

/// Directory trees on the host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSource;

impl TreeSource for HostSource {
    fn open_tree(&self, root: &Path) -> Result<BoxedNode> {
        let node = HostNode::open(root)
            .map_err(|err| TriageError::tree_unavailable(root.display().to_string(), err))?;
        Ok(Box::new(node))
    }
}

/// JSON tree dumps (pre-decoded registry hives).
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpSource;

impl TreeSource for DumpSource {
    fn open_tree(&self, root: &Path) -> Result<BoxedNode> {
        let tree = MemoryNode::load(root)?;
        info!("Loaded tree dump {} ({} nodes)", root.display(), tree.count());
        Ok(Box::new(tree))
    }
}

/// The source a domain reads from: registry runs take a tree dump, the
/// filesystem domains a host directory.
pub fn source_for(domain: Domain) -> Box<dyn TreeSource> {
    match domain {
        Domain::Registry => Box::new(DumpSource),
        Domain::Generic | Domain::Log | Domain::Network => Box::new(HostSource),
    }
}

/// Open the configured root.
pub fn open_tree(cfg: &TriageConfig) -> Result<BoxedNode> {
    source_for(cfg.run.domain).open_tree(&cfg.run.root)
}
