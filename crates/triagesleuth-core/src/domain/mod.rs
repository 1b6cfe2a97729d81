/// Domain analyzers — the per-domain half of the pipeline.
///
/// The traversal engine is written once; an [`Analyzer`] decides, for each
/// visited node, whether a record is emitted and what it looks like. Path
/// layout differs per domain too, so analyzers also pick a [`PathStyle`].
///
/// - [`generic`] — File/Directory classification, no anomaly rules.
/// - [`log`] — log-content assessment.
/// - [`network`] — membership-filtered network artifacts.
/// - [`registry`] — key records with per-value operation labels.
pub mod generic;
pub mod log;
pub mod network;
pub mod registry;

use crate::analysis::Statistics;
use crate::config::{Domain, TriageConfig};
use crate::error::NodeError;
use crate::model::{ArtifactRecord, NodeKind, TreeNode, TriageRecord};
use crate::normalize::CanonicalMetadata;
use chrono::{DateTime, Utc};
use compact_str::CompactString;

pub use generic::GenericAnalyzer;
pub use log::LogAnalyzer;
pub use network::NetworkAnalyzer;
pub use registry::RegistryAnalyzer;

/// How node paths are composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// `/`-joined. The root container is implicit: it is not emitted and
    /// its children sit at depth 1.
    Slash,
    /// `\`-joined. The root key is emitted at depth 0 under its own name.
    Backslash,
}

impl PathStyle {
    #[inline]
    pub fn separator(self) -> char {
        match self {
            Self::Slash => '/',
            Self::Backslash => '\\',
        }
    }

    /// Whether the root node itself yields a record.
    #[inline]
    pub fn emits_root(self) -> bool {
        matches!(self, Self::Backslash)
    }

    /// Path of a child named `component` under `parent`.
    pub fn join(self, parent: &str, component: &str) -> String {
        let sep = self.separator();
        let mut path = String::with_capacity(parent.len() + component.len() + 1);
        path.push_str(parent);
        if !parent.ends_with(sep) {
            path.push(sep);
        }
        path.push_str(component);
        path
    }
}

/// Everything an analyzer sees about one visited node.
pub struct Visit<'a> {
    pub node: &'a dyn TreeNode,
    pub path: &'a str,
    /// Decoded name, separator-safe.
    pub name: &'a str,
    pub depth: usize,
    pub kind: NodeKind,
    pub metadata: CanonicalMetadata,
    /// Number of child entries listed for a container, 0 for leaves.
    pub child_count: usize,
    /// Statistics accumulated so far in this traversal.
    pub running: &'a Statistics,
}

impl Visit<'_> {
    /// The common filesystem-shaped record with the given type label.
    pub fn artifact(&self, kind: &str) -> ArtifactRecord {
        ArtifactRecord {
            path: self.path.to_string(),
            size: self.metadata.size,
            created_time: self.metadata.created,
            modified_time: self.metadata.modified,
            accessed_time: self.metadata.accessed,
            kind: CompactString::new(kind),
            anomaly_reason: None,
            findings: Vec::new(),
        }
    }
}

/// Per-domain record production.
pub trait Analyzer: Send + Sync {
    fn domain(&self) -> Domain;

    fn path_style(&self) -> PathStyle;

    /// Whether records depend on earlier records in the same run. Such
    /// analyzers are always run sequentially.
    fn needs_running_totals(&self) -> bool {
        false
    }

    /// Produce the record for a node with metadata, or `None` when the node
    /// is not part of this domain's output. An error skips the node.
    fn analyze(&self, visit: &Visit<'_>) -> Result<Option<TriageRecord>, NodeError>;
}

/// Build the analyzer selected by `cfg.run.domain`. `now` is the fixed
/// evaluation instant for time-relative rules.
pub fn analyzer_for(cfg: &TriageConfig, now: DateTime<Utc>) -> Box<dyn Analyzer> {
    match cfg.run.domain {
        Domain::Generic => Box::new(GenericAnalyzer::new()),
        Domain::Log => Box::new(LogAnalyzer::new(&cfg.log, now)),
        Domain::Network => Box::new(NetworkAnalyzer::new(&cfg.network, now)),
        Domain::Registry => Box::new(RegistryAnalyzer::new(
            cfg.hive_name(),
            &cfg.registry,
            now,
        )),
    }
}
