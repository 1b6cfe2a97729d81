/// Log-content domain.
///
/// Every node with metadata is emitted. Files whose name carries a
/// configured log suffix have their content read in chunks and assessed;
/// the rest are emitted without an `anomaly_reason`.
use super::{Analyzer, PathStyle, Visit};
use crate::config::{Domain, LogConfig};
use crate::error::NodeError;
use crate::model::{NodeKind, TreeNode, TriageRecord};
use crate::normalize::decode_content;
use crate::rules::log_content::{extension_label, LogRules, ScannedContent};
use chrono::{DateTime, Utc};
use tracing::warn;

pub struct LogAnalyzer {
    rules: LogRules,
    chunk: usize,
    max_bytes: u64,
    now: DateTime<Utc>,
}

impl LogAnalyzer {
    pub fn new(cfg: &LogConfig, now: DateTime<Utc>) -> Self {
        Self {
            rules: LogRules::from_config(cfg),
            chunk: cfg.read_chunk_bytes.max(1),
            max_bytes: cfg.max_content_bytes,
            now,
        }
    }

    /// Read up to `min(size, max_content_bytes)` bytes.
    ///
    /// A fault before the first byte fails the node. A later fault keeps
    /// what was read and marks the content partial.
    fn read_content(&self, node: &dyn TreeNode, size: u64, path: &str) -> Result<ScannedContent, NodeError> {
        let limit = size.min(self.max_bytes);
        let mut buf: Vec<u8> = Vec::with_capacity(usize::try_from(limit).unwrap_or(0).min(self.chunk));
        let mut offset: u64 = 0;
        let mut partial = size > self.max_bytes;

        while offset < limit {
            let want = usize::try_from(limit - offset).map_or(self.chunk, |left| left.min(self.chunk));
            match node.content(offset, want) {
                Ok(bytes) if bytes.is_empty() => break,
                Ok(bytes) => {
                    offset += bytes.len() as u64;
                    buf.extend_from_slice(&bytes);
                }
                Err(err) if offset == 0 => return Err(err),
                Err(err) => {
                    warn!("{path}: content read stopped at byte {offset}: {err}");
                    partial = true;
                    break;
                }
            }
        }

        Ok(ScannedContent::scan(decode_content(&buf).into_owned()).partial(partial))
    }
}

impl Analyzer for LogAnalyzer {
    fn domain(&self) -> Domain {
        Domain::Log
    }

    fn path_style(&self) -> PathStyle {
        PathStyle::Slash
    }

    fn analyze(&self, visit: &Visit<'_>) -> Result<Option<TriageRecord>, NodeError> {
        if visit.kind.is_container() {
            return Ok(Some(visit.artifact("Directory").into()));
        }

        let mut record = visit.artifact(&extension_label(visit.name));
        if visit.kind == NodeKind::File && self.rules.wants_content(visit.name) {
            let content = self.read_content(visit.node, visit.metadata.size, visit.path)?;
            self.rules.assess(&mut record, &content, self.now);
        }
        Ok(Some(record.into()))
    }
}
