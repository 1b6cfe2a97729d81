/// Traversal engine — depth-first walk over any [`TreeNode`] tree.
///
/// Recursion is replaced by an explicit stack of frames, one per open
/// container, so a hostile tree can only cost heap proportional to
/// depth × fan-out, never native stack.
///
/// Per node (`Enter`):
///
/// 1. stop if the run was cancelled
/// 2. drop `.`/`..` pseudo-entries and nodes with neither name nor metadata
/// 3. compose the path; reject a node whose id repeats an ancestor
/// 4. list children of containers (a failure is remembered, not fatal)
/// 5. hand nodes with metadata to the domain [`Analyzer`]; emit its record
/// 6. push a frame for the children, unless the depth limit was reached
///
/// Every recovered fault becomes a [`SkippedSubtree`]; the walk always
/// continues with the next sibling.
use super::progress::TriageProgress;
use super::LiveStats;
use crate::analysis::Statistics;
use crate::domain::{Analyzer, PathStyle, Visit};
use crate::error::NodeError;
use crate::model::{BoxedNode, TriageRecord};
use crate::normalize::{decode_name, normalize, path_component, UNNAMED};
use crate::report::{RunStatus, SkipKind, SkippedSubtree};
use compact_str::CompactString;
use crossbeam_channel::Sender;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Emitted records between progress messages, per walker.
pub const PROGRESS_INTERVAL: usize = 512;

/// Cooperative stop signal, checked at every node entry.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: usize,
    /// 0 = unlimited.
    pub max_records: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 4_096,
            max_records: 0,
        }
    }
}

/// State shared by every walker of one run.
pub struct RunShared {
    pub cancel: CancelToken,
    pub limits: Limits,
    emitted: AtomicUsize,
    anomalies: AtomicU64,
    skipped: AtomicU64,
    limit_hit: AtomicBool,
    progress: Option<Sender<TriageProgress>>,
    live: Option<LiveStats>,
}

impl RunShared {
    pub fn new(
        limits: Limits,
        cancel: CancelToken,
        progress: Option<Sender<TriageProgress>>,
        live: Option<LiveStats>,
    ) -> Self {
        Self {
            cancel,
            limits,
            emitted: AtomicUsize::new(0),
            anomalies: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            limit_hit: AtomicBool::new(false),
            progress,
            live,
        }
    }

    /// Claim one output slot. `false` once `max_records` is exhausted.
    ///
    /// The run counts as truncated only when a record is actually refused,
    /// so a tree that fills the budget exactly still completes.
    fn claim_slot(&self) -> bool {
        let limit = self.limits.max_records;
        let prior = self.emitted.fetch_add(1, Ordering::Relaxed);
        if limit == 0 || prior < limit {
            return true;
        }
        self.limit_hit.store(true, Ordering::Relaxed);
        self.cancel.cancel();
        false
    }

    pub fn status(&self) -> RunStatus {
        if self.limit_hit.load(Ordering::Relaxed) {
            RunStatus::Truncated {
                limit: self.limits.max_records,
            }
        } else if self.cancel.is_cancelled() {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        }
    }

    pub fn records_emitted(&self) -> u64 {
        let n = self.emitted.load(Ordering::Relaxed);
        let n = match self.limits.max_records {
            0 => n,
            limit => n.min(limit),
        };
        n as u64
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub(crate) fn send(&self, msg: TriageProgress) {
        if let Some(tx) = &self.progress {
            // A full channel means nobody is draining; drop rather than stall.
            let _ = tx.try_send(msg);
        }
    }
}

/// What one walker produced.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub records: Vec<TriageRecord>,
    pub statistics: Statistics,
    pub skipped: Vec<SkippedSubtree>,
}

impl WalkOutcome {
    /// Append `other`, which covers later siblings.
    pub fn append(&mut self, other: WalkOutcome) {
        self.records.extend(other.records);
        self.statistics.merge(&other.statistics);
        self.skipped.extend(other.skipped);
    }
}

pub type PendingChild = Result<BoxedNode, NodeError>;

/// An open container whose children are still being visited.
pub struct Frame {
    path: String,
    depth: usize,
    id: Option<u64>,
    pending: std::vec::IntoIter<PendingChild>,
}

impl Frame {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Take the unvisited children, leaving the frame exhausted.
    pub fn take_pending(&mut self) -> Vec<PendingChild> {
        std::mem::take(&mut self.pending).collect()
    }
}

pub struct Walker<'a> {
    analyzer: &'a dyn Analyzer,
    shared: &'a RunShared,
    style: PathStyle,
    ancestors: HashSet<u64>,
    out: WalkOutcome,
    /// Statistics not yet folded into the live snapshot.
    live_delta: Statistics,
    since_tick: usize,
}

impl<'a> Walker<'a> {
    pub fn new(analyzer: &'a dyn Analyzer, shared: &'a RunShared) -> Self {
        Self {
            analyzer,
            shared,
            style: analyzer.path_style(),
            ancestors: HashSet::new(),
            out: WalkOutcome::default(),
            live_delta: Statistics::new(),
            since_tick: 0,
        }
    }

    /// A walker for one subtree below an already-entered root whose id is
    /// `root_id`.
    pub fn below(analyzer: &'a dyn Analyzer, shared: &'a RunShared, root_id: Option<u64>) -> Self {
        let mut walker = Self::new(analyzer, shared);
        walker.ancestors.extend(root_id);
        walker
    }

    /// Enter the tree root and return its frame, if it has children to
    /// visit.
    ///
    /// With `/` paths the root container is implicit: it is not emitted,
    /// its path is `/` and its children sit at depth 1. With `\` paths the
    /// root is an ordinary node at depth 0.
    pub fn open_root(&mut self, root: BoxedNode) -> Option<Frame> {
        match self.style {
            PathStyle::Backslash => self.enter(root, None, 0),
            PathStyle::Slash if !root.kind().is_container() => self.enter(root, Some("/"), 1),
            PathStyle::Slash => {
                let root_path = PathStyle::Slash.separator().to_string();
                let id = root.node_id();
                match root.children() {
                    Ok(children) => {
                        self.ancestors.extend(id);
                        Some(Frame {
                            path: root_path,
                            depth: 0,
                            id,
                            pending: children.collect::<Vec<_>>().into_iter(),
                        })
                    }
                    Err(err) => {
                        self.skip(&root_path, SkipKind::SubtreeAccess, &err);
                        None
                    }
                }
            }
        }
    }

    /// Sequential walk of a whole tree.
    pub fn walk(mut self, root: BoxedNode) -> WalkOutcome {
        if let Some(frame) = self.open_root(root) {
            self.drain(vec![frame]);
        }
        self.finish()
    }

    /// Visit one pending child of the container at `parent_path` and
    /// everything below it.
    pub fn visit_child(&mut self, item: PendingChild, parent_path: &str, parent_depth: usize) {
        match item {
            Err(err) => self.skip(parent_path, SkipKind::CorruptEntry, &err),
            Ok(child) => {
                if let Some(frame) = self.enter(child, Some(parent_path), parent_depth + 1) {
                    self.drain(vec![frame]);
                }
            }
        }
    }

    /// Run the explicit stack until it is empty or the run is cancelled.
    fn drain(&mut self, mut stack: Vec<Frame>) {
        while let Some(frame) = stack.last_mut() {
            if self.shared.cancel.is_cancelled() {
                break;
            }
            match frame.pending.next() {
                None => {
                    if let Some(done) = stack.pop() {
                        if let Some(id) = done.id {
                            self.ancestors.remove(&id);
                        }
                    }
                }
                Some(Err(err)) => {
                    let path = frame.path.clone();
                    self.skip(&path, SkipKind::CorruptEntry, &err);
                }
                Some(Ok(child)) => {
                    let next = self.enter(child, Some(&frame.path), frame.depth + 1);
                    if let Some(next) = next {
                        stack.push(next);
                    }
                }
            }
        }
    }

    /// `Enter(node, parentPath, depth)`. Returns the node's frame when its
    /// children should be visited.
    fn enter(&mut self, node: BoxedNode, parent: Option<&str>, depth: usize) -> Option<Frame> {
        if self.shared.cancel.is_cancelled() {
            return None;
        }

        let raw_name = node.name();
        if raw_name.as_ref().is_some_and(|n| n.is_dot_entry()) {
            return None;
        }
        let raw_meta = node.metadata();
        if raw_name.is_none() && raw_meta.is_none() {
            debug!(parent = parent.unwrap_or(""), "skipping node with neither name nor metadata");
            return None;
        }

        let decoded = raw_name
            .as_ref()
            .map_or_else(|| CompactString::new(UNNAMED), decode_name);
        let component = path_component(&decoded, self.style.separator());
        let path = match parent {
            Some(parent) => self.style.join(parent, &component),
            None => component.to_string(),
        };

        let id = node.node_id();
        if let Some(id) = id {
            if self.ancestors.contains(&id) {
                let err = NodeError::corrupt(format!("node id {id} repeats an ancestor"));
                self.skip(&path, SkipKind::Cycle, &err);
                return None;
            }
        }

        let kind = node.kind();
        let listing: Option<Result<Vec<PendingChild>, NodeError>> = if !kind.is_container() {
            None
        } else if depth >= self.shared.limits.max_depth {
            let err = NodeError::subtree(format!(
                "children below depth {} not visited",
                self.shared.limits.max_depth
            ));
            self.skip(&path, SkipKind::DepthLimit, &err);
            None
        } else {
            Some(node.children().map(|c| c.collect()))
        };

        if let Some(raw_meta) = raw_meta {
            let child_count = match &listing {
                Some(Ok(children)) => children
                    .iter()
                    .filter(|c| match c {
                        Ok(child) => !child.name().is_some_and(|n| n.is_dot_entry()),
                        Err(_) => false,
                    })
                    .count(),
                _ => 0,
            };
            let visit = Visit {
                node: &*node,
                path: &path,
                name: &component,
                depth,
                kind,
                metadata: normalize(&raw_meta),
                child_count,
                running: &self.out.statistics,
            };
            match self.analyzer.analyze(&visit) {
                Ok(Some(record)) => {
                    if !self.emit(record) {
                        return None;
                    }
                }
                Ok(None) => {}
                Err(err) => self.skip(&path, SkipKind::ContentUnavailable, &err),
            }
        }

        match listing {
            Some(Ok(children)) => {
                self.ancestors.extend(id);
                Some(Frame {
                    path,
                    depth,
                    id,
                    pending: children.into_iter(),
                })
            }
            Some(Err(err)) => {
                self.skip(&path, SkipKind::SubtreeAccess, &err);
                None
            }
            None => None,
        }
    }

    /// Append a record. `false` when the record budget is exhausted.
    fn emit(&mut self, record: TriageRecord) -> bool {
        if !self.shared.claim_slot() {
            return false;
        }
        if !record.findings().is_empty() {
            self.shared.anomalies.fetch_add(1, Ordering::Relaxed);
        }
        self.out.statistics.observe(&record);
        if self.shared.live.is_some() {
            self.live_delta.observe(&record);
        }

        self.since_tick += 1;
        if self.since_tick >= PROGRESS_INTERVAL {
            self.tick(record.path());
        }
        self.out.records.push(record);
        true
    }

    fn skip(&mut self, path: &str, kind: SkipKind, err: &NodeError) {
        warn!("{path}: {} ({err})", kind.label());
        self.shared.skipped.fetch_add(1, Ordering::Relaxed);
        let entry = SkippedSubtree {
            path: path.to_string(),
            kind,
            message: err.to_string(),
        };
        self.shared.send(TriageProgress::Skipped {
            path: entry.path.clone(),
            kind,
            message: entry.message.clone(),
        });
        self.out.skipped.push(entry);
    }

    /// Send a progress update and fold pending statistics into the live
    /// snapshot.
    fn tick(&mut self, current_path: &str) {
        self.since_tick = 0;
        if let Some(live) = &self.shared.live {
            live.write().merge(&self.live_delta);
            self.live_delta = Statistics::new();
        }
        self.shared.send(TriageProgress::Update {
            records_emitted: self.shared.records_emitted(),
            anomalies: self.shared.anomalies.load(Ordering::Relaxed),
            skipped: self.shared.skipped_count(),
            current_path: current_path.to_string(),
        });
    }

    /// Flush the live snapshot and hand back the outcome.
    pub fn finish(mut self) -> WalkOutcome {
        if let Some(live) = &self.shared.live {
            live.write().merge(&self.live_delta);
        }
        self.live_delta = Statistics::new();
        self.out
    }
}
