/// Data model: the node capability consumed from tree sources and the
/// records produced for report sinks.
pub mod node;
pub mod record;
pub mod size;
pub mod timestamp;

pub use node::{
    no_children, BoxedNode, ChildIter, NodeKind, RawMetadata, RawName, RegistryValue, TreeNode,
    ValueData, ValueSlot,
};
pub use record::{
    AnomalyFinding, ArtifactRecord, KeyRecord, OperationLabel, OperationSummary, TriageRecord,
    ValueRecord,
};
pub use timestamp::CanonicalTime;
