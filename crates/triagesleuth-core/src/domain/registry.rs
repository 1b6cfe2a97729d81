/// Registry domain: one [`KeyRecord`] per key, each value labelled with an
/// operation class.
///
/// `operation_summary` counts the current key's values. With
/// `cumulative_operation_summary` it instead reports the run's running
/// totals up to and including this key, which is why the analyzer then
/// asks for sequential traversal.
use super::{Analyzer, PathStyle, Visit};
use crate::config::{Domain, RegistryConfig};
use crate::error::NodeError;
use crate::model::{KeyRecord, OperationLabel, OperationSummary, TriageRecord, ValueRecord};
use crate::rules::registry::OperationClassifier;
use chrono::{DateTime, Utc};
use tracing::warn;

pub struct RegistryAnalyzer {
    registry_file: String,
    classifier: OperationClassifier,
    cumulative: bool,
    now: DateTime<Utc>,
}

impl RegistryAnalyzer {
    pub fn new(registry_file: impl Into<String>, cfg: &RegistryConfig, now: DateTime<Utc>) -> Self {
        Self {
            registry_file: registry_file.into(),
            classifier: OperationClassifier::from_config(cfg),
            cumulative: cfg.cumulative_operation_summary,
            now,
        }
    }

    fn summarize(&self, values: &[ValueRecord], visit: &Visit<'_>) -> OperationSummary {
        let mut summary = OperationSummary::default();
        if self.cumulative {
            for label in [
                OperationLabel::Modify,
                OperationLabel::BinaryUpdate,
                OperationLabel::Access,
                OperationLabel::Unknown,
            ] {
                summary.add(label, visit.running.operation_count(label));
            }
        }
        for value in values {
            summary.add(value.operation, 1);
        }
        summary
    }
}

impl Analyzer for RegistryAnalyzer {
    fn domain(&self) -> Domain {
        Domain::Registry
    }

    fn path_style(&self) -> PathStyle {
        PathStyle::Backslash
    }

    fn needs_running_totals(&self) -> bool {
        self.cumulative
    }

    fn analyze(&self, visit: &Visit<'_>) -> Result<Option<TriageRecord>, NodeError> {
        let last_write = visit.metadata.last_write;
        let raw_values = match visit.node.values() {
            Ok(values) => values,
            Err(err) => {
                warn!("{}: value list unreadable: {err}", visit.path);
                Vec::new()
            }
        };
        let values: Vec<ValueRecord> = raw_values
            .into_iter()
            .map(|v| self.classifier.value_record(v, last_write, self.now))
            .collect();

        let operation_summary = self.summarize(&values, visit);
        let record = KeyRecord {
            registry_file: self.registry_file.clone(),
            key_path: visit.path.to_string(),
            key_depth: visit.depth,
            last_write_time: last_write,
            number_of_values: values.len(),
            number_of_subkeys: visit.child_count,
            operation_summary,
            values,
        };
        Ok(Some(record.into()))
    }
}
