/// Statistics aggregator — streaming, mergeable counters fed by the
/// traversal engine.
///
/// Every accumulator is a monoid under pointwise addition: statistics
/// computed over disjoint sibling subtrees and merged in sibling order equal
/// the statistics of a single sequential pass. This is what lets the
/// parallel walker give each worker a private `Statistics`.
use crate::model::{OperationLabel, TriageRecord};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Occurrence counter that remembers first-seen order for stable top-N.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: HashMap<String, FrequencyEntry>,
    /// Number of increments so far; doubles as the next sequence number.
    next_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrequencyEntry {
    count: u64,
    first_seen: u64,
}

impl FrequencyTable {
    pub fn increment(&mut self, key: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        match self.entries.get_mut(key) {
            Some(entry) => entry.count += 1,
            None => {
                self.entries.insert(
                    key.to_string(),
                    FrequencyEntry {
                        count: 1,
                        first_seen: seq,
                    },
                );
            }
        }
    }

    /// Merge `other`, whose events happened after all of ours.
    pub fn merge(&mut self, other: &FrequencyTable) {
        let offset = self.next_seq;
        for (key, theirs) in &other.entries {
            let shifted = theirs.first_seen + offset;
            self.entries
                .entry(key.clone())
                .and_modify(|ours| {
                    ours.count += theirs.count;
                    ours.first_seen = ours.first_seen.min(shifted);
                })
                .or_insert(FrequencyEntry {
                    count: theirs.count,
                    first_seen: shifted,
                });
        }
        self.next_seq += other.next_seq;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.entries.get(key).map_or(0, |e| e.count)
    }

    /// The `n` most frequent keys: count descending, ties by first
    /// occurrence.
    pub fn top_n(&self, n: usize) -> Vec<(String, u64)> {
        let mut all: Vec<(&String, &FrequencyEntry)> = self.entries.iter().collect();
        all.sort_unstable_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(a.1.first_seen.cmp(&b.1.first_seen))
        });
        all.into_iter()
            .take(n)
            .map(|(k, e)| (k.clone(), e.count))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total increments, including repeats.
    #[inline]
    pub fn total(&self) -> u64 {
        self.next_seq
    }
}

/// Run-level accumulators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub depth_histogram: BTreeMap<usize, u64>,
    pub kind_histogram: BTreeMap<String, u64>,
    pub operation_histogram: BTreeMap<OperationLabel, u64>,
    pub value_type_histogram: BTreeMap<String, u64>,
    pub path_frequency: FrequencyTable,
    pub records: u64,
    pub anomalies: u64,
    pub total_bytes: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one emitted record.
    pub fn observe(&mut self, record: &TriageRecord) {
        self.records += 1;
        *self.depth_histogram.entry(record.depth()).or_default() += 1;
        bump(&mut self.kind_histogram, record.kind());

        match record {
            TriageRecord::Artifact(r) => {
                self.total_bytes += r.size;
                if r.is_anomalous() {
                    self.anomalies += 1;
                }
            }
            TriageRecord::Key(key) => {
                self.path_frequency.increment(&key.key_path);
                for value in key.values.iter().filter(|v| v.operation.is_countable()) {
                    *self.operation_histogram.entry(value.operation).or_default() += 1;
                    bump(&mut self.value_type_histogram, &value.value_type);
                }
            }
        }
    }

    /// Pointwise addition. `other` is taken to have been accumulated after
    /// `self` (it matters only for top-N tie order).
    pub fn merge(&mut self, other: &Statistics) {
        for (depth, n) in &other.depth_histogram {
            *self.depth_histogram.entry(*depth).or_default() += n;
        }
        add_all(&mut self.kind_histogram, &other.kind_histogram);
        for (label, n) in &other.operation_histogram {
            *self.operation_histogram.entry(*label).or_default() += n;
        }
        add_all(&mut self.value_type_histogram, &other.value_type_histogram);
        self.path_frequency.merge(&other.path_frequency);
        self.records += other.records;
        self.anomalies += other.anomalies;
        self.total_bytes += other.total_bytes;
    }

    #[inline]
    pub fn operation_count(&self, label: OperationLabel) -> u64 {
        self.operation_histogram.get(&label).copied().unwrap_or(0)
    }

    pub fn snapshot(&self, top_n: usize) -> StatisticsSnapshot {
        StatisticsSnapshot {
            records: self.records,
            anomalies: self.anomalies,
            total_bytes: self.total_bytes,
            key_depths: self.depth_histogram.clone(),
            kind_counts: self.kind_histogram.clone(),
            operations: self
                .operation_histogram
                .iter()
                .map(|(label, n)| (label.label().to_string(), *n))
                .collect(),
            value_types: self.value_type_histogram.clone(),
            most_frequent_paths: self.path_frequency.top_n(top_n),
        }
    }
}

fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
    match map.get_mut(key) {
        Some(n) => *n += 1,
        None => {
            map.insert(key.to_string(), 1);
        }
    }
}

fn add_all(into: &mut BTreeMap<String, u64>, from: &BTreeMap<String, u64>) {
    for (key, n) in from {
        *into.entry(key.clone()).or_default() += n;
    }
}

/// Serializable read-time view of [`Statistics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub records: u64,
    pub anomalies: u64,
    pub total_bytes: u64,
    pub key_depths: BTreeMap<usize, u64>,
    pub kind_counts: BTreeMap<String, u64>,
    pub operations: BTreeMap<String, u64>,
    pub value_types: BTreeMap<String, u64>,
    pub most_frequent_paths: Vec<(String, u64)>,
}

impl StatisticsSnapshot {
    /// `(category, value, count)` rows for the statistics CSV.
    pub fn rows(&self) -> Vec<(&'static str, String, u64)> {
        let mut rows = Vec::new();
        rows.extend(
            self.key_depths
                .iter()
                .map(|(d, n)| ("key_depth", d.to_string(), *n)),
        );
        rows.extend(self.kind_counts.iter().map(|(k, n)| ("kind", k.clone(), *n)));
        rows.extend(
            self.value_types
                .iter()
                .map(|(k, n)| ("value_type", k.clone(), *n)),
        );
        rows.extend(
            self.operations
                .iter()
                .map(|(k, n)| ("operation", k.clone(), *n)),
        );
        rows.extend(
            self.most_frequent_paths
                .iter()
                .map(|(k, n)| ("most_frequent_path", k.clone(), *n)),
        );
        rows
    }
}
