/// Run summary — headline totals computed from a finished run's records.
use super::file_types::{analyse_file_types, CategoryStats};
use crate::model::size::SizeBucket;
use crate::model::TriageRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub files: u64,
    pub directories: u64,
    pub keys: u64,
    /// Sum of file sizes. Directory sizes are not content and are left out.
    pub total_bytes: u64,
    pub anomalies: u64,
    /// `anomalies / (files + directories)`, 0 when there are none.
    pub anomaly_rate: f64,
    /// Anomaly reasons by count, most frequent first.
    pub reasons: Vec<(String, u64)>,
    /// File counts per size bucket; every bucket is present.
    pub size_buckets: BTreeMap<SizeBucket, u64>,
    pub categories: Vec<CategoryStats>,
}

impl RunSummary {
    pub fn from_records(records: &[TriageRecord]) -> Self {
        let mut files = 0;
        let mut directories = 0;
        let mut keys = 0;
        let mut total_bytes = 0;
        let mut anomalies = 0;
        let mut reasons: HashMap<&str, u64> = HashMap::new();
        let mut size_buckets: BTreeMap<SizeBucket, u64> =
            SizeBucket::ALL.iter().map(|b| (*b, 0)).collect();

        for record in records {
            let artifact = match record {
                TriageRecord::Key(_) => {
                    keys += 1;
                    continue;
                }
                TriageRecord::Artifact(a) => a,
            };
            if artifact.is_directory() {
                directories += 1;
            } else {
                files += 1;
                total_bytes += artifact.size;
                *size_buckets.entry(SizeBucket::of(artifact.size)).or_default() += 1;
            }
            if artifact.is_anomalous() {
                anomalies += 1;
                if let Some(reason) = &artifact.anomaly_reason {
                    *reasons.entry(reason.as_str()).or_default() += 1;
                }
            }
        }

        let mut reasons: Vec<(String, u64)> = reasons
            .into_iter()
            .map(|(reason, n)| (reason.to_string(), n))
            .collect();
        reasons.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let artifacts = files + directories;
        let anomaly_rate = if artifacts == 0 {
            0.0
        } else {
            anomalies as f64 / artifacts as f64
        };

        Self {
            files,
            directories,
            keys,
            total_bytes,
            anomalies,
            anomaly_rate,
            reasons,
            size_buckets,
            categories: analyse_file_types(records),
        }
    }
}
