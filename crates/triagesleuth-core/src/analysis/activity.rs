/// Activity series over artifact timestamps: creations per day and per
/// month, accesses per hour of day.
///
/// Records with a missing timestamp are left out of the matching series.
use crate::model::TriageRecord;
use chrono::Timelike;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivitySeries {
    /// `YYYY-MM-DD` → files created that day.
    pub created_per_day: BTreeMap<String, u64>,
    /// `YYYY-MM` → files created that month.
    pub created_per_month: BTreeMap<String, u64>,
    /// Hour of day (0-23, UTC) → accesses.
    pub accessed_per_hour: BTreeMap<u32, u64>,
}

impl ActivitySeries {
    pub fn from_records(records: &[TriageRecord]) -> Self {
        let mut series = Self::default();
        for record in records.iter().filter_map(TriageRecord::as_artifact) {
            if let Some(created) = record.created_time.get() {
                *series
                    .created_per_day
                    .entry(created.format("%Y-%m-%d").to_string())
                    .or_default() += 1;
                *series
                    .created_per_month
                    .entry(created.format("%Y-%m").to_string())
                    .or_default() += 1;
            }
            if let Some(accessed) = record.accessed_time.get() {
                *series.accessed_per_hour.entry(accessed.hour()).or_default() += 1;
            }
        }
        series
    }

    /// Busiest creation day, earliest first on ties.
    pub fn peak_creation_day(&self) -> Option<(&str, u64)> {
        self.created_per_day
            .iter()
            .fold(None, |best: Option<(&str, u64)>, (day, n)| match best {
                Some((_, top)) if top >= *n => best,
                _ => Some((day.as_str(), *n)),
            })
    }
}
