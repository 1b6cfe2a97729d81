/// Analysis modules — streaming statistics and post-run summaries.
///
/// - [`stats`] — mergeable accumulators fed by the traversal engine.
/// - [`summary`] — headline totals over a finished run.
/// - [`file_types`] — evidence categories by extension.
/// - [`activity`] — creation and access time series.
pub mod activity;
pub mod file_types;
pub mod stats;
pub mod summary;

pub use activity::ActivitySeries;
pub use file_types::{analyse_file_types, categorise_extension, CategoryStats, FileCategory};
pub use stats::{FrequencyTable, Statistics, StatisticsSnapshot};
pub use summary::RunSummary;
