/// TriageSleuth Core — traversal, rules, statistics and reporting for
/// post-acquisition forensic triage.
///
/// This crate holds all the logic; the binary only wires config, logging
/// and output together.
///
/// # Modules
///
/// - [`model`] — node capability, records, canonical timestamps.
/// - [`normalize`] — raw metadata and names to canonical form.
/// - [`source`] — host-directory and tree-dump sources.
/// - [`rules`] — anomaly rules for the log, network and registry domains.
/// - [`domain`] — per-domain analyzers driven by the traversal.
/// - [`scanner`] — the traversal engine, parallel fan-out and background runs.
/// - [`analysis`] — streaming statistics and post-run summaries.
/// - [`report`] — run reports and JSON/CSV sinks.
/// - [`config`] — TOML configuration with environment overrides.
/// - [`error`] — run-level and node-level error types.
pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod model;
pub mod normalize;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod source;

pub use config::TriageConfig;
pub use error::{NodeError, Result, TriageError};
pub use report::TriageReport;
pub use scanner::{run_triage, start_triage};
