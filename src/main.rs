//! TriageSleuth — post-acquisition forensic triage.
//!
//! Thin binary entry point. All logic lives in the `triagesleuth-core`
//! crate; configuration comes from `triagesleuth.toml` (or the file named by
//! `TRIAGE_CONFIG`) plus `TRIAGE_*` environment overrides.

use triagesleuth_core::analysis::RunSummary;
use triagesleuth_core::model::size::{format_count, format_size};
use triagesleuth_core::report::{CsvFileSink, JsonFileSink, RecordSink};
use triagesleuth_core::scanner::progress::TriageProgress;
use triagesleuth_core::{start_triage, TriageConfig};

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("TriageSleuth starting");

    let cfg = TriageConfig::load(None)?;
    let output = cfg.run.output.clone();
    let top_n = cfg.report.top_n;

    let handle = start_triage(cfg)?;
    for msg in handle.progress_rx.iter() {
        match msg {
            TriageProgress::Update {
                records_emitted,
                anomalies,
                current_path,
                ..
            } => tracing::info!(
                "{} records, {} anomalies, at {current_path}",
                format_count(records_emitted),
                format_count(anomalies)
            ),
            TriageProgress::Skipped { .. } => {}
            TriageProgress::Complete { .. } | TriageProgress::Cancelled => break,
        }
    }
    let report = handle.join()?;

    let summary = RunSummary::from_records(&report.records);
    tracing::info!(
        "{:?}: {} files, {} directories, {} keys, {} in files, {} anomalies ({:.1}%), {} skipped",
        report.status,
        format_count(summary.files),
        format_count(summary.directories),
        format_count(summary.keys),
        format_size(summary.total_bytes),
        format_count(summary.anomalies),
        summary.anomaly_rate * 100.0,
        format_count(report.skipped.len() as u64)
    );
    for (reason, count) in summary.reasons.iter().take(top_n) {
        tracing::info!("  {count:>8}  {reason}");
    }

    if let Some(path) = output {
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let mut sink: Box<dyn RecordSink> = if is_csv {
            Box::new(CsvFileSink { path, top_n })
        } else {
            Box::new(JsonFileSink { path, top_n })
        };
        sink.consume(&report)?;
    }

    Ok(())
}
