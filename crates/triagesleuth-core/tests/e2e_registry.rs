/// End-to-end registry triage over a JSON hive dump.
///
/// The dump is written to a temporary file and loaded through the same
/// `DumpSource` a configured registry run uses, then walked with a fixed
/// evaluation instant so operation labels are deterministic.
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use triagesleuth_core::config::{Domain, TriageConfig};
use triagesleuth_core::model::{KeyRecord, OperationLabel};
use triagesleuth_core::report::{write_csv, write_statistics_csv, RunStatus};
use triagesleuth_core::scanner::{run_triage, triage_tree, RunHooks};
use triagesleuth_core::source::{DumpSource, TreeSource};
use triagesleuth_core::TriageReport;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

/// ```text
/// ROOT                      (no values)
///   ControlSet001           written 2 h ago
///     Services              written 2 h ago, one binary + one string value
///   Select                  written 3 days ago, one integer + one unreadable value
///   Setup                   no last-write time, one string value
/// ```
fn hive_json() -> String {
    let recent = (now() - Duration::hours(2)).timestamp();
    let old = (now() - Duration::days(3)).timestamp();
    format!(
        r#"{{
  "name": "ROOT",
  "kind": "Key",
  "metadata": {{}},
  "children": [
    {{
      "name": "ControlSet001",
      "kind": "Key",
      "metadata": {{ "last_write": {recent} }},
      "children": [
        {{
          "name": "Services",
          "kind": "Key",
          "metadata": {{ "last_write": {recent} }},
          "values": [
            {{ "name": "Blob", "data": {{ "type": "binary", "data": [222, 173] }} }},
            {{ "name": "ImagePath", "data": {{ "type": "string", "data": "C:\\evil.exe" }} }}
          ]
        }}
      ]
    }},
    {{
      "name": "Select",
      "kind": "Key",
      "metadata": {{ "last_write": {old} }},
      "values": [
        {{ "name": "Current", "data": {{ "type": "integer", "data": 1 }} }}
      ],
      "faults": {{ "failing_values": ["Default"] }}
    }},
    {{
      "name": "Setup",
      "kind": "Key",
      "metadata": {{}},
      "values": [
        {{ "name": "CmdLine", "data": {{ "type": "string", "data": "" }} }}
      ]
    }}
  ]
}}"#
    )
}

fn write_hive(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("SYSTEM.json");
    fs::write(&path, hive_json()).unwrap();
    path
}

fn registry_config(root: &Path) -> TriageConfig {
    let mut cfg = TriageConfig::default();
    cfg.run.domain = Domain::Registry;
    cfg.run.root = root.to_path_buf();
    cfg.run.hive_name = Some("SYSTEM".into());
    cfg
}

fn triage(cfg: &TriageConfig) -> TriageReport {
    let root = DumpSource.open_tree(&cfg.run.root).unwrap();
    triage_tree(root, cfg, now(), RunHooks::default()).unwrap()
}

fn key<'a>(report: &'a TriageReport, path: &str) -> &'a KeyRecord {
    report
        .records
        .iter()
        .find_map(|r| r.as_key().filter(|k| k.key_path == path))
        .unwrap_or_else(|| panic!("missing key {path}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn keys_are_emitted_in_pre_order_with_backslash_paths() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let report = triage(&registry_config(&write_hive(tmp.path())));

    assert_eq!(report.status, RunStatus::Completed);
    let paths: Vec<_> = report.records.iter().map(|r| r.path()).collect();
    assert_eq!(
        paths,
        vec![
            "ROOT",
            "ROOT\\ControlSet001",
            "ROOT\\ControlSet001\\Services",
            "ROOT\\Select",
            "ROOT\\Setup"
        ]
    );

    let root = key(&report, "ROOT");
    assert_eq!(root.key_depth, 0);
    assert_eq!(root.registry_file, "SYSTEM");
    assert_eq!(root.number_of_subkeys, 3);
    assert_eq!(root.number_of_values, 0);
    assert!(root.last_write_time.is_missing());

    let services = key(&report, "ROOT\\ControlSet001\\Services");
    assert_eq!(services.key_depth, 2);
    assert_eq!(services.number_of_subkeys, 0);
}

#[test]
fn values_are_labelled_by_recency_and_type() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let report = triage(&registry_config(&write_hive(tmp.path())));

    let services = key(&report, "ROOT\\ControlSet001\\Services");
    let ops: Vec<_> = services.values.iter().map(|v| v.operation).collect();
    // Recent writes win over the binary check.
    assert_eq!(ops, vec![OperationLabel::Modify, OperationLabel::Modify]);
    assert_eq!(services.values[0].value, "dead");
    assert_eq!(services.values[0].value_type, "BINARY");
    assert_eq!(services.operation_summary.modify, 2);

    let select = key(&report, "ROOT\\Select");
    assert_eq!(select.number_of_values, 2);
    assert_eq!(select.values[0].operation, OperationLabel::Access);
    let broken = &select.values[1];
    assert_eq!(broken.name, "Default");
    assert_eq!(broken.value_type, "ERROR");
    assert_eq!(broken.operation, OperationLabel::Error);
    assert!(broken.value.starts_with("Error reading value"));

    let setup = key(&report, "ROOT\\Setup");
    assert_eq!(setup.values[0].operation, OperationLabel::Unknown);
    assert_eq!(setup.operation_summary.unknown, 1);
}

#[test]
fn statistics_count_depths_operations_and_paths() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let report = triage(&registry_config(&write_hive(tmp.path())));
    let stats = &report.statistics;

    assert_eq!(stats.records, 5);
    assert_eq!(stats.depth_histogram[&0], 1);
    assert_eq!(stats.depth_histogram[&1], 3);
    assert_eq!(stats.depth_histogram[&2], 1);
    assert_eq!(stats.kind_histogram["Key"], 5);

    assert_eq!(stats.operation_count(OperationLabel::Modify), 2);
    assert_eq!(stats.operation_count(OperationLabel::Access), 1);
    assert_eq!(stats.operation_count(OperationLabel::Unknown), 1);
    // Failed reads are reported but not counted.
    assert_eq!(stats.operation_count(OperationLabel::Error), 0);
    assert_eq!(stats.value_type_histogram.get("ERROR"), None);
    assert_eq!(stats.value_type_histogram["STRING"], 2);

    assert_eq!(stats.path_frequency.len(), 5);
    assert_eq!(stats.path_frequency.get("ROOT\\Select"), 1);
}

#[test]
fn cumulative_summary_reports_running_totals() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let mut cfg = registry_config(&write_hive(tmp.path()));
    cfg.registry.cumulative_operation_summary = true;
    cfg.run.parallel = true;
    let report = triage(&cfg);

    let select = key(&report, "ROOT\\Select");
    // Two MODIFY from Services, then this key's ACCESS.
    assert_eq!(select.operation_summary.modify, 2);
    assert_eq!(select.operation_summary.access, 1);

    let setup = key(&report, "ROOT\\Setup");
    assert_eq!(setup.operation_summary.total(), 4);
}

#[test]
fn registry_csv_flattens_values() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let report = triage(&registry_config(&write_hive(tmp.path())));

    let mut buf = Vec::new();
    write_csv(&mut buf, &report.records).unwrap();
    let text = String::from_utf8(buf).unwrap();
    // Header + ROOT + ControlSet001 (blank rows) + 2 + 2 + 1 value rows.
    assert_eq!(text.lines().count(), 1 + 2 + 5);
    assert!(text.contains("SYSTEM,ROOT\\Select,1,"));

    let mut buf = Vec::new();
    write_statistics_csv(&mut buf, &report.statistics.snapshot(3)).unwrap();
    let stats = String::from_utf8(buf).unwrap();
    assert!(stats.contains("operation,MODIFY,2"));
    assert!(stats.contains("key_depth,1,3"));
    assert_eq!(stats.matches("most_frequent_path,").count(), 3);
}

#[test]
fn configured_run_loads_the_dump() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let report = run_triage(&registry_config(&write_hive(tmp.path()))).unwrap();
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.domain, Domain::Registry);
}

#[test]
fn unreadable_dump_fails_the_run() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let path = tmp.path().join("broken.json");
    fs::write(&path, "[1, 2").unwrap();
    assert!(run_triage(&registry_config(&path)).is_err());
}
