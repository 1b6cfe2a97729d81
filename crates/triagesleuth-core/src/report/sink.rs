/// Record sinks: JSON and CSV writers for finished reports.
///
/// CSV rows use dedicated row structs: the csv crate needs a fixed column
/// set, so optional fields are written as empty cells rather than omitted.
use super::TriageReport;
use crate::analysis::StatisticsSnapshot;
use crate::error::{Result, TriageError};
use crate::model::{ArtifactRecord, CanonicalTime, KeyRecord, TriageRecord};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Consumer of a finished report.
pub trait RecordSink {
    fn consume(&mut self, report: &TriageReport) -> Result<()>;
}

/// Writes the JSON report document to a file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    pub path: PathBuf,
    pub top_n: usize,
}

impl RecordSink for JsonFileSink {
    fn consume(&mut self, report: &TriageReport) -> Result<()> {
        let file = create(&self.path)?;
        write_json(BufWriter::new(file), report, self.top_n)?;
        info!("Wrote JSON report to {}", self.path.display());
        Ok(())
    }
}

/// Writes flat record rows to `path` and the statistics table next to it
/// as `<stem>_statistics.csv`.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    pub path: PathBuf,
    pub top_n: usize,
}

impl CsvFileSink {
    pub fn statistics_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        self.path.with_file_name(format!("{stem}_statistics.csv"))
    }
}

impl RecordSink for CsvFileSink {
    fn consume(&mut self, report: &TriageReport) -> Result<()> {
        write_csv(create(&self.path)?, &report.records)?;
        let stats_path = self.statistics_path();
        write_statistics_csv(create(&stats_path)?, &report.statistics.snapshot(self.top_n))?;
        info!(
            "Wrote CSV report to {} and {}",
            self.path.display(),
            stats_path.display()
        );
        Ok(())
    }
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| TriageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json<W: Write>(writer: W, report: &TriageReport, top_n: usize) -> Result<()> {
    serde_json::to_writer_pretty(writer, &report.document(top_n))?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RecordsOnly {
    records: Vec<TriageRecord>,
}

/// Read back the artifact records of a JSON report.
pub fn read_artifacts_json<R: Read>(reader: R) -> Result<Vec<ArtifactRecord>> {
    let doc: RecordsOnly = serde_json::from_reader(reader)?;
    Ok(doc
        .records
        .into_iter()
        .filter_map(|r| match r {
            TriageRecord::Artifact(a) => Some(a),
            TriageRecord::Key(_) => None,
        })
        .collect())
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactRow {
    path: String,
    size: u64,
    created_time: CanonicalTime,
    modified_time: CanonicalTime,
    accessed_time: CanonicalTime,
    #[serde(rename = "type")]
    kind: String,
    anomaly_reason: Option<String>,
}

impl From<&ArtifactRecord> for ArtifactRow {
    fn from(r: &ArtifactRecord) -> Self {
        Self {
            path: r.path.clone(),
            size: r.size,
            created_time: r.created_time,
            modified_time: r.modified_time,
            accessed_time: r.accessed_time,
            kind: r.kind.to_string(),
            anomaly_reason: r.anomaly_reason.clone(),
        }
    }
}

impl From<ArtifactRow> for ArtifactRecord {
    fn from(row: ArtifactRow) -> Self {
        Self {
            path: row.path,
            size: row.size,
            created_time: row.created_time,
            modified_time: row.modified_time,
            accessed_time: row.accessed_time,
            kind: CompactString::new(row.kind),
            anomaly_reason: row.anomaly_reason.filter(|r| !r.is_empty()),
            findings: Vec::new(),
        }
    }
}

/// One registry value per row; keys without values get one blank row.
#[derive(Debug, Serialize)]
struct KeyRow<'a> {
    registry_file: &'a str,
    key_path: &'a str,
    key_depth: usize,
    last_write_time: CanonicalTime,
    number_of_values: usize,
    number_of_subkeys: usize,
    value_name: &'a str,
    value_data: &'a str,
    value_type: &'a str,
    operation: &'a str,
}

fn key_rows<'a>(key: &'a KeyRecord) -> Vec<KeyRow<'a>> {
    let base = |name: &'a str, data: &'a str, ty: &'a str, op: &'a str| KeyRow {
        registry_file: &key.registry_file,
        key_path: &key.key_path,
        key_depth: key.key_depth,
        last_write_time: key.last_write_time,
        number_of_values: key.number_of_values,
        number_of_subkeys: key.number_of_subkeys,
        value_name: name,
        value_data: data,
        value_type: ty,
        operation: op,
    };
    if key.values.is_empty() {
        return vec![base("", "", "", "")];
    }
    key.values
        .iter()
        .map(|v| base(&v.name, &v.value, &v.value_type, v.operation.label()))
        .collect()
}

/// Flat CSV of records: artifact rows, or registry rows one per value.
pub fn write_csv<W: Write>(writer: W, records: &[TriageRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        match record {
            TriageRecord::Artifact(a) => csv.serialize(ArtifactRow::from(a))?,
            TriageRecord::Key(k) => {
                for row in key_rows(k) {
                    csv.serialize(row)?;
                }
            }
        }
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// `category,value,count` table of a statistics snapshot.
pub fn write_statistics_csv<W: Write>(writer: W, snapshot: &StatisticsSnapshot) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["category", "value", "count"])?;
    for (category, value, count) in snapshot.rows() {
        csv.write_record([category, value.as_str(), count.to_string().as_str()])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read back artifact rows written by [`write_csv`].
pub fn read_artifact_csv<R: Read>(reader: R) -> Result<Vec<ArtifactRecord>> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for row in csv.deserialize::<ArtifactRow>() {
        out.push(row?.into());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Statistics;
    use crate::config::Domain;
    use crate::model::{OperationLabel, OperationSummary, ValueRecord};
    use crate::report::RunStatus;
    use std::time::Duration;

    fn artifact(path: &str, reason: Option<&str>) -> ArtifactRecord {
        ArtifactRecord {
            path: path.into(),
            size: 2048,
            created_time: CanonicalTime::from_epoch_seconds(1_600_000_000),
            modified_time: CanonicalTime::from_epoch_seconds(1_600_000_500),
            accessed_time: CanonicalTime::MISSING,
            kind: CompactString::new("File"),
            anomaly_reason: reason.map(str::to_string),
            findings: Vec::new(),
        }
    }

    fn report(records: Vec<TriageRecord>) -> TriageReport {
        let mut statistics = Statistics::new();
        records.iter().for_each(|r| statistics.observe(r));
        TriageReport {
            domain: Domain::Network,
            records,
            statistics,
            skipped: Vec::new(),
            status: RunStatus::Completed,
            duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn artifact_csv_reads_back() {
        let records = vec![
            artifact("/Users/x/a.exe", Some("Executable in non-standard location")).into(),
            artifact("/x/y.pcap", None).into(),
        ];
        let mut buf = Vec::new();
        write_csv(&mut buf, &records).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with(
            "path,size,created_time,modified_time,accessed_time,type,anomaly_reason\n"
        ));
        assert!(text.contains("N/A"));

        let back = read_artifact_csv(buf.as_slice()).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], artifact("/Users/x/a.exe", Some("Executable in non-standard location")));
        assert_eq!(back[1].anomaly_reason, None);
    }

    #[test]
    fn json_report_reads_back() {
        let rep = report(vec![artifact("/x/y.pcap", None).into()]);
        let mut buf = Vec::new();
        write_json(&mut buf, &rep, 10).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["domain"], "network");
        assert_eq!(value["status"]["state"], "completed");
        assert_eq!(value["statistics"]["records"], 1);

        let back = read_artifacts_json(buf.as_slice()).unwrap();
        assert_eq!(back, vec![artifact("/x/y.pcap", None)]);
    }

    #[test]
    fn registry_csv_has_one_row_per_value() {
        let key = KeyRecord {
            registry_file: "SYSTEM".into(),
            key_path: "ROOT\\Select".into(),
            key_depth: 1,
            last_write_time: CanonicalTime::MISSING,
            values: vec![
                ValueRecord {
                    name: "Current".into(),
                    value: "1".into(),
                    value_type: "INTEGER".into(),
                    operation: OperationLabel::Unknown,
                },
                ValueRecord {
                    name: "Default".into(),
                    value: "1".into(),
                    value_type: "INTEGER".into(),
                    operation: OperationLabel::Unknown,
                },
            ],
            number_of_values: 2,
            number_of_subkeys: 0,
            operation_summary: OperationSummary::default(),
        };
        let empty = KeyRecord {
            key_path: "ROOT".into(),
            key_depth: 0,
            values: Vec::new(),
            number_of_values: 0,
            ..key.clone()
        };
        let mut buf = Vec::new();
        write_csv(&mut buf, &[empty.into(), key.into()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "registry_file,key_path,key_depth,last_write_time,number_of_values,number_of_subkeys,value_name,value_data,value_type,operation"
        );
        assert_eq!(lines[1], "SYSTEM,ROOT,0,N/A,0,0,,,,");
        assert!(lines[3].ends_with("Default,1,INTEGER,UNKNOWN"));
    }

    #[test]
    fn statistics_csv_has_category_rows() {
        let rep = report(vec![artifact("/a", None).into()]);
        let mut buf = Vec::new();
        write_statistics_csv(&mut buf, &rep.statistics.snapshot(10)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("category,value,count\n"));
        assert!(text.contains("kind,File,1"));
        assert!(text.contains("key_depth,1,1"));
    }

    #[test]
    fn csv_sink_writes_statistics_next_to_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvFileSink {
            path: dir.path().join("network.csv"),
            top_n: 10,
        };
        sink.consume(&report(vec![artifact("/a.log", None).into()])).unwrap();
        assert!(dir.path().join("network.csv").exists());
        assert!(dir.path().join("network_statistics.csv").exists());
    }
}
