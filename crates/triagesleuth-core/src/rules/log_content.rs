/// Log-content rules.
///
/// Every sub-condition is evaluated, but the verdict is coarse: a record is
/// either `Anomaly detected` or `No anomalies detected`. The itemized
/// sub-findings are only used for debug logging.
use super::{Rule, RuleInput, RuleSet};
use crate::config::LogConfig;
use crate::model::timestamp::FORMAT;
use crate::model::{AnomalyFinding, ArtifactRecord};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub const ANOMALY_DETECTED: &str = "Anomaly detected";
pub const NO_ANOMALIES: &str = "No anomalies detected";

/// Rule id carried by the single collapsed finding.
pub const LOG_ANOMALY_RULE: &str = "log.anomaly";

static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("timestamp pattern is valid")
});

/// Decoded leaf content plus the timestamps found in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedContent {
    pub text: String,
    pub timestamps: Vec<String>,
    /// The read stopped early (fault or size cap).
    pub partial: bool,
}

impl ScannedContent {
    pub fn scan(text: String) -> Self {
        let timestamps = extract_timestamps(&text)
            .into_iter()
            .map(str::to_owned)
            .collect();
        Self {
            text,
            timestamps,
            partial: false,
        }
    }

    #[must_use]
    pub fn partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }
}

/// All substrings matching the fixed timestamp pattern, in order.
pub fn extract_timestamps(content: &str) -> Vec<&str> {
    TIMESTAMP_PATTERN
        .find_iter(content)
        .map(|m| m.as_str())
        .collect()
}

/// Whether `ts` parses and falls within `[min_year, now.year()]`.
fn timestamp_in_range(ts: &str, min_year: i32, now: DateTime<Utc>) -> bool {
    match NaiveDateTime::parse_from_str(ts, FORMAT) {
        Ok(parsed) => (min_year..=now.year()).contains(&parsed.year()),
        Err(_) => false,
    }
}

pub struct LogRules {
    rules: RuleSet,
    extensions: Vec<String>,
}

impl LogRules {
    pub fn from_config(cfg: &LogConfig) -> Self {
        let mut rules = RuleSet::new();
        rules.push(Rule::new(
            "log.no-timestamps",
            "No timestamps found in log content",
            |input| Ok(input.content()?.timestamps.is_empty()),
        ));
        for keyword in &cfg.keywords {
            let needle = keyword.clone();
            rules.push(Rule::new(
                "log.keyword",
                format!("Keyword '{keyword}' found in log content"),
                move |input| Ok(input.content()?.text.contains(needle.as_str())),
            ));
        }
        let min_year = cfg.min_year;
        rules.push(Rule::new(
            "log.timestamp-range",
            format!("Timestamp unparseable or outside {min_year}..current year"),
            move |input| {
                let content = input.content()?;
                Ok(content
                    .timestamps
                    .iter()
                    .any(|ts| !timestamp_in_range(ts, min_year, input.now)))
            },
        ));

        Self {
            rules,
            extensions: cfg.extensions.clone(),
        }
    }

    /// Whether a file's content should be read and assessed. An empty
    /// extension list selects every file.
    pub fn wants_content(&self, file_name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let lower = file_name.to_ascii_lowercase();
        self.extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }

    /// Evaluate every sub-rule against the content and return the itemized
    /// matches.
    pub fn evaluate(
        &self,
        record: &ArtifactRecord,
        content: &ScannedContent,
        now: DateTime<Utc>,
    ) -> Vec<AnomalyFinding> {
        let input = RuleInput::new(record, now).with_content(content);
        self.rules.all_matches(&input)
    }

    /// Collapse the sub-findings into the single coarse verdict stored on
    /// the record.
    pub fn assess(
        &self,
        record: &mut ArtifactRecord,
        content: &ScannedContent,
        now: DateTime<Utc>,
    ) {
        let matches = self.evaluate(record, content, now);
        if matches.is_empty() {
            record.anomaly_reason = Some(NO_ANOMALIES.to_string());
            record.findings.clear();
        } else {
            debug!(
                path = %record.path,
                rules = ?matches.iter().map(|f| f.rule_id.as_str()).collect::<Vec<_>>(),
                "log anomaly"
            );
            record.anomaly_reason = Some(ANOMALY_DETECTED.to_string());
            record.findings = vec![AnomalyFinding::new(LOG_ANOMALY_RULE, ANOMALY_DETECTED)];
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

/// Type label of a log-domain file: its extension including the dot, as
/// written, or `No Extension`.
pub fn extension_label(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name[idx..].to_string(),
        _ => "No Extension".to_string(),
    }
}
