/// Generic-file domain: every node with metadata becomes a File or
/// Directory record.
///
/// No anomaly rules ship by default. Extra rules can be attached with
/// [`GenericAnalyzer::with_rules`]; all matches are recorded and
/// their reasons joined with `; `.
use super::{Analyzer, PathStyle, Visit};
use crate::config::Domain;
use crate::error::NodeError;
use crate::model::{NodeKind, TriageRecord};
use crate::rules::{RuleInput, RuleSet};
use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct GenericAnalyzer {
    rules: RuleSet,
    now: Option<DateTime<Utc>>,
}

impl GenericAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: RuleSet, now: DateTime<Utc>) -> Self {
        Self {
            rules,
            now: Some(now),
        }
    }
}

impl Analyzer for GenericAnalyzer {
    fn domain(&self) -> Domain {
        Domain::Generic
    }

    fn path_style(&self) -> PathStyle {
        PathStyle::Slash
    }

    fn analyze(&self, visit: &Visit<'_>) -> Result<Option<TriageRecord>, NodeError> {
        let label = match visit.kind {
            NodeKind::File => "File",
            NodeKind::Directory | NodeKind::Key => "Directory",
        };
        let mut record = visit.artifact(label);

        if !self.rules.is_empty() {
            let now = self.now.unwrap_or_else(Utc::now);
            let findings = self.rules.all_matches(&RuleInput::new(&record, now));
            if !findings.is_empty() {
                let reasons: Vec<&str> = findings.iter().map(|f| f.reason.as_str()).collect();
                record.anomaly_reason = Some(reasons.join("; "));
            }
            record.findings = findings;
        }
        Ok(Some(record.into()))
    }
}
