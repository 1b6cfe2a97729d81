/// Rule engine: ordered, extensible predicate lists per domain.
///
/// A rule maps a normalized record (plus optional leaf content) to zero or
/// one [`AnomalyFinding`]. A predicate that fails on malformed input is a
/// non-match for that predicate only; evaluation carries on with the next
/// rule, so one bad rule never aborts the record.
///
/// - [`log_content`] — timestamp/keyword assessment of log text.
/// - [`network`] — membership filter plus first-match-wins path/size/time rules.
/// - [`registry`] — operation classification of key/value pairs.
pub mod log_content;
pub mod network;
pub mod registry;

use crate::model::{AnomalyFinding, ArtifactRecord, CanonicalTime};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use log_content::ScannedContent;
use thiserror::Error;
use tracing::debug;

/// Why a predicate could not be evaluated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("{field} timestamp is missing")]
    MissingTimestamp { field: &'static str },

    #[error("rule needs leaf content but none was read")]
    MissingContent,

    #[error("malformed input: {details}")]
    Malformed { details: String },
}

/// Everything a predicate may look at.
pub struct RuleInput<'a> {
    pub record: &'a ArtifactRecord,
    /// Lowercased path, computed once per record.
    pub path_lower: String,
    pub content: Option<&'a ScannedContent>,
    /// Evaluation instant; fixed per run so results are reproducible.
    pub now: DateTime<Utc>,
}

impl<'a> RuleInput<'a> {
    pub fn new(record: &'a ArtifactRecord, now: DateTime<Utc>) -> Self {
        Self {
            record,
            path_lower: record.path.to_lowercase(),
            content: None,
            now,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: &'a ScannedContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Final path component, lowercased.
    pub fn file_name_lower(&self) -> &str {
        self.path_lower
            .rsplit(ArtifactRecord::SEPARATOR)
            .next()
            .unwrap_or(&self.path_lower)
    }

    pub fn content(&self) -> Result<&'a ScannedContent, RuleError> {
        self.content.ok_or(RuleError::MissingContent)
    }
}

/// Unwrap a timestamp a predicate depends on.
pub fn required(time: CanonicalTime, field: &'static str) -> Result<DateTime<Utc>, RuleError> {
    time.get().ok_or(RuleError::MissingTimestamp { field })
}

type Predicate = Box<dyn Fn(&RuleInput<'_>) -> Result<bool, RuleError> + Send + Sync>;

/// A single predicate with the reason reported when it matches.
pub struct Rule {
    id: CompactString,
    reason: String,
    predicate: Predicate,
}

impl Rule {
    pub fn new<F>(id: &str, reason: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        Self {
            id: CompactString::new(id),
            reason: reason.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Evaluate, treating a predicate error as "no match".
    pub fn evaluate(&self, input: &RuleInput<'_>) -> Option<AnomalyFinding> {
        match (self.predicate)(input) {
            Ok(true) => Some(AnomalyFinding {
                rule_id: self.id.clone(),
                reason: self.reason.clone(),
            }),
            Ok(false) => None,
            Err(err) => {
                debug!(rule = %self.id, path = %input.record.path, "rule skipped: {err}");
                None
            }
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// An ordered list of rules.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; evaluation order is insertion order.
    pub fn push(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// First matching rule wins; later rules are not evaluated.
    pub fn first_match(&self, input: &RuleInput<'_>) -> Option<AnomalyFinding> {
        self.rules.iter().find_map(|rule| rule.evaluate(input))
    }

    /// Every rule is evaluated; all matches are returned in rule order.
    pub fn all_matches(&self, input: &RuleInput<'_>) -> Vec<AnomalyFinding> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(input))
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(Rule::id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{ArtifactRecord, CanonicalTime};
    use chrono::{DateTime, TimeZone, Utc};
    use compact_str::CompactString;

    /// Fixed evaluation instant used across rule tests.
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    pub fn ts(y: i32, m: u32, d: u32) -> CanonicalTime {
        CanonicalTime::from_datetime(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    pub fn file(path: &str, size: u64) -> ArtifactRecord {
        ArtifactRecord {
            path: path.to_string(),
            size,
            created_time: ts(2024, 1, 1),
            modified_time: ts(2024, 2, 1),
            accessed_time: ts(2024, 3, 1),
            kind: CompactString::new("File"),
            anomaly_reason: None,
            findings: Vec::new(),
        }
    }
}
