/// Network-artifact domain. Only files that pass the membership filter are
/// emitted; directories are walked but never emitted.
use super::{Analyzer, PathStyle, Visit};
use crate::config::{Domain, NetworkConfig};
use crate::error::NodeError;
use crate::model::{NodeKind, TriageRecord};
use crate::rules::network::NetworkRules;
use chrono::{DateTime, Utc};

pub struct NetworkAnalyzer {
    rules: NetworkRules,
    now: DateTime<Utc>,
}

impl NetworkAnalyzer {
    pub fn new(cfg: &NetworkConfig, now: DateTime<Utc>) -> Self {
        Self {
            rules: NetworkRules::from_config(cfg),
            now,
        }
    }
}

impl Analyzer for NetworkAnalyzer {
    fn domain(&self) -> Domain {
        Domain::Network
    }

    fn path_style(&self) -> PathStyle {
        PathStyle::Slash
    }

    fn analyze(&self, visit: &Visit<'_>) -> Result<Option<TriageRecord>, NodeError> {
        if visit.kind != NodeKind::File || !self.rules.is_member(visit.path) {
            return Ok(None);
        }
        let mut record = visit.artifact("File");
        self.rules.assess(&mut record, self.now);
        Ok(Some(record.into()))
    }
}
