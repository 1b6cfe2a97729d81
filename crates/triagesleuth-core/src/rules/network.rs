/// Network-artifact rules.
///
/// Two stages: a membership filter decides whether a file is a network
/// artifact at all (non-members are excluded from output), then an ordered
/// rule list assigns at most one reason, first match wins.
use super::{required, Rule, RuleInput, RuleSet};
use crate::config::NetworkConfig;
use crate::model::{AnomalyFinding, ArtifactRecord};
use chrono::{DateTime, Utc};

/// Case-insensitive path-keyword / suffix membership test.
#[derive(Debug, Clone)]
pub struct MembershipFilter {
    path_keywords: Vec<String>,
    extensions: Vec<String>,
}

impl MembershipFilter {
    pub fn new(cfg: &NetworkConfig) -> Self {
        Self {
            path_keywords: cfg.path_keywords.iter().map(|k| k.to_lowercase()).collect(),
            extensions: cfg.extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        self.path_keywords.iter().any(|k| lower.contains(k.as_str()))
            || self.extensions.iter().any(|e| lower.ends_with(e.as_str()))
    }
}

/// Build the ordered rule list. Order matters: evaluation stops at the
/// first match.
pub fn network_rules(cfg: &NetworkConfig) -> RuleSet {
    let mut rules = RuleSet::new();

    rules.push(Rule::new("net.hidden", "Hidden file/directory", |input| {
        Ok(input.path_lower.contains("/.") || input.file_name_lower().starts_with('.'))
    }));

    rules.push(Rule::new(
        "net.exe-location",
        "Executable in non-standard location",
        |input| {
            let p = &input.path_lower;
            Ok(p.contains(".exe") && !p.contains("/windows/system32"))
        },
    ));

    rules.push(Rule::new("net.future-created", "Future creation timestamp", |input| {
        Ok(required(input.record.created_time, "created")? > input.now)
    }));

    rules.push(Rule::new(
        "net.modified-before-created",
        "Modified before creation",
        |input| {
            let created = required(input.record.created_time, "created")?;
            let modified = required(input.record.modified_time, "modified")?;
            Ok(modified < created)
        },
    ));

    rules.push(Rule::new(
        "net.system-in-temp",
        "System file in temporary location",
        |input| {
            let p = &input.path_lower;
            Ok(p.contains("system32") && p.contains("/temp/"))
        },
    ));

    let large = cfg.large_browser_bytes;
    rules.push(Rule::new(
        "net.large-browser-data",
        "Unusually large browser data",
        move |input| Ok(input.path_lower.contains("chrome") && input.record.size > large),
    ));

    let small = cfg.small_firewall_bytes;
    rules.push(Rule::new(
        "net.small-firewall-log",
        "Suspiciously small firewall log",
        move |input| Ok(input.path_lower.contains("firewall") && input.record.size < small),
    ));

    let ports = cfg.suspicious_ports.clone();
    rules.push(Rule::new(
        "net.suspicious-port",
        "Reference to suspicious port",
        move |input| Ok(ports.iter().any(|port| input.path_lower.contains(port.as_str()))),
    ));

    rules.push(Rule::new("net.hosts-modified", "Modified hosts file", |input| {
        if !input.path_lower.contains("hosts") {
            return Ok(false);
        }
        let modified = required(input.record.modified_time, "modified")?;
        let accessed = required(input.record.accessed_time, "accessed")?;
        Ok(modified > accessed)
    }));

    let tools: Vec<String> = cfg.network_tools.iter().map(|t| t.to_lowercase()).collect();
    rules.push(Rule::new(
        "net.tool-in-user-space",
        "Network tool in user space",
        move |input| {
            let p = &input.path_lower;
            Ok(p.contains("/desktop/") && tools.iter().any(|t| p.contains(t.as_str())))
        },
    ));

    rules
}

/// Membership filter and rule list, built once per run.
pub struct NetworkRules {
    filter: MembershipFilter,
    rules: RuleSet,
}

impl NetworkRules {
    pub fn from_config(cfg: &NetworkConfig) -> Self {
        Self {
            filter: MembershipFilter::new(cfg),
            rules: network_rules(cfg),
        }
    }

    #[inline]
    pub fn is_member(&self, path: &str) -> bool {
        self.filter.matches(path)
    }

    /// First matching finding, if any.
    pub fn classify(&self, record: &ArtifactRecord, now: DateTime<Utc>) -> Option<AnomalyFinding> {
        self.rules.first_match(&RuleInput::new(record, now))
    }

    /// Classify and store the reason on the record.
    pub fn assess(&self, record: &mut ArtifactRecord, now: DateTime<Utc>) {
        if let Some(finding) = self.classify(record, now) {
            record.anomaly_reason = Some(finding.reason.clone());
            record.findings = vec![finding];
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}
