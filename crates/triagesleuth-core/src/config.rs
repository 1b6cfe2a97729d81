/// Configuration: TOML file, then `TRIAGE_*` environment overrides, then
/// validation.
use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable selecting the configuration file.
pub const CONFIG_ENV: &str = "TRIAGE_CONFIG";

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "triagesleuth.toml";

/// Analysis domain of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[default]
    Generic,
    Log,
    Network,
    Registry,
}

impl Domain {
    pub fn label(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Log => "log",
            Self::Network => "network",
            Self::Registry => "registry",
        }
    }
}

impl FromStr for Domain {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "file" | "files" => Ok(Self::Generic),
            "log" | "logs" => Ok(Self::Log),
            "network" => Ok(Self::Network),
            "registry" => Ok(Self::Registry),
            other => Err(TriageError::config(format!("unknown domain {other:?}"))),
        }
    }
}

/// Full configuration model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TriageConfig {
    pub run: RunConfig,
    pub log: LogConfig,
    pub network: NetworkConfig,
    pub registry: RegistryConfig,
    pub report: ReportConfig,
}

/// What to traverse and how far.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    pub domain: Domain,
    /// Directory (filesystem domains) or tree dump (registry domain).
    pub root: PathBuf,
    /// `registry_file` label. Defaults to the root's file name.
    pub hive_name: Option<String>,
    /// Stop after this many records. 0 = unlimited.
    pub max_records: usize,
    pub max_depth: usize,
    /// Traverse the root's child subtrees concurrently.
    pub parallel: bool,
    /// Worker threads for parallel runs. 0 = one per CPU.
    pub parallelism: usize,
    /// Report destination: CSV for a `.csv` path, JSON otherwise. `None` =
    /// no report file.
    pub output: Option<PathBuf>,
}

/// Log-content rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Lowercase suffixes of files whose content is assessed. Empty = all files.
    pub extensions: Vec<String>,
    /// Matched verbatim (case-sensitive) against content.
    pub keywords: Vec<String>,
    pub min_year: i32,
    pub read_chunk_bytes: usize,
    pub max_content_bytes: u64,
}

/// Network-artifact membership filter and rule thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network-relevant locations, matched case-insensitively as substrings.
    pub path_keywords: Vec<String>,
    /// Network-relevant suffixes, matched case-insensitively.
    pub extensions: Vec<String>,
    pub suspicious_ports: Vec<String>,
    pub network_tools: Vec<String>,
    pub large_browser_bytes: u64,
    pub small_firewall_bytes: u64,
}

/// Registry operation classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Keys written within this window are classified `MODIFY`.
    pub recent_window_hours: u64,
    /// Report run-wide running totals in `operation_summary` instead of
    /// per-key counts.
    pub cumulative_operation_summary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Entries kept in the most-frequent-paths table.
    pub top_n: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            domain: Domain::Generic,
            root: PathBuf::from("."),
            hive_name: None,
            max_records: 0,
            max_depth: 4_096,
            parallel: false,
            parallelism: 0,
            output: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            extensions: strings(&[".log", ".evtx", ".txt"]),
            keywords: strings(&[
                "ERROR",
                "CRITICAL",
                "FAILURE",
                "WARNING",
                "ALERT",
                "EXCEPTION",
            ]),
            min_year: 2000,
            read_chunk_bytes: 1024 * 1024,
            max_content_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            path_keywords: strings(&[
                "/AppData/Local/Google/Chrome/User Data",
                "/AppData/Local/Mozilla/Firefox/Profiles",
                "/AppData/Local/Microsoft/Windows/INetCache",
                "/Windows/System32/winevt/Logs/Microsoft-Windows-NetworkProfile",
                "/Windows/System32/drivers/etc/hosts",
                "/Windows/System32/LogFiles/W3SVC",
                "/Windows/System32/netstat",
                "/Windows/System32/drivers/tcpip",
                "/Windows/System32/LogFiles/Firewall",
                "/inetpub/logs",
                "/AppData/Local/Microsoft/Outlook",
            ]),
            extensions: strings(&[
                ".pcap", ".pcapng", ".evt", ".evtx", ".log", ".sqlite", ".db", ".dat", ".etl",
                ".pf", ".hosts", ".dnscache", ".history", ".eml",
            ]),
            suspicious_ports: strings(&["4444", "31337", "1337", "666", "6666", "8080"]),
            network_tools: strings(&["netcat", "wireshark", "tcpdump"]),
            large_browser_bytes: 500_000_000,
            small_firewall_bytes: 1_024,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            recent_window_hours: 24,
            cumulative_operation_summary: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl TriageConfig {
    /// Resolve the configuration path: explicit argument, then
    /// `TRIAGE_CONFIG`, then `triagesleuth.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
    }

    /// Load config, apply environment overrides and validate.
    ///
    /// A missing file is only an error when the path was given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path.is_some() || env::var_os(CONFIG_ENV).is_some();
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| TriageError::Io {
                path: path_buf.clone(),
                source,
            })?;
            Self::from_toml(&raw)?
        } else if explicit {
            return Err(TriageError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_value("TRIAGE_DOMAIN") {
            self.run.domain = v.parse()?;
        }
        if let Some(v) = env_value("TRIAGE_ROOT") {
            self.run.root = PathBuf::from(v);
        }
        if let Some(v) = env_value("TRIAGE_OUTPUT") {
            self.run.output = Some(PathBuf::from(v));
        }
        set_env_parsed("TRIAGE_MAX_RECORDS", &mut self.run.max_records)?;
        set_env_parsed("TRIAGE_MAX_DEPTH", &mut self.run.max_depth)?;
        set_env_parsed("TRIAGE_PARALLEL", &mut self.run.parallel)?;
        set_env_parsed("TRIAGE_TOP_N", &mut self.report.top_n)?;
        Ok(())
    }

    /// Lowercase suffix lists so membership tests are case-insensitive.
    fn normalize(&mut self) {
        for ext in self
            .log
            .extensions
            .iter_mut()
            .chain(self.network.extensions.iter_mut())
        {
            *ext = ext.to_ascii_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.run.max_depth == 0 {
            return Err(TriageError::config("run.max_depth must be at least 1"));
        }
        if self.log.read_chunk_bytes == 0 {
            return Err(TriageError::config("log.read_chunk_bytes must be non-zero"));
        }
        if self.registry.recent_window_hours == 0 {
            return Err(TriageError::config(
                "registry.recent_window_hours must be non-zero",
            ));
        }
        if self.report.top_n == 0 {
            return Err(TriageError::config("report.top_n must be non-zero"));
        }
        Ok(())
    }

    /// Worker count for parallel runs.
    pub fn effective_parallelism(&self) -> usize {
        if self.run.parallelism == 0 {
            num_cpus::get().max(1)
        } else {
            self.run.parallelism
        }
    }

    /// `registry_file` label for registry records.
    pub fn hive_name(&self) -> String {
        self.run.hive_name.clone().unwrap_or_else(|| {
            self.run
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.run.root.to_string_lossy().into_owned())
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn set_env_parsed<T: FromStr>(name: &str, slot: &mut T) -> Result<()> {
    if let Some(raw) = env_value(name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| TriageError::config(format!("{name}={raw:?} is not valid")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = TriageConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.network.path_keywords.len(), 11);
        assert_eq!(cfg.network.extensions.len(), 14);
        assert_eq!(cfg.log.keywords.len(), 6);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = TriageConfig::from_toml(
            r#"
            [run]
            domain = "registry"
            root = "/cases/7/SYSTEM.json"

            [registry]
            cumulative_operation_summary = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.run.domain, Domain::Registry);
        assert!(cfg.registry.cumulative_operation_summary);
        assert_eq!(cfg.registry.recent_window_hours, 24);
        assert_eq!(cfg.run.max_depth, 4_096);
        assert_eq!(cfg.hive_name(), "SYSTEM.json");
    }

    #[test]
    fn explicit_hive_name_wins() {
        let mut cfg = TriageConfig::default();
        cfg.run.hive_name = Some("NTUSER.DAT".into());
        assert_eq!(cfg.hive_name(), "NTUSER.DAT");
    }

    #[test]
    fn unknown_domain_is_rejected() {
        assert!(TriageConfig::from_toml("[run]\ndomain = \"memory\"").is_err());
        assert!("memory".parse::<Domain>().is_err());
        assert_eq!("LOGS".parse::<Domain>().unwrap(), Domain::Log);
    }

    #[test]
    fn zero_depth_is_invalid() {
        let mut cfg = TriageConfig::default();
        cfg.run.max_depth = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = TriageConfig::load(Some(Path::new("/nonexistent/triage.toml")));
        assert!(matches!(err, Err(TriageError::MissingConfig { .. })));
    }

    #[test]
    fn suffixes_are_lowercased() {
        let mut cfg = TriageConfig::from_toml("[log]\nextensions = [\".LOG\"]").unwrap();
        cfg.normalize();
        assert_eq!(cfg.log.extensions, vec![".log".to_string()]);
    }
}
