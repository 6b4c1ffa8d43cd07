use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::correlation::aggregation::DEFAULT_METRICS;
use crate::correlation::host::HostSource;
use crate::correlation::rollup::MAX_DATA_POINTS;
use crate::correlation::snapshot::SnapshotSelection;
use crate::models::WindowKind;

const DEFAULT_CONFIG_FILE: &str = "buildscope.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ci: CiConfig,
    pub monitoring: MonitoringConfig,
    pub correlation: CorrelationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CiConfig {
    pub url: String,
    pub user: String,
    pub api_token: String,
    pub timeout_secs: u64,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: String::new(),
            api_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub tenant: String,
    pub unit: String,
    pub api_key: String,
    /// Overrides the `https://<tenant>-<unit>.instana.io` endpoint.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            tenant: String::new(),
            unit: String::new(),
            api_key: String::new(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MonitoringConfig {
    pub fn endpoint(&self) -> String {
        match &self.base_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("https://{}-{}.instana.io", self.tenant, self.unit),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Per-metric result ceiling of the metrics API.
    pub max_data_points: u64,
    pub metrics: Vec<String>,
    pub window: WindowKind,
    pub snapshot_selection: SnapshotSelection,
    pub host_source: HostSource,
    pub host_match_case_sensitive: bool,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            max_data_points: MAX_DATA_POINTS,
            metrics: DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
            window: WindowKind::default(),
            snapshot_selection: SnapshotSelection::default(),
            host_source: HostSource::default(),
            host_match_case_sensitive: true,
        }
    }
}

/// Values given on the command line; `Some` wins over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ci_url: Option<String>,
    pub ci_user: Option<String>,
    pub ci_api_token: Option<String>,
    pub tenant: Option<String>,
    pub unit: Option<String>,
}

impl AppConfig {
    /// Loads `path`, or `$CONFIG_FILE`, or `buildscope.toml` when present,
    /// then applies environment overrides. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_file(p)?,
            None => {
                let p = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
                if Path::new(&p).exists() {
                    Self::load_file(Path::new(&p))?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|k| std::env::var(k).ok());
        Ok(config)
    }

    fn load_file(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::load_from_str(&s).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parse config from a string (e.g. for tests). Required credentials are
    /// checked later by `validate_ci` / `validate_monitoring`, once overrides
    /// have been applied.
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate_correlation()?;
        Ok(config)
    }

    /// `INSTANA_API_KEY` and `JENKINS_API_TOKEN` fill the secrets when set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("INSTANA_API_KEY").filter(|v| !v.is_empty()) {
            self.monitoring.api_key = key;
        }
        if let Some(token) = lookup("JENKINS_API_TOKEN").filter(|v| !v.is_empty()) {
            self.ci.api_token = token;
        }
    }

    pub fn apply_overrides(&mut self, o: &ConfigOverrides) {
        if let Some(v) = &o.ci_url {
            self.ci.url = v.clone();
        }
        if let Some(v) = &o.ci_user {
            self.ci.user = v.clone();
        }
        if let Some(v) = &o.ci_api_token {
            self.ci.api_token = v.clone();
        }
        if let Some(v) = &o.tenant {
            self.monitoring.tenant = v.clone();
        }
        if let Some(v) = &o.unit {
            self.monitoring.unit = v.clone();
        }
    }

    pub fn validate_ci(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.ci.url.trim().is_empty(),
            "Required parameter not specified: ci.url"
        );
        anyhow::ensure!(
            !self.ci.user.trim().is_empty(),
            "Required parameter not specified: ci.user"
        );
        anyhow::ensure!(
            !self.ci.api_token.trim().is_empty(),
            "Required parameter not specified: ci.api_token"
        );
        anyhow::ensure!(
            self.ci.timeout_secs > 0,
            "ci.timeout_secs must be > 0, got {}",
            self.ci.timeout_secs
        );
        Ok(())
    }

    pub fn validate_monitoring(&self) -> anyhow::Result<()> {
        let has_base_url = self.monitoring.base_url.as_deref().is_some_and(|u| !u.is_empty());
        if !has_base_url {
            anyhow::ensure!(
                !self.monitoring.tenant.trim().is_empty(),
                "Required parameter not specified: monitoring.tenant"
            );
            anyhow::ensure!(
                !self.monitoring.unit.trim().is_empty(),
                "Required parameter not specified: monitoring.unit"
            );
        }
        anyhow::ensure!(
            !self.monitoring.api_key.trim().is_empty(),
            "Required parameter not specified: monitoring.api_key (or INSTANA_API_KEY)"
        );
        anyhow::ensure!(
            self.monitoring.timeout_secs > 0,
            "monitoring.timeout_secs must be > 0, got {}",
            self.monitoring.timeout_secs
        );
        Ok(())
    }

    fn validate_correlation(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.correlation.max_data_points > 0,
            "correlation.max_data_points must be > 0, got {}",
            self.correlation.max_data_points
        );
        anyhow::ensure!(
            !self.correlation.metrics.is_empty(),
            "correlation.metrics must be non-empty"
        );
        anyhow::ensure!(
            self.correlation.metrics.iter().all(|m| !m.trim().is_empty()),
            "correlation.metrics must not contain empty names"
        );
        Ok(())
    }
}
