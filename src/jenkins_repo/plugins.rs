// Plugin listing and installation.
// Installation only POSTs the request; Jenkins does not report whether the
// plugin exists or installed cleanly. The update center says whether a
// restart is needed afterwards.

use std::cmp::Ordering;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::wire::UpdateCenterJson;
use super::{JenkinsRepo, SERVICE};
use crate::error::Result;
use crate::http::{check_status, transport_error};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPlugin {
    pub short_name: String,
    pub version: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub has_update: bool,
}

#[derive(Debug, Deserialize)]
struct PluginManagerJson {
    #[serde(default)]
    plugins: Vec<InstalledPlugin>,
}

/// One entry of the requested plugin list, e.g. `{"name": "docker-plugin", "version": "1.2.3"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRequest {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginAction {
    Install,
    UpToDate,
    NewerInstalled { installed: String },
    NeedsUpdate { installed: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallSummary {
    pub installed: Vec<String>,
    pub up_to_date: Vec<String>,
    pub newer_installed: Vec<String>,
    pub needs_update: Vec<String>,
    pub restart_required: bool,
}

pub fn parse_plugin_list(json: &str) -> anyhow::Result<Vec<PluginRequest>> {
    serde_json::from_str(json).context("failed to decode plugin list as JSON")
}

/// Compares dotted versions part by part: numerically when both parts are
/// numbers, lexically otherwise. A version that is a prefix of another is older.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let split = |v: &str| -> Vec<String> {
        v.trim()
            .trim_start_matches('v')
            .split(['.', '-', '_'])
            .map(str::to_string)
            .collect()
    };
    let (pa, pb) = (split(a), split(b));
    for (x, y) in pa.iter().zip(pb.iter()) {
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny),
            _ => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    pa.len().cmp(&pb.len())
}

/// Decides, per requested plugin, what to do given what is installed.
pub fn plan_install(
    requested: &[PluginRequest],
    installed: &[InstalledPlugin],
) -> Vec<(PluginRequest, PluginAction)> {
    requested
        .iter()
        .map(|r| {
            let action = match installed.iter().find(|p| p.short_name == r.name) {
                None => PluginAction::Install,
                Some(p) => match compare_versions(&p.version, &r.version) {
                    Ordering::Equal => PluginAction::UpToDate,
                    Ordering::Greater => PluginAction::NewerInstalled {
                        installed: p.version.clone(),
                    },
                    Ordering::Less => PluginAction::NeedsUpdate {
                        installed: p.version.clone(),
                    },
                },
            };
            (r.clone(), action)
        })
        .collect()
}

impl JenkinsRepo {
    #[instrument(skip(self), fields(repo = "jenkins", operation = "list_plugins"))]
    pub async fn list_plugins(&self) -> Result<Vec<InstalledPlugin>> {
        let mut url = self.url(&["pluginManager", "api", "json"])?;
        url.query_pairs_mut().append_pair("depth", "1");
        let manager: PluginManagerJson = self.get_json(url, "plugin manager").await?;
        Ok(manager.plugins)
    }

    #[instrument(skip(self), fields(repo = "jenkins", operation = "install_plugin"))]
    pub async fn install_plugin(&self, name: &str, version: &str) -> Result<()> {
        let url = self.url(&["pluginManager", "installNecessaryPlugins"])?;
        let body = format!(
            "<jenkins><install plugin=\"{}@{}\" /></jenkins>",
            xml_escape(name),
            xml_escape(version)
        );
        let resp = self
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        check_status(SERVICE, "plugin", resp).await?;
        Ok(())
    }

    pub async fn restart_required(&self) -> Result<bool> {
        let url = self.url(&["updateCenter", "api", "json"])?;
        let uc: UpdateCenterJson = self.get_json(url, "update center").await?;
        Ok(uc.restart_required_for_completion)
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Installs every requested plugin that is missing. Outdated plugins are
/// reported, not upgraded.
pub async fn install_plugins(
    repo: &JenkinsRepo,
    plugin_list_json: &str,
) -> anyhow::Result<InstallSummary> {
    let requested = parse_plugin_list(plugin_list_json)?;
    let installed = repo
        .list_plugins()
        .await
        .context("failed to retrieve installed plugins from target jenkins server")?;

    let mut summary = InstallSummary::default();
    for (req, action) in plan_install(&requested, &installed) {
        match action {
            PluginAction::UpToDate => {
                info!("{} is already at version: {}", req.name, req.version);
                summary.up_to_date.push(req.name);
            }
            PluginAction::NewerInstalled { installed } => {
                info!(
                    "more recent version of {} is installed: installed: {}, requested: {}",
                    req.name, installed, req.version
                );
                summary.newer_installed.push(req.name);
            }
            PluginAction::NeedsUpdate { installed } => {
                info!("{} needs updating: {}", req.name, installed);
                summary.needs_update.push(req.name);
            }
            PluginAction::Install => {
                info!("installing {}:{}", req.name, req.version);
                repo.install_plugin(&req.name, &req.version)
                    .await
                    .with_context(|| {
                        format!("failed to install plugin {}:{}", req.name, req.version)
                    })?;
                summary.installed.push(req.name);
            }
        }
    }

    summary.restart_required = repo
        .restart_required()
        .await
        .context("failed to retrieve update center info")?;
    if summary.restart_required {
        info!("Restart jenkins to finish installing plugins");
    }
    Ok(summary)
}
