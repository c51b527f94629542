// src/config.rs
//! Houndfile loading. The aggregation engine never reads this itself; the
//! binary resolves it into an activation set and a [`DispatchCfg`].

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::dispatch::{DispatchCfg, DEFAULT_OVERALL_TIMEOUT_SECS, DEFAULT_SOURCE_TIMEOUT_SECS};

pub const ENV_CONFIG_PATH: &str = "HOUND_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = ".houndfile";
pub const ENV_GITLAB_TOKEN: &str = "GITLAB_TOKEN";

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}
fn default_source_timeout() -> u64 {
    DEFAULT_SOURCE_TIMEOUT_SECS
}
fn default_overall_timeout() -> u64 {
    DEFAULT_OVERALL_TIMEOUT_SECS
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoundConfig {
    #[serde(default)]
    pub github: GithubCfg,
    #[serde(default)]
    pub gitlab: GitlabCfg,
    #[serde(default)]
    pub jira: JiraCfg,
    #[serde(default)]
    pub engine: EngineCfg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubCfg {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub user: String,
    #[serde(default = "default_github_api")]
    pub api_url: String,
}

impl Default for GithubCfg {
    fn default() -> Self {
        Self {
            active: false,
            user: String::new(),
            api_url: default_github_api(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlabCfg {
    pub active: bool,
    pub base_url: String,
    /// e.g. "/api/v4"
    pub api_path: String,
    /// Path of the repository Atom feed, e.g. "/group/project.atom"
    pub repo_feed_path: String,
    /// Private token; "ENV" means: read from GITLAB_TOKEN
    pub token: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraCfg {
    pub active: bool,
    pub base_url: String,
    /// e.g. "/rest/api/2"
    pub api_path: String,
    /// e.g. "/activity"
    pub activity_path: String,
    /// Assignee for the issues listing.
    pub user: String,
    /// User whose activity stream is shown; falls back to `user` when empty.
    pub activity_user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCfg {
    #[serde(default = "default_source_timeout")]
    pub source_timeout_secs: u64,
    #[serde(default = "default_overall_timeout")]
    pub overall_timeout_secs: u64,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            source_timeout_secs: default_source_timeout(),
            overall_timeout_secs: default_overall_timeout(),
        }
    }
}

impl EngineCfg {
    pub fn dispatch_cfg(&self) -> DispatchCfg {
        DispatchCfg {
            source_timeout: Duration::from_secs(self.source_timeout_secs.max(1)),
            overall_timeout: Duration::from_secs(self.overall_timeout_secs.max(1)),
        }
    }
}

/// Command-line replacements for per-run user names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub github_user: Option<String>,
    pub jira_user: Option<String>,
    pub jira_feed_user: Option<String>,
}

impl HoundConfig {
    /// Parse a houndfile body (TOML) and resolve secrets. Validation waits
    /// until command-line overrides are applied.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: HoundConfig = toml::from_str(s).context("parsing houndfile")?;
        cfg.resolve_secrets()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("loading {}", path.display()))
    }

    /// Load from the resolved path; a missing file asks the user to run setup.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = resolve_path(explicit);
        if !path.exists() {
            bail!(
                "config file {} doesn't exist, please run `hound setup`",
                path.display()
            );
        }
        Self::load_from(&path)
    }

    pub fn apply_overrides(&mut self, o: &Overrides) {
        if let Some(u) = o.github_user.as_deref().filter(|u| !u.trim().is_empty()) {
            self.github.user = u.trim().to_string();
        }
        if let Some(u) = o.jira_user.as_deref().filter(|u| !u.trim().is_empty()) {
            self.jira.user = u.trim().to_string();
        }
        if let Some(u) = o.jira_feed_user.as_deref().filter(|u| !u.trim().is_empty()) {
            self.jira.activity_user = u.trim().to_string();
        }
    }

    /// Every active section must carry the fields its fetches need.
    pub fn validate(&self) -> Result<()> {
        if self.github.active {
            require("github", "user", &self.github.user)?;
            require("github", "api_url", &self.github.api_url)?;
        }
        if self.gitlab.active {
            require("gitlab", "base_url", &self.gitlab.base_url)?;
            require("gitlab", "api_path", &self.gitlab.api_path)?;
            require("gitlab", "token", &self.gitlab.token)?;
            require("gitlab", "project_id", &self.gitlab.project_id)?;
        }
        if self.jira.active {
            require("jira", "base_url", &self.jira.base_url)?;
            require("jira", "api_path", &self.jira.api_path)?;
            require("jira", "user", &self.jira.user)?;
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing houndfile")
    }

    fn resolve_secrets(&mut self) -> Result<()> {
        if self.gitlab.token.trim().eq_ignore_ascii_case("env") {
            self.gitlab.token = std::env::var(ENV_GITLAB_TOKEN)
                .map_err(|_| anyhow!("Missing {ENV_GITLAB_TOKEN} env var"))?;
        }
        Ok(())
    }
}

fn require(section: &str, key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("[{section}] is active but `{key}` is empty");
    }
    Ok(())
}

/// Resolve the houndfile path:
/// 1) explicit path (from the command line)
/// 2) $HOUND_CONFIG_PATH
/// 3) ./.houndfile
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        if !p.trim().is_empty() {
            return PathBuf::from(p);
        }
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const FULL: &str = r#"
[github]
active = true
user = "plouc"

[gitlab]
active = true
base_url = "https://gitlab.example.com"
api_path = "/api/v4"
repo_feed_path = "/team/app.atom"
token = "secret"
project_id = "56"

[jira]
active = true
base_url = "https://jira.example.com"
api_path = "/rest/api/2"
activity_path = "/activity"
user = "ann"

[engine]
source_timeout_secs = 5
"#;

    #[test]
    fn parses_sections_and_defaults() {
        let cfg = HoundConfig::from_toml_str(FULL).unwrap();
        assert_eq!(cfg.github.user, "plouc");
        assert_eq!(cfg.github.api_url, "https://api.github.com");
        assert_eq!(cfg.gitlab.project_id, "56");
        assert_eq!(cfg.engine.source_timeout_secs, 5);
        assert_eq!(cfg.engine.overall_timeout_secs, DEFAULT_OVERALL_TIMEOUT_SECS);
    }

    #[test]
    fn inactive_sections_may_be_empty() {
        let cfg = HoundConfig::from_toml_str("[github]\nactive = false\n").unwrap();
        assert!(!cfg.gitlab.active);
        assert!(!cfg.jira.active);
    }

    #[test]
    fn active_section_with_missing_field_is_rejected() {
        let cfg = HoundConfig::from_toml_str("[jira]\nactive = true\nbase_url = \"x\"\n").unwrap();
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("jira"), "{err}");
    }

    #[test]
    fn overrides_replace_users() {
        let mut cfg = HoundConfig::from_toml_str(FULL).unwrap();
        cfg.apply_overrides(&Overrides {
            github_user: Some("octocat".into()),
            jira_user: None,
            jira_feed_user: Some(" bob ".into()),
        });
        assert_eq!(cfg.github.user, "octocat");
        assert_eq!(cfg.jira.user, "ann");
        assert_eq!(cfg.jira.activity_user, "bob");
    }

    #[test]
    fn user_given_on_the_command_line_completes_an_active_section() {
        let mut cfg = HoundConfig::from_toml_str(
            "[github]\nactive = true\n\n[jira]\nactive = true\nbase_url = \"https://jira.test\"\napi_path = \"/rest/api/2\"\n",
        )
        .unwrap();
        assert!(cfg.validate().is_err());

        cfg.apply_overrides(&Overrides {
            github_user: Some("octocat".into()),
            jira_user: Some("ann".into()),
            jira_feed_user: None,
        });
        cfg.validate().unwrap();
        assert_eq!(cfg.github.user, "octocat");
        assert_eq!(cfg.jira.user, "ann");
    }

    #[test]
    fn engine_cfg_never_yields_zero_deadlines() {
        let e = EngineCfg {
            source_timeout_secs: 0,
            overall_timeout_secs: 0,
        };
        let d = e.dispatch_cfg();
        assert_eq!(d.source_timeout, Duration::from_secs(1));
        assert_eq!(d.overall_timeout, Duration::from_secs(1));
    }

    #[serial_test::serial]
    #[test]
    fn gitlab_token_env_indirection() {
        let body = FULL.replace("token = \"secret\"", "token = \"ENV\"");

        env::remove_var(ENV_GITLAB_TOKEN);
        assert!(HoundConfig::from_toml_str(&body).is_err());

        env::set_var(ENV_GITLAB_TOKEN, "from-env");
        let cfg = HoundConfig::from_toml_str(&body).unwrap();
        assert_eq!(cfg.gitlab.token, "from-env");
        env::remove_var(ENV_GITLAB_TOKEN);
    }

    #[serial_test::serial]
    #[test]
    fn path_resolution_order() {
        env::remove_var(ENV_CONFIG_PATH);
        assert_eq!(resolve_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));

        env::set_var(ENV_CONFIG_PATH, "/tmp/other.toml");
        assert_eq!(resolve_path(None), PathBuf::from("/tmp/other.toml"));
        assert_eq!(
            resolve_path(Some(Path::new("cli.toml"))),
            PathBuf::from("cli.toml")
        );
        env::remove_var(ENV_CONFIG_PATH);
    }
}
