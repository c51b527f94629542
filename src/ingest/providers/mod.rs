// src/ingest/providers/mod.rs
pub mod atom;
pub mod github;
pub mod gitlab;
pub mod jira;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::HoundConfig;
use crate::ingest::types::{Activation, Event, SourceKind, Stat};

/// Where a fetch operation reads its body from.
pub enum Transport {
    // Owned copy so tests don't need 'static fixtures.
    Fixture(String),
    Http {
        client: reqwest::Client,
        url: String,
        query: Vec<(String, String)>,
        headers: Vec<(&'static str, String)>,
    },
}

impl Transport {
    pub fn fixture(body: &str) -> Self {
        Transport::Fixture(body.to_string())
    }

    pub fn http(client: &reqwest::Client, url: impl Into<String>) -> Self {
        Transport::Http {
            client: client.clone(),
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        if let Transport::Http { query, .. } = &mut self {
            query.push((key.to_string(), value.into()));
        }
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Transport::Http { headers, .. } = &mut self {
            headers.push((name, value.into()));
        }
        self
    }

    /// Fetch the raw body. `what` names the operation in error context.
    pub async fn body(&self, what: &str) -> Result<String> {
        match self {
            Transport::Fixture(s) => Ok(s.clone()),
            Transport::Http {
                client,
                url,
                query,
                headers,
            } => {
                let mut req = client.get(url.as_str()).query(query);
                for (name, value) in headers {
                    req = req.header(*name, value);
                }
                let resp = req
                    .send()
                    .await
                    .with_context(|| format!("{what} http get()"))?
                    .error_for_status()
                    .with_context(|| format!("{what} non-2xx"))?;
                resp.text()
                    .await
                    .with_context(|| format!("{what} http .text()"))
            }
        }
    }
}

/// Shared HTTP client for every source of a run.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("hound/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(15))
        .build()
        .context("building http client")
}

/// Parse the timestamp formats the sources emit: RFC 3339, or Jira's
/// `2024-01-02T10:00:00.000+0000`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Timeline fetches for every active source, in a fixed order:
/// gitlab commits, gitlab feed, github events, jira issues, jira activity.
pub fn history_activations(
    cfg: &HoundConfig,
    client: &reqwest::Client,
) -> Vec<Activation<Event>> {
    let mut out: Vec<Activation<Event>> = Vec::new();

    if cfg.gitlab.active {
        out.push(Activation::new(
            SourceKind::Gitlab,
            Arc::new(gitlab::RepoCommits::from_config(&cfg.gitlab, client)),
        ));
        if !cfg.gitlab.repo_feed_path.trim().is_empty() {
            out.push(Activation::new(
                SourceKind::Gitlab,
                Arc::new(gitlab::RepoActivityFeed::from_config(&cfg.gitlab, client)),
            ));
        }
    }

    if cfg.github.active {
        out.push(Activation::new(
            SourceKind::Github,
            Arc::new(github::UserEvents::from_config(&cfg.github, client)),
        ));
    }

    if cfg.jira.active {
        out.push(Activation::new(
            SourceKind::Jira,
            Arc::new(jira::IssuesAssignedTo::from_config(
                &cfg.jira,
                client,
                jira::HISTORY_MAX_RESULTS,
            )),
        ));
        if !cfg.jira.activity_path.trim().is_empty() {
            out.push(Activation::new(
                SourceKind::Jira,
                Arc::new(jira::UserActivity::from_config(&cfg.jira, client)),
            ));
        }
    }

    out
}

/// Stats fetches: one listing per active source.
pub fn stats_activations(cfg: &HoundConfig, client: &reqwest::Client) -> Vec<Activation<Stat>> {
    let mut out: Vec<Activation<Stat>> = Vec::new();
    if cfg.github.active {
        out.push(Activation::new(
            SourceKind::Github,
            Arc::new(github::UserRepos::from_config(&cfg.github, client)),
        ));
    }
    if cfg.gitlab.active {
        out.push(Activation::new(
            SourceKind::Gitlab,
            Arc::new(gitlab::Projects::from_config(&cfg.gitlab, client)),
        ));
    }
    if cfg.jira.active {
        out.push(Activation::new(
            SourceKind::Jira,
            Arc::new(jira::IssueStats::from_config(
                &cfg.jira,
                client,
                jira::STATS_MAX_RESULTS,
            )),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_in_all_source_formats() {
        let want = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T10:00:00Z"), Some(want));
        assert_eq!(parse_timestamp("2024-01-02T12:00:00+02:00"), Some(want));
        assert_eq!(parse_timestamp("2024-01-02T10:00:00.000+0000"), Some(want));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://git.test/", "/api/v4"),
            "https://git.test/api/v4"
        );
    }

    #[test]
    fn activation_set_follows_active_flags() {
        let mut cfg = HoundConfig::default();
        cfg.github.active = true;
        cfg.github.user = "octo".into();
        cfg.jira.active = true;
        cfg.jira.base_url = "https://jira.test".into();
        cfg.jira.api_path = "/rest/api/2".into();
        cfg.jira.user = "ann".into();

        let client = reqwest::Client::new();
        let history = history_activations(&cfg, &client);
        let labels: Vec<String> = history.iter().map(|a| a.label()).collect();
        // no activity_path configured, so only the issue listing for jira
        assert_eq!(labels, vec!["github/user_events", "jira/issues"]);

        let stats = stats_activations(&cfg, &client);
        assert_eq!(stats.len(), 2);
    }
}
