// src/ingest/providers/gitlab.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{atom, join_url, parse_timestamp, Transport};
use crate::config::GitlabCfg;
use crate::ingest::types::{Event, FetchOperation, Payload, SourceKind, Stat, StatItem};

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Debug, Deserialize)]
struct GlCommit {
    short_id: String,
    title: String,
    author_name: String,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlProject {
    name: String,
    description: Option<String>,
}

fn api_url(cfg: &GitlabCfg, path: &str) -> String {
    join_url(&join_url(&cfg.base_url, &cfg.api_path), path)
}

/// Commits of the configured project.
pub struct RepoCommits {
    transport: Transport,
}

impl RepoCommits {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            transport: Transport::fixture(body),
        }
    }

    pub fn from_config(cfg: &GitlabCfg, client: &reqwest::Client) -> Self {
        let url = api_url(
            cfg,
            &format!("projects/{}/repository/commits", cfg.project_id),
        );
        Self {
            transport: Transport::http(client, url).header(PRIVATE_TOKEN_HEADER, cfg.token.clone()),
        }
    }
}

#[async_trait]
impl FetchOperation<Event> for RepoCommits {
    async fn fetch(&self) -> Result<Vec<Event>> {
        let body = self.transport.body("gitlab commits").await?;
        let commits: Vec<GlCommit> =
            serde_json::from_str(&body).context("parsing gitlab commits json")?;
        Ok(commits
            .into_iter()
            .filter_map(|c| {
                let on = c.created_at.as_deref().and_then(parse_timestamp)?;
                Some(Event::new(
                    on,
                    Payload::Commit {
                        short_id: c.short_id,
                        title: c.title,
                        author: c.author_name,
                    },
                ))
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "commits"
    }
}

/// Repository activity Atom feed.
pub struct RepoActivityFeed {
    transport: Transport,
}

impl RepoActivityFeed {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            transport: Transport::fixture(body),
        }
    }

    pub fn from_config(cfg: &GitlabCfg, client: &reqwest::Client) -> Self {
        // The feed endpoint takes the token as a query parameter, not a header.
        let url = join_url(&cfg.base_url, &cfg.repo_feed_path);
        Self {
            transport: Transport::http(client, url).query("private_token", cfg.token.clone()),
        }
    }
}

#[async_trait]
impl FetchOperation<Event> for RepoActivityFeed {
    async fn fetch(&self) -> Result<Vec<Event>> {
        let body = self.transport.body("gitlab feed").await?;
        Ok(atom::parse_feed(&body, "gitlab feed")?
            .into_iter()
            .map(|e| {
                Event::new(
                    e.updated,
                    Payload::FeedEntry {
                        title: e.title,
                        link: e.link,
                    },
                )
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "activity_feed"
    }
}

/// Projects visible to the token, for the stats listing.
pub struct Projects {
    transport: Transport,
}

impl Projects {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            transport: Transport::fixture(body),
        }
    }

    pub fn from_config(cfg: &GitlabCfg, client: &reqwest::Client) -> Self {
        Self {
            transport: Transport::http(client, api_url(cfg, "projects"))
                .header(PRIVATE_TOKEN_HEADER, cfg.token.clone()),
        }
    }
}

#[async_trait]
impl FetchOperation<Stat> for Projects {
    async fn fetch(&self) -> Result<Vec<Stat>> {
        let body = self.transport.body("gitlab projects").await?;
        let projects: Vec<GlProject> =
            serde_json::from_str(&body).context("parsing gitlab projects json")?;
        Ok(vec![Stat {
            source: SourceKind::Gitlab,
            items: projects
                .into_iter()
                .map(|p| StatItem {
                    name: p.name,
                    description: p.description.unwrap_or_default(),
                })
                .collect(),
        }])
    }

    fn name(&self) -> &'static str {
        "projects"
    }
}
