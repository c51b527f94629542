// src/ingest/providers/github.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{join_url, parse_timestamp, Transport};
use crate::config::GithubCfg;
use crate::ingest::types::{Event, FetchOperation, Payload, SourceKind, Stat, StatItem};

/// Event types the timeline has a message for; anything else is passed on
/// as `Payload::Unrecognized`.
const KNOWN_EVENT_TYPES: &[&str] = &[
    "CommitCommentEvent",
    "CreateEvent",
    "DeleteEvent",
    "ForkEvent",
    "GollumEvent",
    "IssueCommentEvent",
    "IssuesEvent",
    "MemberEvent",
    "PublicEvent",
    "PullRequestEvent",
    "PullRequestReviewEvent",
    "PullRequestReviewCommentEvent",
    "PushEvent",
    "ReleaseEvent",
    "WatchEvent",
];

#[derive(Debug, Deserialize)]
struct GhEvent {
    #[serde(rename = "type")]
    kind: String,
    repo: GhRepoRef,
    #[serde(default)]
    payload: GhPayload,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhRepoRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct GhPayload {
    #[serde(rename = "ref")]
    reference: Option<String>,
    ref_type: Option<String>,
    action: Option<String>,
    number: Option<u64>,
    issue: Option<GhNumbered>,
    pull_request: Option<GhNumbered>,
}

#[derive(Debug, Deserialize)]
struct GhNumbered {
    number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GhRepo {
    name: String,
    description: Option<String>,
}

/// Events performed by a user, most recent first as GitHub returns them.
pub struct UserEvents {
    transport: Transport,
}

impl UserEvents {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            transport: Transport::fixture(body),
        }
    }

    pub fn from_config(cfg: &GithubCfg, client: &reqwest::Client) -> Self {
        let url = join_url(&cfg.api_url, &format!("users/{}/events", cfg.user));
        Self {
            transport: Transport::http(client, url).header("Accept", "application/vnd.github+json"),
        }
    }

    fn parse_events(body: &str) -> Result<Vec<Event>> {
        let raw: Vec<GhEvent> = serde_json::from_str(body).context("parsing github events json")?;
        let mut out = Vec::with_capacity(raw.len());
        for ev in raw {
            let Some(on) = ev.created_at.as_deref().and_then(parse_timestamp) else {
                continue;
            };
            let payload = if KNOWN_EVENT_TYPES.contains(&ev.kind.as_str()) {
                let number = ev
                    .payload
                    .number
                    .or(ev.payload.issue.and_then(|i| i.number))
                    .or(ev.payload.pull_request.and_then(|p| p.number));
                Payload::RepoEvent {
                    kind: ev.kind,
                    repo: ev.repo.name,
                    action: ev.payload.action,
                    reference: ev.payload.reference.map(|r| short_ref(&r)),
                    ref_type: ev.payload.ref_type,
                    number,
                }
            } else {
                Payload::Unrecognized {
                    source: SourceKind::Github,
                    type_name: ev.kind,
                }
            };
            out.push(Event::new(on, payload));
        }
        Ok(out)
    }
}

fn short_ref(r: &str) -> String {
    r.strip_prefix("refs/heads/")
        .or_else(|| r.strip_prefix("refs/tags/"))
        .unwrap_or(r)
        .to_string()
}

#[async_trait]
impl FetchOperation<Event> for UserEvents {
    async fn fetch(&self) -> Result<Vec<Event>> {
        let body = self.transport.body("github events").await?;
        Self::parse_events(&body)
    }

    fn name(&self) -> &'static str {
        "user_events"
    }
}

/// Public repositories of a user, for the stats listing.
pub struct UserRepos {
    transport: Transport,
}

impl UserRepos {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            transport: Transport::fixture(body),
        }
    }

    pub fn from_config(cfg: &GithubCfg, client: &reqwest::Client) -> Self {
        let url = join_url(&cfg.api_url, &format!("users/{}/repos", cfg.user));
        Self {
            transport: Transport::http(client, url).header("Accept", "application/vnd.github+json"),
        }
    }
}

#[async_trait]
impl FetchOperation<Stat> for UserRepos {
    async fn fetch(&self) -> Result<Vec<Stat>> {
        let body = self.transport.body("github repos").await?;
        let repos: Vec<GhRepo> = serde_json::from_str(&body).context("parsing github repos json")?;
        Ok(vec![Stat {
            source: SourceKind::Github,
            items: repos
                .into_iter()
                .map(|r| StatItem {
                    name: r.name,
                    description: r.description.unwrap_or_default(),
                })
                .collect(),
        }])
    }

    fn name(&self) -> &'static str {
        "user_repos"
    }
}
