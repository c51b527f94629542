// src/ingest/providers/jira.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{atom, join_url, parse_timestamp, Transport};
use crate::config::JiraCfg;
use crate::ingest::types::{Event, FetchOperation, Payload, SourceKind, Stat, StatItem};

pub const HISTORY_MAX_RESULTS: u32 = 30;
pub const STATS_MAX_RESULTS: u32 = 1000;

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    #[serde(default)]
    summary: String,
    created: Option<String>,
}

fn search_transport(cfg: &JiraCfg, client: &reqwest::Client, max_results: u32) -> Transport {
    let url = join_url(&join_url(&cfg.base_url, &cfg.api_path), "search");
    Transport::http(client, url)
        .query("jql", format!("assignee={}", cfg.user))
        .query("maxResults", max_results.to_string())
        .query("startAt", "0")
}

fn parse_search(body: &str) -> Result<Vec<JiraIssue>> {
    let res: SearchResult = serde_json::from_str(body).context("parsing jira search json")?;
    Ok(res.issues)
}

/// Issues assigned to the configured user.
pub struct IssuesAssignedTo {
    transport: Transport,
}

impl IssuesAssignedTo {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            transport: Transport::fixture(body),
        }
    }

    pub fn from_config(cfg: &JiraCfg, client: &reqwest::Client, max_results: u32) -> Self {
        Self {
            transport: search_transport(cfg, client, max_results),
        }
    }
}

#[async_trait]
impl FetchOperation<Event> for IssuesAssignedTo {
    async fn fetch(&self) -> Result<Vec<Event>> {
        let body = self.transport.body("jira issues").await?;
        Ok(parse_search(&body)?
            .into_iter()
            .filter_map(|issue| {
                let on = issue.fields.created.as_deref().and_then(parse_timestamp)?;
                Some(Event::new(
                    on,
                    Payload::Issue {
                        key: issue.key,
                        summary: issue.fields.summary,
                    },
                ))
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "issues"
    }
}

/// Activity stream of a user (Atom).
pub struct UserActivity {
    transport: Transport,
}

impl UserActivity {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            transport: Transport::fixture(body),
        }
    }

    pub fn from_config(cfg: &JiraCfg, client: &reqwest::Client) -> Self {
        let user = if cfg.activity_user.trim().is_empty() {
            &cfg.user
        } else {
            &cfg.activity_user
        };
        Self {
            transport: Transport::http(client, join_url(&cfg.base_url, &cfg.activity_path))
                .query("streams", format!("user IS {user}")),
        }
    }
}

#[async_trait]
impl FetchOperation<Event> for UserActivity {
    async fn fetch(&self) -> Result<Vec<Event>> {
        let body = self.transport.body("jira activity").await?;
        Ok(atom::parse_feed(&body, "jira activity")?
            .into_iter()
            .map(|e| Event::new(e.updated, Payload::Activity { title: e.title }))
            .collect())
    }

    fn name(&self) -> &'static str {
        "activity"
    }
}

/// Assigned issues as a stats listing.
pub struct IssueStats {
    transport: Transport,
}

impl IssueStats {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            transport: Transport::fixture(body),
        }
    }

    pub fn from_config(cfg: &JiraCfg, client: &reqwest::Client, max_results: u32) -> Self {
        Self {
            transport: search_transport(cfg, client, max_results),
        }
    }
}

#[async_trait]
impl FetchOperation<Stat> for IssueStats {
    async fn fetch(&self) -> Result<Vec<Stat>> {
        let body = self.transport.body("jira issues").await?;
        Ok(vec![Stat {
            source: SourceKind::Jira,
            items: parse_search(&body)?
                .into_iter()
                .map(|i| StatItem {
                    name: i.key,
                    description: i.fields.summary,
                })
                .collect(),
        }])
    }

    fn name(&self) -> &'static str {
        "issue_stats"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r#"{"startAt":0,"maxResults":30,"total":2,"issues":[
      {"key":"OPS-7","fields":{"summary":"Rotate certificates","created":"2024-01-02T10:00:00.000+0000"}},
      {"key":"OPS-8","fields":{"summary":"No date"}}
    ]}"#;

    #[tokio::test]
    async fn issues_with_created_date_become_events() {
        let events = IssuesAssignedTo::from_fixture(SEARCH).fetch().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].payload(),
            &Payload::Issue {
                key: "OPS-7".into(),
                summary: "Rotate certificates".into()
            }
        );
    }

    #[tokio::test]
    async fn issue_stats_keep_undated_issues() {
        let stats = IssueStats::from_fixture(SEARCH).fetch().await.unwrap();
        assert_eq!(stats[0].items.len(), 2);
        assert_eq!(stats[0].items[1].name, "OPS-8");
    }

    #[tokio::test]
    async fn activity_feed_titles_are_kept_raw() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
          <title type="html">&lt;a href="u"&gt;Ann&lt;/a&gt; resolved OPS-7</title>
          <updated>2024-01-02T11:00:00.000Z</updated></entry></feed>"#;
        let events = UserActivity::from_fixture(xml).fetch().await.unwrap();
        assert_eq!(events.len(), 1);
        match events[0].payload() {
            Payload::Activity { title } => assert!(title.contains("<a href")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
