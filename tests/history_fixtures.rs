// tests/history_fixtures.rs
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use hound::cli::write_history;
use hound::ingest::providers::{github, gitlab, jira};
use hound::{aggregate, Activation, DispatchCfg, Event, Renderer, SourceKind};

const GITHUB_EVENTS: &str = include_str!("fixtures/github_events.json");
const GITLAB_COMMITS: &str = include_str!("fixtures/gitlab_commits.json");
const GITLAB_FEED: &str = include_str!("fixtures/gitlab_feed.atom");
const JIRA_SEARCH: &str = include_str!("fixtures/jira_search.json");
const JIRA_ACTIVITY: &str = include_str!("fixtures/jira_activity.atom");

fn fixture_activations() -> Vec<Activation<Event>> {
    vec![
        Activation::new(
            SourceKind::Gitlab,
            Arc::new(gitlab::RepoCommits::from_fixture(GITLAB_COMMITS)),
        ),
        Activation::new(
            SourceKind::Gitlab,
            Arc::new(gitlab::RepoActivityFeed::from_fixture(GITLAB_FEED)),
        ),
        Activation::new(
            SourceKind::Github,
            Arc::new(github::UserEvents::from_fixture(GITHUB_EVENTS)),
        ),
        Activation::new(
            SourceKind::Jira,
            Arc::new(jira::IssuesAssignedTo::from_fixture(JIRA_SEARCH)),
        ),
        Activation::new(
            SourceKind::Jira,
            Arc::new(jira::UserActivity::from_fixture(JIRA_ACTIVITY)),
        ),
    ]
}

#[tokio::test]
async fn fixture_history_renders_grouped_timeline() {
    let collected = aggregate(&fixture_activations(), DispatchCfg::default()).await;
    assert!(collected.is_complete());
    assert_eq!(collected.items.len(), 8);

    let now = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
    let renderer = Renderer::plain(Utc);
    let mut out = Vec::new();
    write_history(&mut out, &renderer, &collected, now, Utc).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    let expected = [
        " Today",
        " 10:00  gitlab  Example User pushed to branch master at team / app",
        " 10:00  github  pushed to master at octocat/hound",
        " 10:00  jira    OPS-7 - Rotate certificates",
        " 09:00  jira    Ann changed the status to Done on OPS-6",
        "unexpected type SponsorshipEvent",
        " 01:00  gitlab  ed899a2f4b5 - Replace sanitize with escape once by Example User",
        " Monday 01 January",
        " 23:00  gitlab  Example User opened issue #4 at team / app",
        " 12:00  github  created branch feature-x at octocat/hound",
    ];
    assert_eq!(lines.len(), expected.len(), "output:\n{text}");
    for (line, want) in lines.iter().zip(expected) {
        assert_eq!(line.trim_end(), want, "output:\n{text}");
    }
}

#[tokio::test]
async fn broken_fixture_only_drops_its_own_batch() {
    let mut acts = fixture_activations();
    acts[2] = Activation::new(
        SourceKind::Github,
        Arc::new(github::UserEvents::from_fixture("<html>rate limited</html>")),
    );
    let collected = aggregate(&acts, DispatchCfg::default()).await;
    assert!(collected.is_complete());
    assert_eq!(collected.items.len(), 5);
    assert!(collected
        .items
        .iter()
        .all(|e| e.source() != SourceKind::Github));
}

#[tokio::test]
async fn rendering_the_same_timeline_twice_is_identical() {
    let collected = aggregate(&fixture_activations(), DispatchCfg::default()).await;
    let now = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
    let renderer = Renderer::new(Utc, true);

    let mut a = Vec::new();
    let mut b = Vec::new();
    write_history(&mut a, &renderer, &collected, now, Utc).unwrap();
    write_history(&mut b, &renderer, &collected, now, Utc).unwrap();
    assert_eq!(a, b);
}
