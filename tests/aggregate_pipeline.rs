// tests/aggregate_pipeline.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hound::{aggregate, Activation, DispatchCfg, Event, FetchOperation, Payload, SourceKind};

struct MockProvider {
    events: Vec<Event>,
    delay: Duration,
    fail: bool,
}

#[async_trait]
impl FetchOperation<Event> for MockProvider {
    async fn fetch(&self) -> Result<Vec<Event>> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(anyhow!("503 from upstream"));
        }
        Ok(self.events.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn at(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
}

fn issue(on: DateTime<Utc>, key: &str) -> Event {
    Event::new(
        on,
        Payload::Issue {
            key: key.into(),
            summary: String::new(),
        },
    )
}

fn commit(on: DateTime<Utc>, id: &str) -> Event {
    Event::new(
        on,
        Payload::Commit {
            short_id: id.into(),
            title: String::new(),
            author: String::new(),
        },
    )
}

fn push(on: DateTime<Utc>) -> Event {
    Event::new(
        on,
        Payload::RepoEvent {
            kind: "PushEvent".into(),
            repo: "o/r".into(),
            action: None,
            reference: Some("main".into()),
            ref_type: None,
            number: None,
        },
    )
}

fn activation(source: SourceKind, events: Vec<Event>, delay_ms: u64, fail: bool) -> Activation<Event> {
    Activation::new(
        source,
        Arc::new(MockProvider {
            events,
            delay: Duration::from_millis(delay_ms),
            fail,
        }),
    )
}

fn cfg() -> DispatchCfg {
    DispatchCfg {
        source_timeout: Duration::from_secs(2),
        overall_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn one_failing_source_of_three_still_returns_the_rest() {
    let acts = vec![
        activation(SourceKind::Gitlab, vec![commit(at(2, 9), "a"), commit(at(1, 9), "b")], 20, false),
        activation(SourceKind::Github, vec![push(at(2, 11))], 5, true),
        activation(SourceKind::Jira, vec![issue(at(2, 10), "OPS-1")], 10, false),
    ];

    let t0 = std::time::Instant::now();
    let out = aggregate(&acts, cfg()).await;
    assert!(t0.elapsed() < Duration::from_secs(5));

    assert!(out.is_complete());
    assert_eq!(out.expected, 3);
    assert_eq!(out.items.len(), 3);
    assert!(out.items.iter().all(|e| e.source() != SourceKind::Github));
    assert!(out.items.windows(2).all(|w| w[0].on() >= w[1].on()));
}

#[tokio::test]
async fn ties_across_sources_keep_activation_order() {
    let t = at(3, 12);
    // The first activation answers last; the order must not depend on arrival.
    let acts = vec![
        activation(SourceKind::Gitlab, vec![commit(t, "c1")], 80, false),
        activation(SourceKind::Jira, vec![issue(t, "J-1")], 1, false),
    ];

    for _ in 0..3 {
        let out = aggregate(&acts, cfg()).await;
        let sources: Vec<SourceKind> = out.items.iter().map(|e| e.source()).collect();
        assert_eq!(sources, vec![SourceKind::Gitlab, SourceKind::Jira]);
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_source_is_cut_off_and_run_marked_incomplete() {
    struct Stalled;

    #[async_trait]
    impl FetchOperation<Event> for Stalled {
        async fn fetch(&self) -> Result<Vec<Event>> {
            std::future::pending().await
        }
        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    let acts = vec![
        activation(SourceKind::Jira, vec![issue(at(2, 10), "OPS-2")], 1, false),
        Activation::new(SourceKind::Github, Arc::new(Stalled)),
    ];
    let out = aggregate(
        &acts,
        DispatchCfg {
            source_timeout: Duration::from_secs(600),
            overall_timeout: Duration::from_secs(3),
        },
    )
    .await;

    assert!(!out.is_complete());
    assert_eq!((out.reported, out.expected), (1, 2));
    assert_eq!(out.items.len(), 1);
}

#[tokio::test]
async fn no_active_sources_yields_empty_timeline() {
    let out = aggregate(&[], cfg()).await;
    assert!(out.items.is_empty());
    assert!(out.is_complete());
}
