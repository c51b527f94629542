// src/ingest/types.rs
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

/// Which collaborator produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Github,
    Gitlab,
    Jira,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Github => "github",
            SourceKind::Gitlab => "gitlab",
            SourceKind::Jira => "jira",
        }
    }

    /// Capitalized name used in stats headers.
    pub fn title(&self) -> &'static str {
        match self {
            SourceKind::Github => "Github",
            SourceKind::Gitlab => "Gitlab",
            SourceKind::Jira => "Jira",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record shapes the timeline knows how to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A repository commit (gitlab).
    Commit {
        short_id: String,
        title: String,
        author: String,
    },
    /// An entry of a repository activity feed (gitlab).
    FeedEntry { title: String, link: Option<String> },
    /// An event performed by a user (github).
    RepoEvent {
        kind: String,
        repo: String,
        action: Option<String>,
        reference: Option<String>,
        ref_type: Option<String>,
        number: Option<u64>,
    },
    /// An issue assigned to a user (jira).
    Issue { key: String, summary: String },
    /// An activity stream item (jira), title may contain HTML.
    Activity { title: String },
    /// A record its collaborator could not map onto a known shape.
    Unrecognized {
        source: SourceKind,
        type_name: String,
    },
}

impl Payload {
    /// The source a payload belongs to.
    pub fn source(&self) -> SourceKind {
        match self {
            Payload::Commit { .. } | Payload::FeedEntry { .. } => SourceKind::Gitlab,
            Payload::RepoEvent { .. } => SourceKind::Github,
            Payload::Issue { .. } | Payload::Activity { .. } => SourceKind::Jira,
            Payload::Unrecognized { source, .. } => *source,
        }
    }
}

/// One timestamped record on the timeline.
///
/// Fields are private: once built, an event is only reordered and regrouped,
/// never edited. The source tag is derived from the payload, so the two can
/// not disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    on: DateTime<Utc>,
    payload: Payload,
}

impl Event {
    pub fn new(on: DateTime<Utc>, payload: Payload) -> Self {
        Self { on, payload }
    }

    pub fn source(&self) -> SourceKind {
        self.payload.source()
    }

    pub fn on(&self) -> DateTime<Utc> {
        self.on
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// One line of the stats listing (a repository, a project, an issue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatItem {
    pub name: String,
    pub description: String,
}

/// All stats lines gathered from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub source: SourceKind,
    pub items: Vec<StatItem>,
}

/// A single, independent, stateless fetch against one source.
#[async_trait::async_trait]
pub trait FetchOperation<T>: Send + Sync {
    async fn fetch(&self) -> Result<Vec<T>>;
    /// Short operation name for logs, e.g. "commits".
    fn name(&self) -> &'static str;
}

/// One entry of the activation set: a source tag paired with a fetch operation.
pub struct Activation<T> {
    pub source: SourceKind,
    pub operation: Arc<dyn FetchOperation<T>>,
}

impl<T> Activation<T> {
    pub fn new(source: SourceKind, operation: Arc<dyn FetchOperation<T>>) -> Self {
        Self { source, operation }
    }

    /// "source/operation" label used in logs.
    pub fn label(&self) -> String {
        format!("{}/{}", self.source, self.operation.name())
    }
}

impl<T> Clone for Activation<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source,
            operation: Arc::clone(&self.operation),
        }
    }
}
