// src/render.rs
//! Display lines for the timeline and the stats listing.
//!
//! Formatting is a pure read of an [`Event`]: the same event always renders
//! to the same text. Colors are 256-color terminal cells; `plain` output is
//! what tests and pipes see.

use chrono::TimeZone;
use crossterm::style::{Color, Stylize};

use crate::ingest::sanitize_html;
use crate::ingest::types::{Event, Payload, Stat};
use crate::timeline::Entry;

const SEPARATOR: &str = "⮀";
const HEADER_WIDTH: usize = 80;

/// Outcome of rendering one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Line(String),
    /// The payload had no formatter; reported instead of aborting the run.
    UnexpectedType(String),
}

impl Rendered {
    pub fn text(&self) -> &str {
        match self {
            Rendered::Line(s) | Rendered::UnexpectedType(s) => s,
        }
    }
}

/// Human text for a payload, or `None` when there is no formatter for it.
pub fn describe(payload: &Payload) -> Option<String> {
    match payload {
        Payload::Commit {
            short_id,
            title,
            author,
        } => Some(format!("{short_id} - {title} by {author}")),
        Payload::FeedEntry { title, .. } => Some(title.clone()),
        Payload::RepoEvent {
            kind,
            repo,
            action,
            reference,
            ref_type,
            number,
        } => Some(repo_event_message(
            kind,
            repo,
            action.as_deref(),
            reference.as_deref(),
            ref_type.as_deref(),
            *number,
        )),
        Payload::Issue { key, summary } => Some(format!("{key} - {summary}")),
        Payload::Activity { title } => Some(sanitize_html(title)),
        Payload::Unrecognized { .. } => None,
    }
}

fn repo_event_message(
    kind: &str,
    repo: &str,
    action: Option<&str>,
    reference: Option<&str>,
    ref_type: Option<&str>,
    number: Option<u64>,
) -> String {
    let num = number.map(|n| format!(" #{n}")).unwrap_or_default();
    let action = action.unwrap_or("updated");
    match kind {
        "PushEvent" => format!("pushed to {} at {repo}", reference.unwrap_or("?")),
        "CreateEvent" => match (ref_type, reference) {
            (Some("repository"), _) | (_, None) => format!("created repository {repo}"),
            (rt, Some(r)) => format!("created {} {r} at {repo}", rt.unwrap_or("ref")),
        },
        "DeleteEvent" => format!(
            "deleted {} {} at {repo}",
            ref_type.unwrap_or("ref"),
            reference.unwrap_or("?")
        ),
        "WatchEvent" => format!("starred {repo}"),
        "ForkEvent" => format!("forked {repo}"),
        "IssuesEvent" => format!("{action} issue{num} at {repo}"),
        "IssueCommentEvent" => format!("commented on issue{num} at {repo}"),
        "PullRequestEvent" => format!("{action} pull request{num} at {repo}"),
        "PullRequestReviewEvent" => format!("reviewed pull request{num} at {repo}"),
        "PullRequestReviewCommentEvent" => {
            format!("commented on pull request{num} at {repo}")
        }
        "CommitCommentEvent" => format!("commented on a commit at {repo}"),
        "ReleaseEvent" => format!("{action} a release at {repo}"),
        "PublicEvent" => format!("open sourced {repo}"),
        "MemberEvent" => format!("{action} a collaborator at {repo}"),
        "GollumEvent" => format!("updated the wiki at {repo}"),
        other => format!("{other} at {repo}"),
    }
}

fn cell(text: &str, fg: u8, bg: u8) -> String {
    text.with(Color::AnsiValue(fg))
        .on(Color::AnsiValue(bg))
        .to_string()
}

fn fg(text: &str, fg: u8) -> String {
    text.with(Color::AnsiValue(fg)).to_string()
}

pub struct Renderer<Tz: TimeZone> {
    tz: Tz,
    color: bool,
}

impl<Tz: TimeZone> Renderer<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    pub fn new(tz: Tz, color: bool) -> Self {
        Self { tz, color }
    }

    pub fn plain(tz: Tz) -> Self {
        Self::new(tz, false)
    }

    /// One display line for one event, selected by payload variant.
    pub fn event(&self, ev: &Event) -> Rendered {
        let Some(text) = describe(ev.payload()) else {
            let type_name = match ev.payload() {
                Payload::Unrecognized { type_name, .. } => type_name.as_str(),
                _ => "unknown",
            };
            return Rendered::UnexpectedType(format!("unexpected type {type_name}"));
        };

        let time = ev.on().with_timezone(&self.tz).format("%H:%M").to_string();
        let tag = format!("{:<6}", ev.source().as_str());

        if !self.color {
            return Rendered::Line(format!(" {time}  {tag}  {text}"));
        }

        let text = match ev.payload() {
            Payload::Commit {
                short_id,
                title,
                author,
            } => format!("{short_id} - {title} by {}", author.as_str().bold()),
            _ => text,
        };
        Rendered::Line(format!(
            "{}{}{}{} {}",
            cell(&format!(" {time} "), 16, 87),
            cell(SEPARATOR, 87, 178),
            cell(&format!(" {tag} "), 16, 178),
            fg(SEPARATOR, 178),
            fg(&text, 157),
        ))
    }

    /// Block printed whenever the calendar day changes.
    pub fn day_header(&self, label: &str) -> String {
        let padded = format!(" {label:<HEADER_WIDTH$} ");
        if self.color {
            cell(&padded, 184, 94)
        } else {
            padded
        }
    }

    pub fn timeline(&self, entries: &[Entry<'_>]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| match entry {
                Entry::DayHeader(label) => self.day_header(&label.to_string()),
                Entry::Event(ev) => match self.event(ev) {
                    Rendered::Line(s) => s,
                    Rendered::UnexpectedType(s) => {
                        tracing::debug!(source = %ev.source(), "no formatter for payload");
                        s
                    }
                },
            })
            .collect()
    }

    pub fn stats(&self, stats: &[Stat]) -> Vec<String> {
        let mut out = Vec::new();
        for stat in stats {
            out.push(self.day_header(stat.source.title()));
            let count = format!(" {:<HEADER_WIDTH$} ", format!("{} items", stat.items.len()));
            out.push(if self.color { cell(&count, 16, 87) } else { count });
            for item in &stat.items {
                out.push(if self.color {
                    format!(
                        "{}{} {}",
                        cell(&format!(" {} ", item.name), 16, 178),
                        fg(SEPARATOR, 178),
                        fg(&item.description, 157)
                    )
                } else {
                    format!(" {}  {}", item.name, item.description)
                });
            }
        }
        out
    }

    pub fn banner(&self) -> String {
        if !self.color {
            return format!("HOUND v{}", env!("CARGO_PKG_VERSION"));
        }
        let bar = cell("             ", 157, 157);
        let edge = cell("  ", 157, 157);
        format!(
            "{bar}\n{edge}  {}  {edge} {}\n{bar}",
            fg("HOUND", 157),
            fg(&format!("V{}", env!("CARGO_PKG_VERSION")), 157)
        )
    }
}
