// src/ingest/providers/atom.rs
//! Minimal Atom reader shared by the GitLab repository feed and the Jira
//! activity stream.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;

use super::parse_timestamp;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<TextNode>,
    updated: Option<String>,
    published: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomEntry {
    pub title: String,
    pub link: Option<String>,
    pub updated: DateTime<Utc>,
}

/// Parse feed entries. Entries without a usable `updated`/`published`
/// timestamp are dropped.
pub fn parse_feed(xml: &str, what: &str) -> Result<Vec<AtomEntry>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let feed: Feed = from_str(&xml_clean).with_context(|| format!("parsing {what} atom xml"))?;

    let mut out = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let Some(updated) = entry
            .updated
            .as_deref()
            .or(entry.published.as_deref())
            .and_then(parse_timestamp)
        else {
            tracing::debug!(feed = what, "atom entry without timestamp dropped");
            continue;
        };
        let link = entry
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .and_then(|l| l.href.clone());
        out.push(AtomEntry {
            title: entry.title.unwrap_or_default().value.trim().to_string(),
            link,
            updated,
        });
    }
    Ok(out)
}

// quick-xml only knows the XML entities; feeds routinely carry HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Activity</title>
  <updated>2024-01-02T10:00:00Z</updated>
  <entry>
    <id>1</id>
    <title type="html">Ann pushed to &ldquo;master&rdquo;</title>
    <link rel="alternate" href="https://git.test/c/1"/>
    <updated>2024-01-02T09:30:00Z</updated>
  </entry>
  <entry>
    <title>no date</title>
  </entry>
  <entry>
    <title>published only</title>
    <published>2024-01-01T23:00:00.000+0000</published>
  </entry>
</feed>"#;

    #[test]
    fn entries_with_timestamps_are_kept() {
        let entries = parse_feed(FEED, "test").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Ann pushed to \"master\"");
        assert_eq!(entries[0].link.as_deref(), Some("https://git.test/c/1"));
        assert_eq!(
            entries[0].updated,
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap()
        );
        assert_eq!(entries[1].title, "published only");
        assert_eq!(entries[1].link, None);
    }

    #[test]
    fn empty_feed_yields_nothing() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>x</title></feed>"#;
        assert!(parse_feed(xml, "test").unwrap().is_empty());
    }
}
