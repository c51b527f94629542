// src/timeline.rs
//! Day grouping for an ordered timeline.

use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::ingest::types::Event;

/// Header text for a group of events sharing a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Date(NaiveDate),
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayLabel::Today => f.write_str("Today"),
            DayLabel::Date(d) => write!(f, "{}", d.format("%A %d %B")),
        }
    }
}

/// Single forward pass over a recency-ordered timeline, remembering only the
/// calendar day of the previous event. Days are full dates in `tz`, so the
/// same day-of-year in different years never matches.
pub struct DayPartitioner<Tz: TimeZone> {
    tz: Tz,
    today: NaiveDate,
    current: Option<NaiveDate>,
}

impl<Tz: TimeZone> DayPartitioner<Tz> {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        let today = now.with_timezone(&tz).date_naive();
        Self {
            tz,
            today,
            current: None,
        }
    }

    /// Returns a header when `on` starts a new day.
    pub fn observe(&mut self, on: DateTime<Utc>) -> Option<DayLabel> {
        let day = on.with_timezone(&self.tz).date_naive();
        if self.current == Some(day) {
            return None;
        }
        self.current = Some(day);
        Some(if day == self.today {
            DayLabel::Today
        } else {
            DayLabel::Date(day)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry<'a> {
    DayHeader(DayLabel),
    Event(&'a Event),
}

/// Interleave day headers with the events they introduce.
pub fn layout<Tz: TimeZone>(events: &[Event], now: DateTime<Utc>, tz: Tz) -> Vec<Entry<'_>> {
    let mut days = DayPartitioner::new(now, tz);
    let mut out = Vec::with_capacity(events.len() + 8);
    for ev in events {
        if let Some(label) = days.observe(ev.on()) {
            out.push(Entry::DayHeader(label));
        }
        out.push(Entry::Event(ev));
    }
    out
}
