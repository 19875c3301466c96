//! Knowledge-base records as they appear in JSON snapshot files.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// ISO-8601 timestamp: no fraction for whole seconds, otherwise six digits.
pub fn iso_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// One course session (a transcript) with an optional overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// A titled excerpt of a session (diagnosis, treatment, theory ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub id: i64,
    pub session_id: i64,
    #[serde(default)]
    pub segment_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

impl Segment {
    /// Title shown to users; untitled segments fall back to their id.
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("段落 {}", self.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// The on-disk shape of a snapshot file. Any section may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub sessions: Vec<Session>,
    pub segments: Vec<Segment>,
    pub tags: Vec<Tag>,
}
