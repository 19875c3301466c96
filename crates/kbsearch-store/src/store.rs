use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use kbsearch_core::error::Error;

use crate::records::{Segment, Session, Snapshot, Tag};

/// Read-only, in-memory view of the sessions → segments → tags hierarchy.
///
/// Records are kept in id order so that every scan is deterministic.
#[derive(Debug, Default, Clone)]
pub struct KnowledgeStore {
    sessions: BTreeMap<i64, Session>,
    segments: BTreeMap<i64, Segment>,
    tags: BTreeMap<i64, Tag>,
}

impl KnowledgeStore {
    pub fn new() -> Self { Self::default() }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut store = Self::new();
        store.absorb(snapshot)?;
        store.check_tag_refs()?;
        Ok(store)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let snapshot = read_snapshot(path)?;
        Self::from_snapshot(snapshot)
    }

    /// Load and merge every `*.json` snapshot under `dir`, in path order.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let (files, unreadable) = list_json_files(dir);
        if files.is_empty() {
            if unreadable > 0 {
                warn!(dir = %dir.display(), "snapshot directory could not be read; starting with an empty store");
            } else {
                info!(dir = %dir.display(), "no snapshot files found; starting with an empty store");
            }
            return Ok(Self::new());
        }
        let mut store = Self::new();
        for file in &files {
            debug!(file = %file.display(), "loading snapshot");
            let snapshot = read_snapshot(file)?;
            store.absorb(snapshot).with_context(|| format!("merging {}", file.display()))?;
        }
        store.check_tag_refs()?;
        info!(files = files.len(), sessions = store.sessions.len(), segments = store.segments.len(), tags = store.tags.len(), "knowledge store loaded");
        Ok(store)
    }

    fn absorb(&mut self, snapshot: Snapshot) -> Result<()> {
        for tag in snapshot.tags {
            if self.tags.contains_key(&tag.id) { return Err(Error::Store(format!("duplicate tag id {}", tag.id)).into()); }
            self.tags.insert(tag.id, tag);
        }
        for session in snapshot.sessions {
            if self.sessions.contains_key(&session.id) { return Err(Error::Store(format!("duplicate session id {}", session.id)).into()); }
            self.sessions.insert(session.id, session);
        }
        for segment in snapshot.segments {
            if self.segments.contains_key(&segment.id) { return Err(Error::Store(format!("duplicate segment id {}", segment.id)).into()); }
            self.segments.insert(segment.id, segment);
        }
        Ok(())
    }

    fn check_tag_refs(&self) -> Result<()> {
        let session_refs = self.sessions.values().flat_map(|s| s.tag_ids.iter().map(move |t| ("session", s.id, *t)));
        let segment_refs = self.segments.values().flat_map(|s| s.tag_ids.iter().map(move |t| ("segment", s.id, *t)));
        for (kind, owner, tag_id) in session_refs.chain(segment_refs) {
            if !self.tags.contains_key(&tag_id) {
                return Err(Error::Store(format!("{} {} references unknown tag {}", kind, owner, tag_id)).into());
            }
        }
        Ok(())
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> { self.sessions.values() }
    pub fn segments(&self) -> impl Iterator<Item = &Segment> { self.segments.values() }
    pub fn tags(&self) -> impl Iterator<Item = &Tag> { self.tags.values() }

    pub fn session(&self, id: i64) -> Option<&Session> { self.sessions.get(&id) }

    pub fn segments_of(&self, session_id: i64) -> Vec<&Segment> {
        let mut out: Vec<&Segment> = self.segments.values().filter(|s| s.session_id == session_id).collect();
        out.sort_by_key(|s| (s.order_index, s.id));
        out
    }

    /// Segments carrying `tag_id`, in id order.
    pub fn segments_tagged(&self, tag_id: i64) -> impl Iterator<Item = &Segment> {
        self.segments.values().filter(move |s| s.tag_ids.contains(&tag_id))
    }

    /// Comma-joined tag names, in the order the record lists them.
    pub fn tag_names(&self, tag_ids: &[i64]) -> String {
        tag_ids.iter().filter_map(|id| self.tags.get(id)).map(|t| t.name.as_str()).collect::<Vec<_>>().join(",")
    }

    /// Comma-joined tag categories; uncategorized tags contribute an empty entry.
    pub fn tag_categories(&self, tag_ids: &[i64]) -> String {
        tag_ids.iter().filter_map(|id| self.tags.get(id)).map(|t| t.category.as_deref().unwrap_or("")).collect::<Vec<_>>().join(",")
    }

    pub fn is_empty(&self) -> bool { self.sessions.is_empty() && self.segments.is_empty() }
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(snapshot)
}

/// `*.json` files under `root`, sorted, plus the number of entries that
/// could not be read (a missing root counts as one).
fn list_json_files(root: &Path) -> (Vec<PathBuf>, usize) {
    let mut files = Vec::new();
    let mut unreadable = 0usize;
    for entry in walkdir::WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable snapshot path");
                unreadable += 1;
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") { files.push(path.to_path_buf()); }
    }
    files.sort();
    (files, unreadable)
}

#[cfg(test)]
mod tests {
    use super::list_json_files;

    #[test]
    fn missing_root_is_reported_as_unreadable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (files, unreadable) = list_json_files(&tmp.path().join("typo"));
        assert!(files.is_empty());
        assert_eq!(unreadable, 1);
    }

    #[test]
    fn existing_root_lists_only_json_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("a.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "").unwrap();
        let (files, unreadable) = list_json_files(tmp.path());
        assert_eq!(unreadable, 0);
        let names: Vec<_> = files.iter().filter_map(|p| p.file_name()?.to_str()).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }
}
