//! kbsearch-store
//!
//! In-memory knowledge store (sessions, segments, tags) loaded from JSON
//! snapshots, and the substring keyword provider built on top of it.
pub mod keyword;
pub mod records;
pub mod store;

pub use keyword::KeywordSearch;
pub use records::{Segment, Session, Snapshot, Tag};
pub use store::KnowledgeStore;
