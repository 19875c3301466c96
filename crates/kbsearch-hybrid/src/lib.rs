//! kbsearch-hybrid
//!
//! Unified search over the keyword and vector providers: strategy selection,
//! result merging and the public result format.
pub mod format;
pub mod merge;
pub mod search;
pub mod strategy;

pub use format::Formatter;
pub use merge::merge;
pub use search::{half_limit, UnifiedSearch};
pub use strategy::{select_strategy, StrategySelector};
