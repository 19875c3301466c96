//! kbsearch-core
//!
//! Shared vocabulary of the knowledge-base search workspace: candidate and
//! result types, the provider traits the orchestrator composes, the error
//! type, and Figment-backed configuration.
pub mod config;
pub mod error;
pub mod traits;
pub mod types;
