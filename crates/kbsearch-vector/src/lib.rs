//! kbsearch-vector
//!
//! Persisted embedding index on LanceDB. [`LanceVectorProvider`] is the
//! `VectorSearchProvider` used by the orchestrator; [`sync_store`] keeps the
//! index in step with the knowledge store.
pub mod document;
pub mod index;
pub mod provider;
pub mod schema;
pub mod sync;

pub use document::{collect_documents, document_id, IndexDocument};
pub use index::{IndexStats, LanceVectorIndex};
pub use provider::LanceVectorProvider;
pub use sync::{sync_store, SyncReport};
