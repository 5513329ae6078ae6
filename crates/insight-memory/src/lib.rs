//! # Insight Memory
//!
//! The long-term memory collaborators of the memory agent: an embeddings
//! interface and a memory store supporting suggest/store/recall. The default
//! in-process implementation keeps records in memory and embeds with a
//! deterministic feature hasher, which is enough for recall ranking in tests
//! and keyless deployments; production deployments plug a real embeddings
//! service and a persistent store behind the same traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod embeddings;
pub mod store;

pub use embeddings::{EmbeddingsService, HashingEmbeddings};
pub use store::{InMemoryMemoryStore, MemoryStore, StoredMemory, SuggestedMemory};
