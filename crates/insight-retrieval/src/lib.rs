//! # Insight Retrieval
//!
//! The narrow retrieval interface the engine consumes. Ingestion, chunking,
//! embedding and indexing live behind the retrieval service; the engine only
//! sends a query and receives scored documents.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;

pub use client::{HttpRetrievalClient, RetrievalClient, RetrievalRequest, StaticRetrievalClient};
