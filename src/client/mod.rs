//! Capability interface over the external memory service.
//!
//! Probes only ever see a `&dyn CapabilityClient`; the live HTTP adapter and the in-memory null
//! client are interchangeable behind it.

pub mod http;
pub mod null;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

pub use http::HttpMemoryClient;
pub use null::NullClient;
pub use types::{BackendStats, Capability, ClientError, MemoryItem, StoredMemory};

/// Operations the probes need from a memory backend.
///
/// Each call is independent of the others; a backend lacking one returns
/// [`ClientError::Unsupported`].
#[async_trait]
pub trait CapabilityClient: Send + Sync {
    /// Persist one memory and return its identifier.
    async fn store(&self, item: &MemoryItem) -> Result<String, ClientError>;

    /// Semantic search. An empty vector means nothing matched.
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<StoredMemory>, ClientError>;

    /// Exact tag match. An empty vector means nothing matched.
    async fn search_by_tag(&self, tags: &[String]) -> Result<Vec<StoredMemory>, ClientError>;

    /// Backend statistics.
    async fn stats(&self) -> Result<BackendStats, ClientError>;

    /// Release any resources held for the run.
    async fn close(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

macro_rules! forward_capability_client {
    ($wrapper:ident) => {
        #[async_trait]
        impl<T: CapabilityClient + ?Sized> CapabilityClient for $wrapper<T> {
            async fn store(&self, item: &MemoryItem) -> Result<String, ClientError> {
                (**self).store(item).await
            }

            async fn retrieve(
                &self,
                query: &str,
                limit: usize,
            ) -> Result<Vec<StoredMemory>, ClientError> {
                (**self).retrieve(query, limit).await
            }

            async fn search_by_tag(&self, tags: &[String]) -> Result<Vec<StoredMemory>, ClientError> {
                (**self).search_by_tag(tags).await
            }

            async fn stats(&self) -> Result<BackendStats, ClientError> {
                (**self).stats().await
            }

            async fn close(&self) -> Result<(), ClientError> {
                (**self).close().await
            }
        }
    };
}

forward_capability_client!(Arc);
forward_capability_client!(Box);
