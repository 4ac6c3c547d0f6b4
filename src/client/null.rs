//! In-memory client used by tests and dry runs.
//!
//! Writes are acknowledged but discarded, so searches only ever see the preloaded memories and
//! repeated runs observe identical backend state.

use super::{BackendStats, Capability, CapabilityClient, ClientError, MemoryItem, StoredMemory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;

/// Failure a [`NullClient`] should simulate for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Return [`ClientError::Unavailable`].
    Unavailable,
    /// Return [`ClientError::Unsupported`].
    Unsupported,
    /// Never complete.
    Hang,
}

/// Backend that serves a fixed set of memories and never touches the network.
#[derive(Default)]
pub struct NullClient {
    memories: Vec<StoredMemory>,
    faults: HashMap<Capability, Fault>,
    stores: AtomicU64,
    closed: AtomicBool,
}

impl NullClient {
    /// Empty client with every capability working.
    pub fn new() -> Self {
        Self::default()
    }

    /// Client preloaded with the given memories.
    pub fn with_memories(memories: Vec<StoredMemory>) -> Self {
        Self {
            memories,
            ..Self::default()
        }
    }

    /// Make `capability` fail with `fault` on every call.
    pub fn with_fault(mut self, capability: Capability, fault: Fault) -> Self {
        self.faults.insert(capability, fault);
        self
    }

    /// Whether [`CapabilityClient::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of store calls acknowledged so far.
    pub fn store_count(&self) -> u64 {
        self.stores.load(Ordering::SeqCst)
    }

    async fn check(&self, capability: Capability) -> Result<(), ClientError> {
        match self.faults.get(&capability) {
            None => Ok(()),
            Some(Fault::Unavailable) => Err(ClientError::Unavailable(format!(
                "simulated outage during {capability}"
            ))),
            Some(Fault::Unsupported) => Err(ClientError::Unsupported(capability)),
            Some(Fault::Hang) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl CapabilityClient for NullClient {
    async fn store(&self, item: &MemoryItem) -> Result<String, ClientError> {
        self.check(Capability::Store).await?;
        item.validate()?;
        self.stores.fetch_add(1, Ordering::SeqCst);
        Ok(Uuid::new_v4().to_string())
    }

    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<StoredMemory>, ClientError> {
        self.check(Capability::Retrieve).await?;
        let terms: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<StoredMemory> = self
            .memories
            .iter()
            .filter_map(|memory| {
                let content = memory.content.to_lowercase();
                let matched = terms.iter().filter(|term| content.contains(*term)).count();
                (matched > 0).then(|| StoredMemory {
                    score: Some(matched as f32 / terms.len() as f32),
                    ..memory.clone()
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn search_by_tag(&self, tags: &[String]) -> Result<Vec<StoredMemory>, ClientError> {
        self.check(Capability::SearchByTag).await?;
        if tags.is_empty() {
            return Err(ClientError::Validation("at least one tag is required".into()));
        }
        Ok(self
            .memories
            .iter()
            .filter(|memory| memory.tags.iter().any(|tag| tags.contains(tag)))
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<BackendStats, ClientError> {
        self.check(Capability::Stats).await?;
        Ok(BackendStats {
            total_items: self.memories.len() as u64,
            backend_name: "null".into(),
        })
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(content: &str, tags: &[&str]) -> StoredMemory {
        StoredMemory {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            score: None,
        }
    }

    #[tokio::test]
    async fn stores_are_acknowledged_but_not_searchable() {
        let client = NullClient::new();
        let item = MemoryItem {
            content: "Automation hub migration done".into(),
            tags: vec!["automation-hub".into()],
            ..Default::default()
        };
        let id = client.store(&item).await.expect("store");
        assert!(!id.is_empty());
        assert_eq!(client.store_count(), 1);

        assert!(client.retrieve("migration", 5).await.expect("retrieve").is_empty());
        assert_eq!(client.stats().await.expect("stats").total_items, 0);
    }

    #[tokio::test]
    async fn preloaded_memories_are_searchable() {
        let client = NullClient::with_memories(vec![
            memory("Automation hub migration done", &["automation-hub"]),
            memory("grocery list", &["personal"]),
        ]);
        let hits = client.retrieve("migration", 5).await.expect("retrieve");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "Automation hub migration done");

        let tagged = client
            .search_by_tag(&["automation-hub".into()])
            .await
            .expect("tag search");
        assert_eq!(tagged.len(), 1);
        assert_eq!(client.stats().await.expect("stats").total_items, 2);
    }

    #[tokio::test]
    async fn retrieve_ranks_and_limits() {
        let client = NullClient::with_memories(vec![
            memory("automation only", &[]),
            memory("automation migration", &[]),
            memory("unrelated", &[]),
        ]);
        let hits = client
            .retrieve("automation migration", 1)
            .await
            .expect("retrieve");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "automation migration");
    }

    #[tokio::test]
    async fn empty_matches_are_not_errors() {
        let client = NullClient::new();
        assert!(client.retrieve("anything", 5).await.expect("ok").is_empty());
        assert!(
            client
                .search_by_tag(&["missing".into()])
                .await
                .expect("ok")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn faults_are_injected_per_capability() {
        let client = NullClient::new()
            .with_fault(Capability::Stats, Fault::Unavailable)
            .with_fault(Capability::Retrieve, Fault::Unsupported);
        assert!(matches!(
            client.stats().await,
            Err(ClientError::Unavailable(_))
        ));
        assert!(matches!(
            client.retrieve("q", 1).await,
            Err(ClientError::Unsupported(Capability::Retrieve))
        ));
        assert!(client.search_by_tag(&["t".into()]).await.is_ok());
    }

    #[tokio::test]
    async fn malformed_store_is_a_validation_error() {
        let client = NullClient::new();
        let result = client.store(&MemoryItem::default()).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert_eq!(client.store_count(), 0);
    }
}
