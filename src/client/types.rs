//! Shared types exchanged with memory-service clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Operations a memory backend may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Persist a single memory.
    Store,
    /// Semantic (best-effort) search.
    Retrieve,
    /// Exact tag match.
    SearchByTag,
    /// Backend statistics.
    Stats,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Store => "store",
            Self::Retrieve => "retrieve",
            Self::SearchByTag => "search_by_tag",
            Self::Stats => "stats",
        })
    }
}

/// Errors returned by a [`super::CapabilityClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend could not be reached or answered with a server-side failure.
    #[error("memory service unavailable: {0}")]
    Unavailable(String),
    /// Input was rejected as malformed.
    #[error("invalid request: {0}")]
    Validation(String),
    /// Backend does not implement the requested operation.
    #[error("operation not supported by backend: {0}")]
    Unsupported(Capability),
}

/// Memory submitted to the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryItem {
    /// Text body of the memory.
    pub content: String,
    /// Labels used for exact-match search.
    pub tags: Vec<String>,
    /// Free-form metadata persisted alongside the content.
    pub metadata: Map<String, Value>,
    /// Optional memory classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<String>,
}

impl MemoryItem {
    /// Reject items the backend would refuse anyway.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.content.trim().is_empty() {
            return Err(ClientError::Validation(
                "memory content must not be empty".into(),
            ));
        }
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ClientError::Validation("tags must not be blank".into()));
        }
        Ok(())
    }
}

/// Memory returned from a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMemory {
    /// Backend identifier (content hash for the MCP memory service).
    pub id: String,
    /// Text body.
    pub content: String,
    /// Labels attached at store time.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Similarity score, when the search produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl StoredMemory {
    /// First `max_chars` characters of the content, for previews.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Backend statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStats {
    /// Number of memories currently stored.
    pub total_items: u64,
    /// Name of the storage engine behind the service.
    pub backend_name: String,
}
