//! Probes exercising the memory service capabilities.

use super::{Outcome, Probe, ProbeError};
use crate::client::{CapabilityClient, MemoryItem, StoredMemory};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use time::{OffsetDateTime, macros::format_description};

const PREVIEW_COUNT: usize = 2;
const PREVIEW_CHARS: usize = 100;

/// Stores one well-formed memory.
pub struct StoreProbe {
    name: String,
    item: MemoryItem,
}

impl StoreProbe {
    /// Probe storing `item`.
    pub fn new(name: impl Into<String>, item: MemoryItem) -> Self {
        Self {
            name: name.into(),
            item,
        }
    }

    /// Item submitted on each run.
    pub fn item(&self) -> &MemoryItem {
        &self.item
    }
}

impl Default for StoreProbe {
    fn default() -> Self {
        let mut metadata = Map::new();
        metadata.insert("type".into(), Value::String("system".into()));
        metadata.insert("importance".into(), Value::String("high".into()));
        metadata.insert("timestamp".into(), Value::String(today()));
        Self::new(
            "store",
            MemoryItem {
                content: "Automation Hub migrated to MCP Memory Service successfully".into(),
                tags: vec!["automation-hub".into(), "migration".into(), "test".into()],
                metadata,
                memory_type: Some("system".into()),
            },
        )
    }
}

#[async_trait]
impl Probe for StoreProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, client: &dyn CapabilityClient) -> Result<Outcome, ProbeError> {
        let id = client.store(&self.item).await?;
        tracing::debug!(probe = %self.name, %id, "Stored probe memory");
        Ok(Outcome::pass(format!("memory stored with id {id}")).with_detail(json!({ "id": id })))
    }
}

/// Runs a semantic query. Empty results are a warning: a fresh store is a valid state.
pub struct RetrieveProbe {
    name: String,
    query: String,
    limit: usize,
}

impl RetrieveProbe {
    /// Probe running `query` with at most `limit` results.
    pub fn new(name: impl Into<String>, query: impl Into<String>, limit: usize) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            limit,
        }
    }
}

impl Default for RetrieveProbe {
    fn default() -> Self {
        Self::new("retrieve", "automation migration", 5)
    }
}

#[async_trait]
impl Probe for RetrieveProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, client: &dyn CapabilityClient) -> Result<Outcome, ProbeError> {
        let hits = client.retrieve(&self.query, self.limit).await?;
        Ok(search_outcome(
            &hits,
            format!("found {} relevant memories", hits.len()),
            "no results (normal for a fresh installation)",
            json!({ "query": self.query }),
        ))
    }
}

/// Searches by a fixed tag set, with the same PASS/WARN split as [`RetrieveProbe`].
pub struct TagSearchProbe {
    name: String,
    tags: Vec<String>,
}

impl TagSearchProbe {
    /// Probe searching for any of `tags`.
    pub fn new(name: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tags,
        }
    }
}

impl Default for TagSearchProbe {
    fn default() -> Self {
        Self::new("search_by_tag", vec!["automation-hub".into()])
    }
}

#[async_trait]
impl Probe for TagSearchProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, client: &dyn CapabilityClient) -> Result<Outcome, ProbeError> {
        let hits = client.search_by_tag(&self.tags).await?;
        let tags = self.tags.join(", ");
        Ok(search_outcome(
            &hits,
            format!("found {} memories tagged {tags}", hits.len()),
            "no tagged memories found yet",
            json!({ "tags": self.tags }),
        ))
    }
}

/// Fetches backend statistics.
pub struct StatsProbe {
    name: String,
}

impl StatsProbe {
    /// Probe reporting under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for StatsProbe {
    fn default() -> Self {
        Self::new("stats")
    }
}

#[async_trait]
impl Probe for StatsProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, client: &dyn CapabilityClient) -> Result<Outcome, ProbeError> {
        let stats = client.stats().await?;
        Ok(Outcome::pass(format!(
            "backend {} is healthy with {} memories",
            stats.backend_name, stats.total_items
        ))
        .with_detail(json!({
            "total_items": stats.total_items,
            "backend": stats.backend_name,
        })))
    }
}

fn search_outcome(
    hits: &[StoredMemory],
    found: String,
    empty: &str,
    mut detail: Value,
) -> Outcome {
    detail["count"] = json!(hits.len());
    if hits.is_empty() {
        return Outcome::warn(empty).with_detail(detail);
    }
    let previews: Vec<String> = hits
        .iter()
        .take(PREVIEW_COUNT)
        .map(|hit| hit.preview(PREVIEW_CHARS))
        .collect();
    detail["previews"] = json!(previews);
    Outcome::pass(found).with_detail(detail)
}

fn today() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::null::Fault;
    use crate::client::{Capability, ClientError, NullClient};
    use crate::report::CheckStatus;

    fn stored(content: &str, tags: &[&str]) -> StoredMemory {
        StoredMemory {
            id: content.len().to_string(),
            content: content.into(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            score: None,
        }
    }

    #[test]
    fn default_store_item_is_well_formed() {
        let probe = StoreProbe::default();
        assert!(probe.item().validate().is_ok());
        assert_eq!(probe.item().tags.len(), 3);
        let timestamp = probe.item().metadata["timestamp"].as_str().expect("date");
        assert_eq!(timestamp.len(), 10);
    }

    #[tokio::test]
    async fn store_passes_with_generated_id() {
        let client = NullClient::new();
        let outcome = StoreProbe::default().run(&client).await.expect("outcome");
        assert_eq!(outcome.status(), CheckStatus::Pass);
        assert_eq!(client.store_count(), 1);
    }

    #[tokio::test]
    async fn store_error_propagates() {
        let client = NullClient::new().with_fault(Capability::Store, Fault::Unavailable);
        let err = StoreProbe::default()
            .run(&client)
            .await
            .expect_err("store fails");
        assert!(matches!(err, ProbeError::Client(ClientError::Unavailable(_))));
    }

    #[tokio::test]
    async fn empty_retrieval_warns() {
        let outcome = RetrieveProbe::default()
            .run(&NullClient::new())
            .await
            .expect("outcome");
        assert_eq!(outcome.status(), CheckStatus::Warn);
        let result = outcome.into_result("retrieve");
        assert!(result.message().starts_with("no results"));
        assert_eq!(result.detail().expect("detail")["count"], 0);
    }

    #[tokio::test]
    async fn retrieval_hits_pass_with_previews() {
        let long = "automation ".repeat(20);
        let client = NullClient::with_memories(vec![
            stored(&long, &[]),
            stored("migration notes", &[]),
            stored("automation migration", &[]),
        ]);
        let result = RetrieveProbe::default()
            .run(&client)
            .await
            .expect("outcome")
            .into_result("retrieve");
        assert_eq!(result.status(), CheckStatus::Pass);
        let detail = result.detail().expect("detail");
        assert_eq!(detail["count"], 3);
        let previews = detail["previews"].as_array().expect("previews");
        assert_eq!(previews.len(), PREVIEW_COUNT);
        assert!(
            previews
                .iter()
                .all(|p| p.as_str().expect("str").chars().count() <= PREVIEW_CHARS + 3)
        );
    }

    #[tokio::test]
    async fn tag_search_splits_pass_and_warn() {
        let probe = TagSearchProbe::default();
        let empty = probe.run(&NullClient::new()).await.expect("outcome");
        assert_eq!(empty.status(), CheckStatus::Warn);

        let client = NullClient::with_memories(vec![stored("x", &["automation-hub"])]);
        let found = probe.run(&client).await.expect("outcome");
        assert_eq!(found.status(), CheckStatus::Pass);
    }

    #[tokio::test]
    async fn stats_reports_backend() {
        let client = NullClient::with_memories(vec![stored("x", &[])]);
        let result = StatsProbe::default()
            .run(&client)
            .await
            .expect("outcome")
            .into_result("stats");
        assert_eq!(result.status(), CheckStatus::Pass);
        assert_eq!(result.detail().expect("detail")["total_items"], 1);
        assert_eq!(result.detail().expect("detail")["backend"], "null");
    }
}
