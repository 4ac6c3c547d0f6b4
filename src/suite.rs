//! The standard probe suite for a memory service integration.

use crate::config::Config;
use crate::harness::Harness;
use crate::probe::{
    CommandCatalogProbe, ExternalArtifactProbe, FeatureFlagProbe, RetrieveProbe, StatsProbe,
    StoreProbe, TagSearchProbe,
};

const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: &str = "8000";

/// Build the harness used by the CLI: memory operations, configuration flags, then local files.
///
/// File probes are only declared when their path is configured.
pub fn standard_harness(config: &Config) -> Harness {
    let mut harness = Harness::new(config.probe_timeout)
        .with_probe(StoreProbe::default())
        .with_probe(RetrieveProbe::default())
        .with_probe(TagSearchProbe::default())
        .with_probe(FeatureFlagProbe::new(
            "consolidation",
            "MCP_CONSOLIDATION_ENABLED",
            "memory consolidation",
            config.consolidation_enabled.clone(),
        ))
        .with_probe(StatsProbe::default())
        .with_probe(
            FeatureFlagProbe::new(
                "http_server",
                "MCP_HTTP_ENABLED",
                "HTTP server for multi-client access",
                config.http_enabled.clone(),
            )
            .with_setting(
                "host",
                config.http_host.as_deref().unwrap_or(DEFAULT_HTTP_HOST),
            )
            .with_setting(
                "port",
                config.http_port.as_deref().unwrap_or(DEFAULT_HTTP_PORT),
            ),
        );

    if let Some(path) = &config.workflow_file {
        let mut probe =
            ExternalArtifactProbe::new("workflow_file", path, config.workflow_phrase.clone());
        if let Some(legacy) = &config.legacy_phrase {
            probe = probe.with_legacy(legacy.clone());
        }
        harness = harness.with_probe(probe);
    }

    if let Some(dir) = &config.commands_dir {
        harness = harness.with_probe(CommandCatalogProbe::new("command_catalog", dir));
    }

    harness
}
