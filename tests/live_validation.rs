use std::sync::Once;

use memprobe::{
    client::{CapabilityClient, HttpMemoryClient},
    config::Config,
    report::Overall,
    suite,
};

static INIT: Once = Once::new();

fn load_config() -> Config {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
    });
    Config::from_env().expect("valid configuration")
}

#[tokio::test]
#[ignore = "Requires a live MCP memory service"]
async fn live_stats_reachable() {
    let config = load_config();
    let client = HttpMemoryClient::from_config(&config).expect("client");
    let stats = client.stats().await.expect("memory service should be reachable");
    assert!(!stats.backend_name.is_empty(), "backend name missing: {stats:?}");
}

#[tokio::test]
#[ignore = "Requires a live MCP memory service"]
async fn live_standard_suite_passes() {
    let config = load_config();
    let report = suite::standard_harness(&config)
        .run(|| async { HttpMemoryClient::from_config(&config) })
        .await;
    assert_eq!(
        report.overall(),
        Overall::Pass,
        "live run failed: {report:#?}"
    );
}
