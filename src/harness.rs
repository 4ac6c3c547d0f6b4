//! Sequential probe execution and aggregation.
//!
//! The harness is the only place probe failures are caught. Errors, panics and timeouts are all
//! downgraded to FAIL results so a run always completes with one result per declared probe. The
//! single exception is failing to acquire the client, which yields a one-entry report.

use crate::client::{CapabilityClient, ClientError};
use crate::probe::{Probe, ProbeError};
use crate::report::{CheckResult, RunReport};
use futures_util::FutureExt;
use serde_json::json;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Name of the result emitted when the client cannot be acquired.
pub const ACQUIRE_CHECK: &str = "acquire_client";

/// Ordered set of probes plus the bound applied to each of them.
pub struct Harness {
    probes: Vec<Box<dyn Probe>>,
    probe_timeout: Duration,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PROBE_TIMEOUT)
    }
}

impl Harness {
    /// Empty harness bounding each probe (and client acquisition) by `probe_timeout`.
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            probes: Vec::new(),
            probe_timeout,
        }
    }

    /// Append a probe; probes run in the order they are added.
    pub fn with_probe<P: Probe + 'static>(mut self, probe: P) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    /// Number of declared probes.
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// Whether no probes are declared.
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Declared probe names, in execution order.
    pub fn probe_names(&self) -> Vec<&str> {
        self.probes.iter().map(|probe| probe.name()).collect()
    }

    /// Acquire a client, run every probe against it, release it, and report.
    pub async fn run<F, Fut, C>(&self, acquire: F) -> RunReport
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, ClientError>>,
        C: CapabilityClient,
    {
        let started = Instant::now();
        let started_at = timestamp_now();

        let client = match tokio::time::timeout(self.probe_timeout, acquire()).await {
            Ok(Ok(client)) => client,
            Ok(Err(err)) => return acquisition_failure(err.to_string(), started_at, started),
            Err(_) => {
                let err = ProbeError::Timeout(self.probe_timeout);
                return acquisition_failure(err.to_string(), started_at, started);
            }
        };

        let results = self.run_probes(&client).await;

        if let Err(error) = client.close().await {
            tracing::warn!(%error, "Failed to release memory client");
        }

        let report = RunReport::new(results, started_at, elapsed_ms(started));
        tracing::info!(
            overall = ?report.overall(),
            checks = report.results().len(),
            elapsed_ms = report.elapsed_ms(),
            "Probe run finished"
        );
        report
    }

    /// Run every probe against a client the caller owns; the client is not closed.
    pub async fn run_with(&self, client: &dyn CapabilityClient) -> RunReport {
        let started = Instant::now();
        let started_at = timestamp_now();
        let results = self.run_probes(client).await;
        RunReport::new(results, started_at, elapsed_ms(started))
    }

    async fn run_probes(&self, client: &dyn CapabilityClient) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(self.probes.len());
        for probe in &self.probes {
            results.push(self.run_probe(probe.as_ref(), client).await);
        }
        results
    }

    async fn run_probe(&self, probe: &dyn Probe, client: &dyn CapabilityClient) -> CheckResult {
        let name = probe.name();
        if let Err(unmet) = probe.precondition().check() {
            tracing::debug!(probe = name, reason = %unmet, "Probe skipped");
            return CheckResult::skip(name, unmet.to_string());
        }

        tracing::debug!(probe = name, "Running probe");
        let body = AssertUnwindSafe(probe.run(client)).catch_unwind();
        let outcome = match tokio::time::timeout(self.probe_timeout, body).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(panic)) => Err(ProbeError::Panicked(panic_message(panic))),
            Err(_) => Err(ProbeError::Timeout(self.probe_timeout)),
        };

        match outcome {
            Ok(outcome) => {
                let result = outcome.into_result(name);
                tracing::debug!(probe = name, status = %result.status(), "Probe finished");
                result
            }
            Err(error) => {
                tracing::warn!(probe = name, kind = error.kind(), %error, "Probe failed");
                CheckResult::fail(name, error.to_string())
                    .with_detail(json!({ "error_kind": error.kind() }))
            }
        }
    }
}

fn acquisition_failure(message: String, started_at: String, started: Instant) -> RunReport {
    tracing::error!(error = %message, "Failed to acquire memory client");
    RunReport::new(
        vec![
            CheckResult::fail(ACQUIRE_CHECK, message)
                .with_detail(json!({ "error_kind": "acquisition" })),
        ],
        started_at,
        elapsed_ms(started),
    )
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
