//! Probe contract and the standard checks.
//!
//! A probe is a named, stateless check. Its body returns an [`Outcome`]; the harness attaches
//! the probe name, so every probe yields exactly one [`CheckResult`] per run.

pub mod artifact;
pub mod flag;
pub mod memory;

use crate::client::{CapabilityClient, ClientError};
use crate::report::{CheckResult, CheckStatus};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use artifact::{CommandCatalogProbe, ExternalArtifactProbe};
pub use flag::{FeatureFlagProbe, TRUTHY};
pub use memory::{RetrieveProbe, StatsProbe, StoreProbe, TagSearchProbe};

/// Failures raised by a probe body. The harness downgrades all of them to FAIL results.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The memory backend returned an error.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The probe did not finish within its bound.
    #[error("timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    /// A local file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The probe body panicked.
    #[error("probe panicked: {0}")]
    Panicked(String),
}

impl ProbeError {
    /// Short machine-readable classification.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Client(ClientError::Unavailable(_)) => "unavailable",
            Self::Client(ClientError::Validation(_)) => "validation",
            Self::Client(ClientError::Unsupported(_)) => "unsupported",
            Self::Timeout(_) => "timeout",
            Self::Io { .. } => "io",
            Self::Panicked(_) => "panic",
        }
    }
}

/// Condition that must hold for a probe body to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Always run.
    Always,
    /// Run only when the captured flag value equals [`TRUTHY`].
    EnvFlag {
        /// Variable name, for the skip message.
        name: String,
        /// Value captured when the harness was built.
        value: Option<String>,
    },
    /// Run only when the path is a regular file.
    FileExists(PathBuf),
    /// Run only when the path is a directory.
    DirExists(PathBuf),
}

/// Reason a probe was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreconditionUnmet(pub String);

impl fmt::Display for PreconditionUnmet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Precondition {
    /// Evaluate the precondition.
    pub fn check(&self) -> Result<(), PreconditionUnmet> {
        match self {
            Self::Always => Ok(()),
            Self::EnvFlag { name, value } => {
                if value.as_deref() == Some(TRUTHY) {
                    Ok(())
                } else {
                    Err(PreconditionUnmet(format!("requires {name}={TRUTHY}")))
                }
            }
            Self::FileExists(path) => {
                if path.is_file() {
                    Ok(())
                } else if path.exists() {
                    Err(PreconditionUnmet(format!("{} is not a file", path.display())))
                } else {
                    Err(PreconditionUnmet(format!("{} not found", path.display())))
                }
            }
            Self::DirExists(path) => {
                if path.is_dir() {
                    Ok(())
                } else if path.exists() {
                    Err(PreconditionUnmet(format!("{} is not a directory", path.display())))
                } else {
                    Err(PreconditionUnmet(format!("{} not found", path.display())))
                }
            }
        }
    }
}

/// Result of a probe body before the harness names it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    status: CheckStatus,
    message: String,
    detail: Option<Value>,
}

impl Outcome {
    fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    /// Passing outcome.
    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Pass, message)
    }

    /// Warning outcome.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Warn, message)
    }

    /// Skipped outcome decided inside the body.
    pub fn skip(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Skip, message)
    }

    /// Attach a structured payload.
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Status carried by this outcome.
    pub fn status(&self) -> CheckStatus {
        self.status
    }

    /// Name the outcome, producing the final result.
    pub fn into_result(self, name: &str) -> CheckResult {
        let result = CheckResult::new(name, self.status, self.message);
        match self.detail {
            Some(detail) => result.with_detail(detail),
            None => result,
        }
    }
}

/// A single named check against the memory service or the local environment.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Stable name used in reports.
    fn name(&self) -> &str;

    /// Condition evaluated before the body runs.
    fn precondition(&self) -> Precondition {
        Precondition::Always
    }

    /// Execute the check.
    async fn run(&self, client: &dyn CapabilityClient) -> Result<Outcome, ProbeError>;
}

/// Probe wrapper adding a precondition to any other probe.
pub struct Gated<P> {
    inner: P,
    precondition: Precondition,
}

#[async_trait]
impl<P: Probe> Probe for Gated<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn precondition(&self) -> Precondition {
        self.precondition.clone()
    }

    async fn run(&self, client: &dyn CapabilityClient) -> Result<Outcome, ProbeError> {
        self.inner.run(client).await
    }
}

/// Builder helpers available on every probe.
pub trait ProbeExt: Probe + Sized {
    /// Run this probe only when `precondition` holds.
    fn gated(self, precondition: Precondition) -> Gated<Self> {
        Gated {
            inner: self,
            precondition,
        }
    }
}

impl<P: Probe> ProbeExt for P {}
