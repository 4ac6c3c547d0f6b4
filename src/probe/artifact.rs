//! Read-only checks against local files: workflow documents and command catalogs.

use super::{Outcome, Precondition, Probe, ProbeError};
use crate::client::CapabilityClient;
use async_trait::async_trait;
use serde_json::json;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const COMMAND_PREFIX: &str = "memory-";

/// Checks that a file references a required phrase.
///
/// PASS when the phrase is present, WARN when the file lacks it, SKIP when the file is absent.
pub struct ExternalArtifactProbe {
    name: String,
    path: PathBuf,
    required: String,
    legacy: Option<String>,
}

impl ExternalArtifactProbe {
    /// Probe requiring `required` inside the file at `path`.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        required: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            required: required.into(),
            legacy: None,
        }
    }

    /// Phrase indicating the file still points at a superseded integration.
    pub fn with_legacy(mut self, legacy: impl Into<String>) -> Self {
        self.legacy = Some(legacy.into()).filter(|phrase: &String| !phrase.is_empty());
        self
    }
}

#[async_trait]
impl Probe for ExternalArtifactProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn precondition(&self) -> Precondition {
        Precondition::FileExists(self.path.clone())
    }

    async fn run(&self, _client: &dyn CapabilityClient) -> Result<Outcome, ProbeError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Outcome::skip(format!("{} not found", self.path.display())));
            }
            Err(err) if err.kind() == ErrorKind::IsADirectory => {
                return Ok(Outcome::skip(format!("{} is not a file", self.path.display())));
            }
            Err(source) => {
                return Err(ProbeError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let content = String::from_utf8_lossy(&bytes);
        let path = self.path.display().to_string();
        let detail = json!({ "path": path, "required": self.required });
        if content.contains(&self.required) {
            return Ok(
                Outcome::pass(format!("{path} references {}", self.required)).with_detail(detail)
            );
        }

        let message = match self.legacy.as_deref() {
            Some(legacy) if content.contains(legacy) => {
                format!("{path} still references {legacy}")
            }
            _ => format!("{path} does not reference {}", self.required),
        };
        Ok(Outcome::warn(message).with_detail(detail))
    }
}

/// Lists `*.md` command definitions in a directory.
///
/// PASS with the command names, WARN when the directory holds none, SKIP when it is absent.
pub struct CommandCatalogProbe {
    name: String,
    dir: PathBuf,
}

impl CommandCatalogProbe {
    /// Probe scanning `dir`; each file `<stem>.md` is reported as `/memory-<stem>`.
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }
}

#[async_trait]
impl Probe for CommandCatalogProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn precondition(&self) -> Precondition {
        Precondition::DirExists(self.dir.clone())
    }

    async fn run(&self, _client: &dyn CapabilityClient) -> Result<Outcome, ProbeError> {
        let dir = self.dir.clone();
        let stems = tokio::task::spawn_blocking(move || command_stems(&dir))
            .await
            .map_err(|err| ProbeError::Panicked(err.to_string()))?
            .map_err(|source| ProbeError::Io {
                path: self.dir.clone(),
                source,
            })?;

        if stems.is_empty() {
            return Ok(Outcome::warn(format!(
                "no commands found in {}",
                self.dir.display()
            )));
        }

        let commands: Vec<String> = stems
            .iter()
            .map(|stem| format!("/{COMMAND_PREFIX}{stem}"))
            .collect();
        Ok(
            Outcome::pass(format!("found {} commands: {}", commands.len(), commands.join(", ")))
                .with_detail(json!({ "commands": commands })),
        )
    }
}

fn command_stems(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut stems = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| {
            err.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory loop"))
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == "md")
            && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
        {
            stems.push(stem.to_string());
        }
    }
    stems.sort();
    Ok(stems)
}
