//! Configuration flag reporting.

use super::{Outcome, Probe, ProbeError};
use crate::client::CapabilityClient;
use async_trait::async_trait;
use serde_json::{Map, Value, json};

/// The only value treated as "enabled".
pub const TRUTHY: &str = "true";

/// Reports whether a feature flag is enabled. Never touches the client.
///
/// The flag value is captured when the probe is built, so a run never reads process-wide state.
pub struct FeatureFlagProbe {
    name: String,
    flag: String,
    description: String,
    value: Option<String>,
    settings: Vec<(String, String)>,
}

impl FeatureFlagProbe {
    /// Probe for `flag`, whose current value is `value`.
    pub fn new(
        name: impl Into<String>,
        flag: impl Into<String>,
        description: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            flag: flag.into(),
            description: description.into(),
            value,
            settings: Vec::new(),
        }
    }

    /// Add a related setting reported alongside an enabled flag.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.push((key.into(), value.into()));
        self
    }

    /// Whether the captured value is exactly [`TRUTHY`].
    pub fn is_enabled(&self) -> bool {
        self.value.as_deref() == Some(TRUTHY)
    }
}

#[async_trait]
impl Probe for FeatureFlagProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _client: &dyn CapabilityClient) -> Result<Outcome, ProbeError> {
        let settings: Map<String, Value> = self
            .settings
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        let detail = json!({
            "flag": self.flag,
            "value": self.value,
            "settings": settings,
        });

        if !self.is_enabled() {
            return Ok(Outcome::warn(format!(
                "{} is disabled (set {}={TRUTHY} to enable)",
                self.description, self.flag
            ))
            .with_detail(detail));
        }

        let mut message = format!("{} is enabled", self.description);
        if !self.settings.is_empty() {
            let rendered: Vec<String> = self
                .settings
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            message.push_str(&format!(" ({})", rendered.join(", ")));
        }
        Ok(Outcome::pass(message).with_detail(detail))
    }
}
