//! Engine configuration
//!
//! All tuning constants of the aggregation loop, the coach boundary, and the
//! advisory policy. Every field defaults to the values observed in the demo, so
//! an empty JSON object is a valid configuration.

use crate::error::FlowError;
use crate::ivi::types::CounterDelta;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the language-model API key
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the coach proxy URL
pub const ENV_PROXY_URL: &str = "FLOWSHIELD_PROXY_URL";
/// Environment variable overriding the coach model
pub const ENV_MODEL: &str = "FLOWSHIELD_MODEL";

/// Largest accepted `aggregator.history_capacity`
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Counter increment applied per simulated event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventWeights {
    pub app_switch: u32,
    pub tab_churn: u32,
    pub oscillation: u32,
}

impl Default for EventWeights {
    fn default() -> Self {
        Self {
            app_switch: 2,
            tab_churn: 1,
            oscillation: 3,
        }
    }
}

/// A scripted burst: `steps` deltas applied every `period_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstSpec {
    pub steps: u32,
    pub period_ms: u64,
    pub delta: CounterDelta,
}

impl BurstSpec {
    pub fn chaos() -> Self {
        Self {
            steps: 5,
            period_ms: 300,
            delta: CounterDelta::new(3, 2, 2),
        }
    }

    pub fn focus() -> Self {
        Self {
            steps: 5,
            period_ms: 300,
            delta: CounterDelta::new(-4, -3, -3),
        }
    }
}

/// Aggregation loop tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Period of the score/decay tick
    pub tick_period_ms: u64,
    /// Amount subtracted from each counter per tick
    pub decay_step: u32,
    /// Number of scores retained in the history
    pub history_capacity: usize,
    /// Increments used by the convenience event methods
    pub weights: EventWeights,
    pub chaos_burst: BurstSpec,
    pub focus_burst: BurstSpec,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 2000,
            decay_step: 1,
            history_capacity: 20,
            weights: EventWeights::default(),
            chaos_burst: BurstSpec::chaos(),
            focus_burst: BurstSpec::focus(),
        }
    }
}

/// Coach boundary settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Serverless proxy route; when unset only the direct backend is used
    pub proxy_url: Option<String>,
    /// OpenAI-compatible API base URL
    pub api_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Never serialized back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            api_base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            timeout_secs: 15,
            api_key: None,
        }
    }
}

/// Advisory rule tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Score above which a deep-work spike alert fires
    pub spike_threshold: u8,
    /// How long the spike alert stays visible
    pub spike_alert_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            spike_threshold: 65,
            spike_alert_ms: 6000,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub aggregator: AggregatorConfig,
    pub coach: CoachConfig,
    pub policy: PolicyConfig,
}

impl FlowConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let config: FlowConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, FlowError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable source
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.coach.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_PROXY_URL).filter(|u| !u.trim().is_empty()) {
            self.coach.proxy_url = Some(url);
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|m| !m.trim().is_empty()) {
            self.coach.model = model;
        }
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        let agg = &self.aggregator;
        if agg.tick_period_ms == 0 {
            return Err(FlowError::InvalidConfig(
                "aggregator.tick_period_ms must be greater than zero".to_string(),
            ));
        }
        if agg.history_capacity == 0 || agg.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(FlowError::InvalidConfig(format!(
                "aggregator.history_capacity must be within 1-{MAX_HISTORY_CAPACITY}, got {}",
                agg.history_capacity
            )));
        }
        for (name, burst) in [("chaos_burst", &agg.chaos_burst), ("focus_burst", &agg.focus_burst)] {
            if burst.period_ms == 0 {
                return Err(FlowError::InvalidConfig(format!(
                    "aggregator.{name}.period_ms must be greater than zero"
                )));
            }
        }
        if self.policy.spike_threshold > 100 {
            return Err(FlowError::InvalidConfig(format!(
                "policy.spike_threshold must be within 0-100, got {}",
                self.policy.spike_threshold
            )));
        }
        if !(0.0..=2.0).contains(&self.coach.temperature) {
            return Err(FlowError::InvalidConfig(format!(
                "coach.temperature must be within 0-2, got {}",
                self.coach.temperature
            )));
        }
        Ok(())
    }
}
