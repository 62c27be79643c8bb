use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use coordination::{GateConfig, DEFAULT_ESCALATION_LOG};
use rig::providers::openai;
use serde::Deserialize;

use crate::llm::CallPolicy;

/// Hosted language-model endpoint (OpenAI-compatible).
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

/// Top-level agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub endpoint: Endpoint,
    /// Timeout and transient-retry budget for every model call.
    pub call_policy: CallPolicy,
    /// Approval threshold and attempt budget.
    pub gate: GateConfig,
    /// Snippets retrieved per attempt.
    pub max_snippets: usize,
    /// JSONL file receiving escalations (None = disabled).
    pub escalation_log: Option<PathBuf>,
    /// JSONL file receiving per-ticket metrics (None = disabled).
    pub telemetry_log: Option<PathBuf>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Path from the environment. An empty value disables the file.
fn env_path(key: &str, default: Option<&str>) -> Option<PathBuf> {
    match std::env::var(key) {
        Ok(v) if v.trim().is_empty() => None,
        Ok(v) => Some(PathBuf::from(v)),
        Err(_) => default.map(PathBuf::from),
    }
}

fn optional_path(value: String) -> Option<PathBuf> {
    if value.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        let gate_defaults = GateConfig::default();
        let policy_defaults = CallPolicy::default();
        Self {
            endpoint: Endpoint {
                url: std::env::var("TICKET_LLM_URL")
                    .unwrap_or_else(|_| "http://localhost:8317/v1".into()),
                api_key: std::env::var("TICKET_LLM_API_KEY")
                    .unwrap_or_else(|_| "not-needed".into()),
                model: std::env::var("TICKET_LLM_MODEL")
                    .unwrap_or_else(|_| "claude-3-5-sonnet".into()),
                temperature: env_or("TICKET_LLM_TEMPERATURE", 0.1),
                max_tokens: env_or("TICKET_LLM_MAX_TOKENS", 4000),
            },
            call_policy: CallPolicy {
                timeout: Duration::from_secs(env_or(
                    "TICKET_LLM_TIMEOUT_SECS",
                    policy_defaults.timeout.as_secs(),
                )),
                max_retries: env_or("TICKET_LLM_MAX_RETRIES", policy_defaults.max_retries),
            },
            gate: GateConfig {
                approval_threshold: env_or(
                    "TICKET_APPROVAL_THRESHOLD",
                    gate_defaults.approval_threshold,
                ),
                max_attempts: env_or("TICKET_MAX_ATTEMPTS", gate_defaults.max_attempts),
            },
            max_snippets: coordination::knowledge::DEFAULT_MAX_SNIPPETS,
            escalation_log: env_path("TICKET_ESCALATION_LOG", Some(DEFAULT_ESCALATION_LOG)),
            telemetry_log: env_path("TICKET_TELEMETRY_LOG", None),
        }
    }
}

/// On-disk TOML layout. Every field is optional and overrides the env/defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    endpoint: EndpointSection,
    #[serde(default)]
    gate: GateSection,
    #[serde(default)]
    logs: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EndpointSection {
    url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u64>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GateSection {
    approval_threshold: Option<f64>,
    max_attempts: Option<u32>,
    max_snippets: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSection {
    escalation_log: Option<String>,
    telemetry_log: Option<String>,
}

impl AgentConfig {
    /// Env/defaults, overridden by `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).context(format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("Failed to parse config TOML")?;
        let mut config = Self::default();
        config.apply(file);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        let ConfigFile {
            endpoint,
            gate,
            logs,
        } = file;

        if let Some(url) = endpoint.url {
            self.endpoint.url = url;
        }
        if let Some(api_key) = endpoint.api_key {
            self.endpoint.api_key = api_key;
        }
        if let Some(model) = endpoint.model {
            self.endpoint.model = model;
        }
        if let Some(temperature) = endpoint.temperature {
            self.endpoint.temperature = temperature;
        }
        if let Some(max_tokens) = endpoint.max_tokens {
            self.endpoint.max_tokens = max_tokens;
        }
        if let Some(secs) = endpoint.timeout_secs {
            self.call_policy.timeout = Duration::from_secs(secs);
        }
        if let Some(max_retries) = endpoint.max_retries {
            self.call_policy.max_retries = max_retries;
        }

        if let Some(threshold) = gate.approval_threshold {
            self.gate.approval_threshold = threshold;
        }
        if let Some(max_attempts) = gate.max_attempts {
            self.gate.max_attempts = max_attempts;
        }
        if let Some(max_snippets) = gate.max_snippets {
            self.max_snippets = max_snippets;
        }

        if let Some(path) = logs.escalation_log {
            self.escalation_log = optional_path(path);
        }
        if let Some(path) = logs.telemetry_log {
            self.telemetry_log = optional_path(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.gate.validate().context("Invalid gate settings")?;
        if !(0.0..=2.0).contains(&self.endpoint.temperature) {
            anyhow::bail!(
                "Temperature {} is outside [0, 2]",
                self.endpoint.temperature
            );
        }
        if self.max_snippets == 0 {
            anyhow::bail!("max_snippets must be at least 1");
        }
        if self.call_policy.timeout.is_zero() {
            anyhow::bail!("LLM timeout must be at least 1 second");
        }
        Ok(())
    }
}

/// Build the rig client for the configured endpoint.
pub fn build_client(endpoint: &Endpoint) -> Result<openai::CompletionsClient> {
    openai::CompletionsClient::builder()
        .api_key(&endpoint.api_key)
        .base_url(&endpoint.url)
        .build()
        .context(format!("Failed to build LLM client for {}", endpoint.url))
}

/// Check if an inference endpoint is reachable (GET /models).
pub async fn check_endpoint(url: &str) -> bool {
    let models_url = format!("{}/models", url.trim_end_matches('/'));
    match reqwest::Client::new()
        .get(&models_url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}
