//! Bounded language-model calls and JSON reply extraction.

use std::time::Duration;

use rig::completion::Prompt;
use serde_json::Value;
use tracing::warn;

use crate::errors::{AgentError, AgentRole};

/// Timeout and transient-retry budget applied to every agent call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    /// Upper bound for the whole call, retries included.
    pub timeout: Duration,
    /// Retries on transient / rate-limit errors.
    pub max_retries: u32,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_retries: 2,
        }
    }
}

/// Prompt `agent`, retrying transient failures with exponential backoff.
pub async fn prompt_with_retry(
    agent: &impl Prompt,
    prompt: &str,
    role: AgentRole,
    max_retries: u32,
) -> Result<String, AgentError> {
    let mut attempt = 0;
    loop {
        match agent.prompt(prompt).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                let err = AgentError::inference(role, e.to_string());
                if !err.is_retriable() || attempt >= max_retries {
                    return Err(err);
                }

                let backoff = err.retry_category().backoff(attempt);
                warn!(
                    %role,
                    attempt = attempt + 1,
                    max_retries,
                    backoff_secs = backoff.as_secs(),
                    error = %err,
                    "Transient error: retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

/// [`prompt_with_retry`] under the policy's overall timeout.
pub async fn prompt_bounded(
    agent: &impl Prompt,
    prompt: &str,
    role: AgentRole,
    policy: &CallPolicy,
) -> Result<String, AgentError> {
    match tokio::time::timeout(
        policy.timeout,
        prompt_with_retry(agent, prompt, role, policy.max_retries),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(AgentError::Timeout {
            role,
            secs: policy.timeout.as_secs(),
        }),
    }
}

/// Locate the JSON object in a model reply.
///
/// Prefers a fenced ```json block, otherwise takes the first `{` through the
/// last `}`.
pub fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        if let Some(end) = text[json_start..].find("```") {
            return Some(text[json_start..json_start + end].trim());
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Parse the JSON object embedded in a model reply.
pub fn parse_json_reply(role: AgentRole, text: &str) -> Result<Value, AgentError> {
    let block = extract_json_block(text)
        .ok_or_else(|| AgentError::parse(role, "no JSON object in reply"))?;
    let value: Value =
        serde_json::from_str(block).map_err(|e| AgentError::parse(role, e.to_string()))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(AgentError::parse(role, "reply JSON is not an object"))
    }
}

/// Read a number that models sometimes emit as a string.
pub fn json_f64(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
