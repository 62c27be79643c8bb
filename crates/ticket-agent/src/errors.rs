//! Agent error taxonomy with retry classification.
//!
//! Every failure of a language-model call is represented here. Callers can
//! query `is_retriable()` / `retry_category()` without string matching.
//!
//! ## Retry categories
//!
//! | Category     | Retriable | Backoff        |
//! |--------------|-----------|----------------|
//! | Transient    | yes       | 2s, 4s, 8s ... |
//! | RateLimit    | yes       | 4s, 8s, 16s ...|
//! | ParseFailure | no        | -              |
//! | Permanent    | no        | -              |
//!
//! None of these errors is fatal to a ticket: the resolver substitutes a
//! fallback classification, draft, or review and keeps going.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Which agent role produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    Classifier,
    Drafter,
    Reviewer,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classifier => "classifier",
            Self::Drafter => "drafter",
            Self::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification used by the call wrapper to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    /// Network / backend hiccup: retry with backoff.
    Transient,
    /// Provider rate limit: retry with a longer backoff.
    RateLimit,
    /// Model answered but the reply did not match the expected shape.
    ParseFailure,
    /// Auth, bad request, unknown model: retrying will not help.
    Permanent,
}

impl RetryCategory {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimit)
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(self, attempt: u32) -> Duration {
        match self {
            Self::Transient => Duration::from_secs(2u64.pow(attempt + 1)),
            Self::RateLimit => Duration::from_secs(2u64.pow(attempt + 2)),
            Self::ParseFailure | Self::Permanent => Duration::ZERO,
        }
    }

    /// Classify a provider error message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();

        if message.contains("429") || lower.contains("rate limit") {
            return Self::RateLimit;
        }

        let transient = message.contains("502")
            || message.contains("503")
            || message.contains("504")
            // Connection-level failures (reqwest)
            || lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("error sending request")
            || lower.contains("broken pipe")
            || lower.contains("reset by peer")
            // Proxies occasionally return empty-but-200 payloads
            || lower.contains("response contained no message");

        if transient {
            Self::Transient
        } else {
            Self::Permanent
        }
    }
}

impl fmt::Display for RetryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::ParseFailure => write!(f, "parse_failure"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// Failure of a single agent call.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("{role} timed out after {secs}s")]
    Timeout { role: AgentRole, secs: u64 },

    #[error("{role} inference failed ({category}): {message}")]
    Inference {
        role: AgentRole,
        category: RetryCategory,
        message: String,
    },

    #[error("{role} reply could not be parsed: {message}")]
    Parse { role: AgentRole, message: String },
}

impl AgentError {
    /// Build an `Inference` error, classifying the message.
    pub fn inference(role: AgentRole, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Inference {
            role,
            category: RetryCategory::classify(&message),
            message,
        }
    }

    pub fn parse(role: AgentRole, message: impl Into<String>) -> Self {
        Self::Parse {
            role,
            message: message.into(),
        }
    }

    pub fn role(&self) -> AgentRole {
        match self {
            Self::Timeout { role, .. } | Self::Inference { role, .. } | Self::Parse { role, .. } => {
                *role
            }
        }
    }

    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::Timeout { .. } => RetryCategory::Transient,
            Self::Inference { category, .. } => *category,
            Self::Parse { .. } => RetryCategory::ParseFailure,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_category().is_retriable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rate_limit() {
        assert_eq!(
            RetryCategory::classify("HTTP 429 Too Many Requests"),
            RetryCategory::RateLimit
        );
        assert_eq!(
            RetryCategory::classify("Rate limit reached for model"),
            RetryCategory::RateLimit
        );
    }

    #[test]
    fn classify_transient() {
        for msg in [
            "HTTP 503 Service Unavailable",
            "error sending request for url",
            "Connection reset by peer",
            "operation timed out",
        ] {
            assert_eq!(RetryCategory::classify(msg), RetryCategory::Transient, "{msg}");
        }
    }

    #[test]
    fn classify_permanent() {
        assert_eq!(
            RetryCategory::classify("401 Unauthorized: invalid api key"),
            RetryCategory::Permanent
        );
    }

    #[test]
    fn backoff_grows() {
        assert_eq!(RetryCategory::Transient.backoff(0), Duration::from_secs(2));
        assert_eq!(RetryCategory::Transient.backoff(2), Duration::from_secs(8));
        assert_eq!(RetryCategory::RateLimit.backoff(0), Duration::from_secs(4));
        assert_eq!(RetryCategory::Permanent.backoff(3), Duration::ZERO);
    }

    #[test]
    fn inference_error_is_classified() {
        let err = AgentError::inference(AgentRole::Drafter, "503 upstream unavailable");
        assert!(err.is_retriable());
        assert_eq!(err.role(), AgentRole::Drafter);
        assert!(err.to_string().starts_with("drafter inference failed (transient)"));
    }

    #[test]
    fn parse_error_not_retriable() {
        let err = AgentError::parse(AgentRole::Reviewer, "no JSON object");
        assert!(!err.is_retriable());
        assert_eq!(err.to_string(), "reviewer reply could not be parsed: no JSON object");
    }

    #[test]
    fn timeout_display() {
        let err = AgentError::Timeout {
            role: AgentRole::Classifier,
            secs: 120,
        };
        assert_eq!(err.to_string(), "classifier timed out after 120s");
    }
}
