//! Decision Gate: approve, retry, or escalate a scored attempt.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::review::normalize_score;

/// Minimum score for a draft to be approved.
pub const DEFAULT_APPROVAL_THRESHOLD: f64 = 0.75;

/// Attempts allowed per ticket before human handoff.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Gate constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Score at or above which a draft is approved, in [0, 1].
    pub approval_threshold: f64,
    /// Attempt budget per ticket, at least 1.
    pub max_attempts: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GateConfigError {
    #[error("Approval threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),

    #[error("Attempt budget must be at least 1")]
    ZeroAttempts,
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), GateConfigError> {
        if !(0.0..=1.0).contains(&self.approval_threshold) {
            return Err(GateConfigError::ThresholdOutOfRange(
                self.approval_threshold,
            ));
        }
        if self.max_attempts == 0 {
            return Err(GateConfigError::ZeroAttempts);
        }
        Ok(())
    }
}

/// What happens after an attempt has been scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// Score met the threshold; the draft becomes the response.
    Approve,
    /// Score too low but budget remains; run another attempt.
    Retry,
    /// Score too low and budget exhausted; hand off to a human.
    Escalate,
}

impl GateDecision {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Retry)
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Retry => write!(f, "retry"),
            Self::Escalate => write!(f, "escalate"),
        }
    }
}

/// The gate itself. Stateless: the attempt number comes from the caller.
#[derive(Debug, Clone, Default)]
pub struct DecisionGate {
    config: GateConfig,
}

impl DecisionGate {
    /// Create a gate with the default threshold (0.75) and budget (2).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom constants.
    pub fn with_config(config: GateConfig) -> Result<Self, GateConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide the fate of attempt `attempt_index` (1-based) scoring `score`.
    pub fn decide(&self, score: f64, attempt_index: u32) -> GateDecision {
        if normalize_score(score) >= self.config.approval_threshold {
            GateDecision::Approve
        } else if attempt_index < self.config.max_attempts {
            GateDecision::Retry
        } else {
            GateDecision::Escalate
        }
    }
}
