//! Resolution State Machine: explicit states and legal transition guards.
//!
//! Every ticket walks the same graph. The resolver calls `advance()` at each
//! step; illegal edges are rejected and every accepted edge is recorded so a
//! run can be replayed from telemetry.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// States of one ticket's resolution.
///
/// Every run starts at `Received` and terminates at `Resolved` or `Escalated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    /// Ticket accepted, nothing done yet.
    Received,
    /// Asking the classifier for a category.
    Classifying,
    /// Pulling knowledge base snippets for the current attempt.
    Retrieving,
    /// Asking the drafter for a response.
    Drafting,
    /// Scoring the draft and consulting the decision gate.
    Reviewing,
    /// Draft approved, building the outcome.
    Finalizing,
    /// Attempt budget exhausted, recording the escalation.
    Escalating,
    /// Approved draft returned. Terminal.
    Resolved,
    /// Handed to a human. Terminal.
    Escalated,
}

impl ResolutionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Escalated)
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "Received",
            Self::Classifying => "Classifying",
            Self::Retrieving => "Retrieving",
            Self::Drafting => "Drafting",
            Self::Reviewing => "Reviewing",
            Self::Finalizing => "Finalizing",
            Self::Escalating => "Escalating",
            Self::Resolved => "Resolved",
            Self::Escalated => "Escalated",
        };
        f.write_str(name)
    }
}

/// ```text
/// Received → Classifying → Retrieving → Drafting → Reviewing
/// Reviewing → Retrieving   (retry)
///           | Finalizing → Resolved
///           | Escalating → Escalated
/// ```
fn is_legal_transition(from: ResolutionState, to: ResolutionState) -> bool {
    use ResolutionState::*;

    matches!(
        (from, to),
        (Received, Classifying)
            | (Classifying, Retrieving)
            | (Retrieving, Drafting)
            | (Drafting, Reviewing)
            | (Reviewing, Retrieving)
            | (Reviewing, Finalizing)
            | (Reviewing, Escalating)
            | (Finalizing, Resolved)
            | (Escalating, Escalated)
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: ResolutionState,
    pub to: ResolutionState,
    /// Attempt in progress (0 before the first draft).
    pub attempt: u32,
    /// Milliseconds since the machine was created.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IllegalTransition {
    pub from: ResolutionState,
    pub to: ResolutionState,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal state transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

pub struct StateMachine {
    current: ResolutionState,
    attempt: u32,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: ResolutionState::Received,
            attempt: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> ResolutionState {
        self.current
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn set_attempt(&mut self, attempt: u32) {
        self.attempt = attempt;
    }

    /// Move to `to`, or return `IllegalTransition` if the edge is not in the graph.
    pub fn advance(
        &mut self,
        to: ResolutionState,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        tracing::debug!(
            from = %self.current,
            to = %to,
            attempt = self.attempt,
            "State transition"
        );

        self.transitions.push(TransitionRecord {
            from: self.current,
            to,
            attempt: self.attempt,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        });
        self.current = to;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<TransitionRecord> {
        self.transitions
    }

    /// One-line history, e.g. `Received → Resolved (12ms, 7 transitions) [...]`.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} → {} ({}ms, {} transitions)",
            ResolutionState::Received,
            self.current,
            self.created_at.elapsed().as_millis(),
            self.transitions.len(),
        );
        if !self.transitions.is_empty() {
            let states: Vec<String> = self.transitions.iter().map(|t| t.to.to_string()).collect();
            summary.push_str(&format!(" [{}]", states.join(" → ")));
        }
        summary
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
