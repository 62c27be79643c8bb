//! Structured per-ticket telemetry.
//!
//! One `TicketMetrics` record per resolved ticket, appended as a JSON line
//! when a telemetry log is configured. Ticket text is never written; the
//! ticket is identified by a blake3 fingerprint of its subject and body.

use std::path::Path;
use std::time::{Duration, Instant};

use coordination::{ClassificationResult, GateDecision, Ticket, TicketCategory};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::prompts::PROMPT_VERSION;
use crate::state_machine::TransitionRecord;

/// Stable identifier for a ticket's content (first 16 hex chars of blake3).
pub fn ticket_fingerprint(ticket: &Ticket) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ticket.subject().as_bytes());
    hasher.update(b"\n");
    hasher.update(ticket.description().as_bytes());
    let hex = hasher.finalize().to_hex();
    hex[..16].to_string()
}

/// Metrics for one draft/review attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptMetrics {
    pub attempt_index: u32,
    /// Knowledge sources handed to the drafter.
    pub sources: Vec<String>,
    pub draft_ms: u64,
    pub review_ms: u64,
    pub score: f64,
    pub decision: Option<GateDecision>,
    pub draft_fallback: bool,
    pub review_fallback: bool,
}

/// Complete record for one ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMetrics {
    pub run_id: Uuid,
    pub ticket_fingerprint: String,
    pub prompt_version: String,
    pub model: String,
    pub category: TicketCategory,
    pub classification_confidence: f64,
    pub classification_fallback: bool,
    pub classify_ms: u64,
    pub attempts: Vec<AttemptMetrics>,
    /// "approved" or "escalated"
    pub outcome: String,
    pub final_score: f64,
    pub elapsed_ms: u64,
    pub state_summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<TransitionRecord>,
    pub timestamp: String,
}

/// Accumulates metrics while a ticket is being resolved.
pub struct MetricsCollector {
    run_id: Uuid,
    fingerprint: String,
    model: String,
    started: Instant,
    classification: Option<(ClassificationResult, u64, bool)>,
    current: Option<AttemptMetrics>,
    attempts: Vec<AttemptMetrics>,
}

impl MetricsCollector {
    pub fn new(ticket: &Ticket, model: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            fingerprint: ticket_fingerprint(ticket),
            model: model.to_string(),
            started: Instant::now(),
            classification: None,
            current: None,
            attempts: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn record_classification(
        &mut self,
        result: ClassificationResult,
        duration: Duration,
        fallback: bool,
    ) {
        self.classification = Some((result, duration.as_millis() as u64, fallback));
    }

    /// Begin tracking a new attempt, flushing any attempt still open.
    pub fn start_attempt(&mut self, attempt_index: u32) {
        self.finish_attempt();
        self.current = Some(AttemptMetrics {
            attempt_index,
            sources: Vec::new(),
            draft_ms: 0,
            review_ms: 0,
            score: 0.0,
            decision: None,
            draft_fallback: false,
            review_fallback: false,
        });
    }

    pub fn record_retrieval(&mut self, sources: Vec<String>) {
        if let Some(ref mut attempt) = self.current {
            attempt.sources = sources;
        }
    }

    pub fn record_draft(&mut self, duration: Duration, fallback: bool) {
        if let Some(ref mut attempt) = self.current {
            attempt.draft_ms = duration.as_millis() as u64;
            attempt.draft_fallback = fallback;
        }
    }

    pub fn record_review(&mut self, duration: Duration, score: f64, fallback: bool) {
        if let Some(ref mut attempt) = self.current {
            attempt.review_ms = duration.as_millis() as u64;
            attempt.score = score;
            attempt.review_fallback = fallback;
        }
    }

    pub fn record_decision(&mut self, decision: GateDecision) {
        if let Some(ref mut attempt) = self.current {
            attempt.decision = Some(decision);
        }
    }

    pub fn finish_attempt(&mut self) {
        if let Some(attempt) = self.current.take() {
            self.attempts.push(attempt);
        }
    }

    pub fn finalize(
        mut self,
        outcome: &str,
        final_score: f64,
        state_summary: String,
        transitions: Vec<TransitionRecord>,
    ) -> TicketMetrics {
        self.finish_attempt();
        let (classification, classify_ms, classification_fallback) = self
            .classification
            .unwrap_or((ClassificationResult::fallback(), 0, true));

        TicketMetrics {
            run_id: self.run_id,
            ticket_fingerprint: self.fingerprint,
            prompt_version: PROMPT_VERSION.to_string(),
            model: self.model,
            category: classification.category,
            classification_confidence: classification.confidence,
            classification_fallback,
            classify_ms,
            attempts: self.attempts,
            outcome: outcome.to_string(),
            final_score,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            state_summary,
            transitions,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Append ticket metrics as one JSON line to `path`.
pub fn append_metrics(metrics: &TicketMetrics, path: &Path) {
    match serde_json::to_string(metrics) {
        Ok(json) => {
            use std::io::Write;
            match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
            {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{json}") {
                        warn!("Failed to append telemetry: {e}");
                    } else {
                        info!(path = %path.display(), run_id = %metrics.run_id, "Appended ticket telemetry");
                    }
                }
                Err(e) => warn!("Failed to open telemetry file: {e}"),
            }
        }
        Err(e) => warn!("Failed to serialize telemetry: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> Ticket {
        Ticket::new("Refund request", "I was charged twice this month").unwrap()
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = ticket_fingerprint(&ticket());
        let b = ticket_fingerprint(&ticket());
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);

        let other = Ticket::new("Refund request", "Charged three times").unwrap();
        assert_ne!(a, ticket_fingerprint(&other));
    }

    #[test]
    fn test_collector_tracks_attempts() {
        let mut collector = MetricsCollector::new(&ticket(), "support-model");
        collector.record_classification(
            ClassificationResult::new(TicketCategory::Billing, 0.9),
            Duration::from_millis(40),
            false,
        );

        collector.start_attempt(1);
        collector.record_retrieval(vec!["refund_policy.md".into()]);
        collector.record_draft(Duration::from_millis(120), false);
        collector.record_review(Duration::from_millis(80), 0.5, false);
        collector.record_decision(GateDecision::Retry);

        // Starting the next attempt flushes the previous one
        collector.start_attempt(2);
        collector.record_draft(Duration::from_millis(100), true);
        collector.record_review(Duration::from_millis(60), 0.3, true);
        collector.record_decision(GateDecision::Escalate);

        let metrics = collector.finalize("escalated", 0.3, "summary".into(), Vec::new());
        assert_eq!(metrics.category, TicketCategory::Billing);
        assert_eq!(metrics.classify_ms, 40);
        assert!(!metrics.classification_fallback);
        assert_eq!(metrics.attempts.len(), 2);
        assert_eq!(metrics.attempts[0].sources, vec!["refund_policy.md"]);
        assert_eq!(metrics.attempts[0].decision, Some(GateDecision::Retry));
        assert!(metrics.attempts[1].draft_fallback);
        assert!(metrics.attempts[1].review_fallback);
        assert_eq!(metrics.outcome, "escalated");
        assert_eq!(metrics.prompt_version, PROMPT_VERSION);
    }

    #[test]
    fn test_unrecorded_classification_is_fallback() {
        let metrics =
            MetricsCollector::new(&ticket(), "m").finalize("approved", 0.9, String::new(), vec![]);
        assert_eq!(metrics.category, TicketCategory::General);
        assert!(metrics.classification_fallback);
        assert!(metrics.attempts.is_empty());
    }

    #[test]
    fn test_append_metrics_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");

        for _ in 0..2 {
            let metrics =
                MetricsCollector::new(&ticket(), "m").finalize("approved", 0.8, String::new(), vec![]);
            append_metrics(&metrics, &path);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: TicketMetrics = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.outcome, "approved");
        assert!(!content.contains("charged twice"));
    }

    #[test]
    fn test_append_metrics_unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let metrics =
            MetricsCollector::new(&ticket(), "m").finalize("approved", 0.8, String::new(), vec![]);
        // A directory cannot be opened for append
        append_metrics(&metrics, dir.path());
    }
}
