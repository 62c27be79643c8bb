//! Ticket resolver: the bounded draft/review loop.
//!
//! ```text
//! classify ─► retrieve ─► draft ─► review ─► gate
//!                ▲                              │
//!                └──────── retry (feedback) ────┤
//!                                               ├─► approve  → Outcome::Approved
//!                                               └─► escalate → Outcome::Escalated + log
//! ```
//!
//! Agent failures never abort a ticket: classification falls back to
//! `general`, a failed draft becomes an apology, a failed review becomes a
//! low rejecting score. Only broken loop invariants surface as errors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use coordination::{
    append_escalation, AttemptHistory, AttemptRecord, ClassificationResult, DecisionGate,
    EscalationDetails, EscalationLogEntry, GateDecision, KnowledgeBase, Outcome, ResolutionReport,
    RetrievalResult, Review, Ticket,
};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agents::{
    AgentFactory, DraftRequest, DraftReviewer, DraftWriter, ReviewRequest, TicketClassifier,
};
use crate::config::AgentConfig;
use crate::prompts::FALLBACK_DRAFT;
use crate::state_machine::{ResolutionState, StateMachine, TransitionRecord};
use crate::telemetry::{append_metrics, ticket_fingerprint, MetricsCollector};

/// Everything produced while resolving one ticket.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub run_id: Uuid,
    pub ticket: Ticket,
    pub classification: ClassificationResult,
    pub outcome: Outcome,
    /// Every scored attempt, in order.
    pub attempts: Vec<AttemptRecord>,
    /// Retrieval used by the final attempt.
    pub retrieval: RetrievalResult,
    pub transitions: Vec<TransitionRecord>,
}

impl Resolution {
    pub fn report(&self) -> ResolutionReport {
        ResolutionReport::from_outcome(
            self.classification.category,
            self.retrieval.contents(),
            &self.outcome,
        )
    }
}

/// Knowledge base query for an attempt: ticket text, plus the previous
/// reviewer feedback on retries.
pub fn retrieval_query(ticket: &Ticket, feedback: Option<&str>) -> String {
    match feedback {
        Some(feedback) if !feedback.trim().is_empty() => format!("{} {}", ticket.text(), feedback),
        _ => ticket.text(),
    }
}

pub struct TicketResolver {
    classifier: Arc<dyn TicketClassifier>,
    drafter: Arc<dyn DraftWriter>,
    reviewer: Arc<dyn DraftReviewer>,
    knowledge: Arc<dyn KnowledgeBase>,
    gate: DecisionGate,
    max_snippets: usize,
    escalation_log: Option<PathBuf>,
    telemetry_log: Option<PathBuf>,
    model: String,
}

impl TicketResolver {
    pub fn new(
        classifier: Arc<dyn TicketClassifier>,
        drafter: Arc<dyn DraftWriter>,
        reviewer: Arc<dyn DraftReviewer>,
        knowledge: Arc<dyn KnowledgeBase>,
        gate: DecisionGate,
    ) -> Self {
        Self {
            classifier,
            drafter,
            reviewer,
            knowledge,
            gate,
            max_snippets: coordination::knowledge::DEFAULT_MAX_SNIPPETS,
            escalation_log: None,
            telemetry_log: None,
            model: String::from("unknown"),
        }
    }

    /// Resolver wired to the rig agents described by `config`.
    pub fn from_config(config: &AgentConfig, knowledge: Arc<dyn KnowledgeBase>) -> Result<Self> {
        let factory = AgentFactory::new(config)?;
        let gate = DecisionGate::with_config(config.gate)?;
        Ok(Self::new(
            Arc::new(factory.classifier()),
            Arc::new(factory.drafter()),
            Arc::new(factory.reviewer()),
            knowledge,
            gate,
        )
        .with_max_snippets(config.max_snippets)
        .with_escalation_log(config.escalation_log.clone())
        .with_telemetry_log(config.telemetry_log.clone())
        .with_model_label(&config.endpoint.model))
    }

    pub fn with_max_snippets(mut self, max_snippets: usize) -> Self {
        self.max_snippets = max_snippets.max(1);
        self
    }

    pub fn with_escalation_log(mut self, path: Option<PathBuf>) -> Self {
        self.escalation_log = path;
        self
    }

    pub fn with_telemetry_log(mut self, path: Option<PathBuf>) -> Self {
        self.telemetry_log = path;
        self
    }

    /// Model name recorded in telemetry.
    pub fn with_model_label(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn gate(&self) -> &DecisionGate {
        &self.gate
    }

    /// Run one ticket to a terminal outcome.
    pub async fn resolve(&self, ticket: Ticket) -> Result<Resolution> {
        let span = info_span!(
            "resolve_ticket",
            fingerprint = %ticket_fingerprint(&ticket),
        );
        self.resolve_inner(ticket).instrument(span).await
    }

    async fn resolve_inner(&self, ticket: Ticket) -> Result<Resolution> {
        let mut sm = StateMachine::new();
        let mut metrics = MetricsCollector::new(&ticket, &self.model);
        let run_id = metrics.run_id();
        info!(%run_id, subject = ticket.subject(), "Resolving ticket");

        // --- Classify ---
        sm.advance(ResolutionState::Classifying, None)?;
        let started = Instant::now();
        let (classification, classification_fallback) =
            match self.classifier.classify(&ticket).await {
                Ok(result) => (result, false),
                Err(e) => {
                    warn!(error = %e, "Classification failed, using general");
                    (ClassificationResult::fallback(), true)
                }
            };
        metrics.record_classification(classification, started.elapsed(), classification_fallback);
        info!(
            category = %classification.category,
            confidence = classification.confidence,
            "Ticket classified"
        );

        // --- Attempt loop ---
        let mut history = AttemptHistory::new(self.gate.config().max_attempts);
        let mut retrieval = RetrievalResult::default();
        sm.advance(ResolutionState::Retrieving, None)?;

        let outcome = loop {
            let attempt_index = history.next_index();
            sm.set_attempt(attempt_index);
            metrics.start_attempt(attempt_index);
            let feedback = history.last_feedback().map(str::to_string);

            let query = retrieval_query(&ticket, feedback.as_deref());
            retrieval = RetrievalResult {
                snippets: self
                    .knowledge
                    .retrieve(&query, classification.category, self.max_snippets),
                query_used: query,
            };
            metrics.record_retrieval(retrieval.sources());

            sm.advance(ResolutionState::Drafting, None)?;
            let started = Instant::now();
            let request = DraftRequest {
                ticket: ticket.clone(),
                snippets: retrieval.snippets.clone(),
                feedback,
                attempt_index,
            };
            let (draft, draft_fallback) = match self.drafter.draft(request).await {
                Ok(draft) => (draft, false),
                Err(e) => {
                    warn!(attempt_index, error = %e, "Drafting failed, using fallback draft");
                    (FALLBACK_DRAFT.to_string(), true)
                }
            };
            metrics.record_draft(started.elapsed(), draft_fallback);

            sm.advance(ResolutionState::Reviewing, None)?;
            let started = Instant::now();
            let request = ReviewRequest {
                ticket: ticket.clone(),
                draft: draft.clone(),
                snippets: retrieval.snippets.clone(),
                attempt_index,
            };
            let review = match self.reviewer.review(request).await {
                Ok(review) => review,
                Err(e) => {
                    warn!(attempt_index, error = %e, "Review failed, using fallback score");
                    Review::fallback()
                }
            };
            metrics.record_review(started.elapsed(), review.score, review.fallback);

            let decision = self.gate.decide(review.score, attempt_index);
            metrics.record_decision(decision);
            info!(
                attempt_index,
                score = review.score,
                reviewer_approved = review.reviewer_approved,
                %decision,
                "Draft reviewed"
            );

            let score = review.score;
            history.record(
                AttemptRecord::new(attempt_index, draft.clone(), &review)
                    .with_sources(retrieval.sources())
                    .with_draft_fallback(draft_fallback),
            )?;

            match decision {
                GateDecision::Approve => {
                    sm.advance(ResolutionState::Finalizing, None)?;
                    sm.advance(ResolutionState::Resolved, None)?;
                    break Outcome::Approved {
                        response: draft,
                        score,
                        attempts: attempt_index,
                    };
                }
                GateDecision::Retry => {
                    let reason = format!(
                        "score {:.2} below threshold {:.2}",
                        score,
                        self.gate.config().approval_threshold
                    );
                    sm.advance(ResolutionState::Retrieving, Some(&reason))?;
                }
                GateDecision::Escalate => {
                    sm.advance(ResolutionState::Escalating, None)?;
                    let entry =
                        EscalationLogEntry::new(&ticket, classification.category, &history);
                    warn!(
                        escalation_id = %entry.escalation_id,
                        attempts = entry.attempts,
                        final_score = entry.final_score,
                        "Ticket escalated to human review"
                    );
                    if let Some(ref path) = self.escalation_log {
                        append_escalation(&entry, path);
                    }
                    sm.advance(ResolutionState::Escalated, None)?;
                    break Outcome::Escalated(EscalationDetails::from_history(&ticket, &history));
                }
            }
        };

        info!(
            %run_id,
            outcome = outcome.label(),
            attempts = outcome.attempts(),
            summary = %sm.summary(),
            "Ticket resolved"
        );

        let final_score = history.last().map(|a| a.score).unwrap_or(0.0);
        let summary = sm.summary();
        let transitions = sm.into_transitions();
        if let Some(ref path) = self.telemetry_log {
            let metrics = metrics.finalize(outcome.label(), final_score, summary, transitions.clone());
            append_metrics(&metrics, path);
        }

        Ok(Resolution {
            run_id,
            ticket,
            classification,
            outcome,
            attempts: history.into_attempts(),
            retrieval,
            transitions,
        })
    }
}

/// Text rendering of the resolution workflow (`--workflow`).
pub fn workflow_diagram(gate: &DecisionGate) -> String {
    let config = gate.config();
    format!(
        "\
Support ticket resolution workflow
==================================

  [ticket]
     │
     ▼
  classify ── billing | technical | security | general
     │
     ▼
  retrieve ◄──────────────────────────────┐
     │  (top snippets for the category)    │
     ▼                                     │
  draft                                    │ retry with reviewer feedback
     │                                     │ (attempt < {max})
     ▼                                     │
  review ── score ──┬── < {threshold:.2} ───────┘
                    │
                    ├── >= {threshold:.2} ──► approved response
                    │
                    └── < {threshold:.2} on attempt {max} ──► escalate to human review
",
        max = config.max_attempts,
        threshold = config.approval_threshold,
    )
}
