//! Support Ticket Coordination Library
//!
//! The deterministic half of the support-ticket resolution agent. Nothing in
//! this crate calls a language model:
//! - Ticket intake model and category taxonomy
//! - Category-scoped knowledge base with keyword relevance retrieval
//! - Decision gate (approve / retry / escalate) and bounded attempt history
//! - Outcome and report types, plus the append-only escalation log
//!
//! # Decision flow
//!
//! ```text
//! Ticket → classify → retrieve → draft → review ─┬─ score >= 0.75          → Approved
//!                        ▲                        ├─ score < 0.75, attempt 1 → retry
//!                        └────────────────────────┘
//!                                                 └─ score < 0.75, attempt 2 → Escalated
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod escalation;
pub mod knowledge;
pub mod outcome;
pub mod review;
pub mod ticket;

// Re-export ticket types
pub use ticket::{ClassificationResult, Ticket, TicketCategory, TicketError};

// Re-export knowledge types
pub use knowledge::{
    ContextSnippet, KnowledgeBase, KnowledgeEntry, RetrievalResult, StaticKnowledgeBase,
};

// Re-export review types
pub use review::{normalize_score, CriteriaScores, Review};

// Re-export escalation types
pub use escalation::{
    append_escalation, read_escalations, AttemptHistory, AttemptLimitExceeded, AttemptRecord,
    DecisionGate, EscalationLogEntry, GateConfig, GateConfigError, GateDecision,
    DEFAULT_ESCALATION_LOG,
};

// Re-export outcome types
pub use outcome::{EscalationDetails, EscalationSummary, Outcome, ResolutionReport};
