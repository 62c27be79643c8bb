//! Decision Gate and Attempt Budget: Bounded retry-then-escalate loop
//!
//! Every draft is scored, and the gate turns the score and the attempt
//! number into one of three decisions. All decisions are deterministic;
//! nothing in this module calls a language model.
//!
//! # Escalation ladder
//!
//! ```text
//! Attempt 1
//!     │
//!     ├─ score >= threshold → Approve
//!     ├─ score <  threshold → Retry (reviewer feedback refines retrieval + draft)
//!     ▼
//! Attempt 2 (= max_attempts)
//!     │
//!     ├─ score >= threshold → Approve
//!     └─ score <  threshold → Escalate: log for human review
//! ```

pub mod gate;
pub mod log;
pub mod state;

pub use gate::{DecisionGate, GateConfig, GateConfigError, GateDecision};
pub use log::{append_escalation, read_escalations, EscalationLogEntry, DEFAULT_ESCALATION_LOG};
pub use state::{AttemptHistory, AttemptLimitExceeded, AttemptRecord};
