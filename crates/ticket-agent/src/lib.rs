//! Support ticket resolution agent.
//!
//! Wires the deterministic core in `coordination` to three language-model
//! roles (classifier, drafter, reviewer) and runs each ticket through the
//! bounded draft/review loop in [`orchestrator::TicketResolver`].

pub mod agents;
pub mod config;
pub mod errors;
pub mod interactive;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod state_machine;
pub mod telemetry;

pub use agents::{DraftRequest, DraftReviewer, DraftWriter, ReviewRequest, TicketClassifier};
pub use config::AgentConfig;
pub use errors::{AgentError, AgentRole};
pub use orchestrator::{Resolution, TicketResolver};
