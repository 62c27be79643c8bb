//! Language-model agents for the three roles of the resolution loop.
//!
//! Each role sits behind a trait so the resolver can be driven by scripted
//! implementations in tests. The `Rig*` implementations talk to an
//! OpenAI-compatible endpoint through `rig`. `AgentFactory` builds all three
//! from one `AgentConfig`.

pub mod classifier;
pub mod drafter;
pub mod reviewer;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use coordination::{ClassificationResult, ContextSnippet, Review, Ticket};
use rig::agent::Agent;
use rig::providers::openai;

use crate::config::{build_client, AgentConfig, Endpoint};
use crate::errors::AgentError;
use crate::llm::CallPolicy;

pub use classifier::RigClassifier;
pub use drafter::RigDrafter;
pub use reviewer::RigReviewer;

/// Type alias for agents built from OpenAI-compatible endpoints.
pub type OaiAgent = Agent<openai::completion::CompletionModel>;

/// Input to one drafting attempt.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub ticket: Ticket,
    pub snippets: Vec<ContextSnippet>,
    /// Reviewer feedback from the previous attempt, if any.
    pub feedback: Option<String>,
    pub attempt_index: u32,
}

/// Input to one review.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub ticket: Ticket,
    pub draft: String,
    pub snippets: Vec<ContextSnippet>,
    pub attempt_index: u32,
}

/// Assigns a category to a ticket.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketClassifier: Send + Sync {
    async fn classify(&self, ticket: &Ticket) -> Result<ClassificationResult, AgentError>;
}

/// Writes a customer-facing draft.
#[async_trait]
pub trait DraftWriter: Send + Sync {
    async fn draft(&self, request: DraftRequest) -> Result<String, AgentError>;
}

/// Scores a draft. This is the quality signal the decision gate consumes.
#[async_trait]
pub trait DraftReviewer: Send + Sync {
    async fn review(&self, request: ReviewRequest) -> Result<Review, AgentError>;
}

/// Model name and sampling settings shared by all roles.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub policy: CallPolicy,
}

impl ModelSettings {
    pub fn new(endpoint: &Endpoint, policy: CallPolicy) -> Self {
        Self {
            model: endpoint.model.clone(),
            temperature: endpoint.temperature,
            max_tokens: endpoint.max_tokens,
            policy,
        }
    }
}

/// Builds the three rig-backed agents from one endpoint.
pub struct AgentFactory {
    client: Arc<openai::CompletionsClient>,
    settings: ModelSettings,
    approval_threshold: f64,
}

impl AgentFactory {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = build_client(&config.endpoint)?;
        Ok(Self {
            client: Arc::new(client),
            settings: ModelSettings::new(&config.endpoint, config.call_policy),
            approval_threshold: config.gate.approval_threshold,
        })
    }

    pub fn classifier(&self) -> RigClassifier {
        RigClassifier::new(Arc::clone(&self.client), self.settings.clone())
    }

    pub fn drafter(&self) -> RigDrafter {
        RigDrafter::new(Arc::clone(&self.client), self.settings.clone())
    }

    /// The reviewer's preamble quotes the gate threshold.
    pub fn reviewer(&self) -> RigReviewer {
        RigReviewer::new(
            Arc::clone(&self.client),
            self.settings.clone(),
            self.approval_threshold,
        )
    }
}
