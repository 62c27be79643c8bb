//! Response drafter agent.
//!
//! The preamble changes per attempt (retrieved context, reviewer feedback),
//! so the agent is built for each call.

use std::sync::Arc;

use async_trait::async_trait;
use coordination::ContextSnippet;
use rig::client::CompletionClient;
use rig::providers::openai;

use super::{DraftRequest, DraftWriter, ModelSettings, OaiAgent};
use crate::errors::{AgentError, AgentRole};
use crate::llm::prompt_bounded;
use crate::prompts;

pub fn build_drafter(
    client: &openai::CompletionsClient,
    settings: &ModelSettings,
    snippets: &[ContextSnippet],
    feedback: Option<&str>,
) -> OaiAgent {
    client
        .agent(&settings.model)
        .name("drafter")
        .description("Writes a customer-facing reply grounded in knowledge base context.")
        .preamble(&prompts::draft_preamble(snippets, feedback))
        .temperature(settings.temperature)
        .max_tokens(settings.max_tokens)
        .build()
}

/// Trim a drafter reply, rejecting empty output.
pub fn clean_draft(reply: &str) -> Result<String, AgentError> {
    let draft = reply.trim();
    if draft.is_empty() {
        Err(AgentError::parse(AgentRole::Drafter, "empty draft"))
    } else {
        Ok(draft.to_string())
    }
}

pub struct RigDrafter {
    client: Arc<openai::CompletionsClient>,
    settings: ModelSettings,
}

impl RigDrafter {
    pub fn new(client: Arc<openai::CompletionsClient>, settings: ModelSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl DraftWriter for RigDrafter {
    async fn draft(&self, request: DraftRequest) -> Result<String, AgentError> {
        let agent = build_drafter(
            &self.client,
            &self.settings,
            &request.snippets,
            request.feedback.as_deref(),
        );
        let reply = prompt_bounded(
            &agent,
            &prompts::draft_prompt(&request.ticket),
            AgentRole::Drafter,
            &self.settings.policy,
        )
        .await?;
        clean_draft(&reply)
    }
}
