//! Draft reviewer agent (the scorer).

use std::sync::Arc;

use async_trait::async_trait;
use coordination::{CriteriaScores, Review};
use rig::client::CompletionClient;
use rig::providers::openai;

use super::{DraftReviewer, ModelSettings, OaiAgent, ReviewRequest};
use crate::errors::{AgentError, AgentRole};
use crate::llm::{json_f64, parse_json_reply, prompt_bounded};
use crate::prompts;

/// Build the reviewer. Sees only the ticket, the draft and the context.
pub fn build_reviewer(
    client: &openai::CompletionsClient,
    settings: &ModelSettings,
    approval_threshold: f64,
) -> OaiAgent {
    client
        .agent(&settings.model)
        .name("reviewer")
        .description("Scores a support draft on correctness, usefulness, tone and safety.")
        .preamble(&prompts::reviewer_preamble(approval_threshold))
        .temperature(settings.temperature)
        .max_tokens(settings.max_tokens)
        .build()
}

/// Parse a reviewer reply into a [`Review`].
///
/// Missing fields default to a rejecting review (score 0, not approved).
pub fn parse_review(reply: &str) -> Result<Review, AgentError> {
    let value = parse_json_reply(AgentRole::Reviewer, reply)?;

    let score = json_f64(&value, "overall_score").unwrap_or(0.0);
    let approved = value
        .get("approved")
        .and_then(|a| a.as_bool())
        .unwrap_or(false);
    let criteria = value
        .get("criteria_scores")
        .map(|c| CriteriaScores {
            correctness: json_f64(c, "correctness").unwrap_or(0.0),
            usefulness: json_f64(c, "usefulness").unwrap_or(0.0),
            tone: json_f64(c, "tone").unwrap_or(0.0),
            safety: json_f64(c, "safety").unwrap_or(0.0),
        })
        .unwrap_or_default();
    let feedback = value
        .get("feedback")
        .and_then(|f| f.as_str())
        .filter(|f| !f.trim().is_empty())
        .unwrap_or("No feedback provided");

    Ok(Review::new(score, approved, criteria, feedback))
}

pub struct RigReviewer {
    client: Arc<openai::CompletionsClient>,
    settings: ModelSettings,
    approval_threshold: f64,
}

impl RigReviewer {
    pub fn new(
        client: Arc<openai::CompletionsClient>,
        settings: ModelSettings,
        approval_threshold: f64,
    ) -> Self {
        Self {
            client,
            settings,
            approval_threshold,
        }
    }
}

#[async_trait]
impl DraftReviewer for RigReviewer {
    async fn review(&self, request: ReviewRequest) -> Result<Review, AgentError> {
        let agent = build_reviewer(&self.client, &self.settings, self.approval_threshold);
        let prompt = prompts::review_prompt(&request.ticket, &request.draft, &request.snippets);
        let reply =
            prompt_bounded(&agent, &prompt, AgentRole::Reviewer, &self.settings.policy).await?;
        parse_review(&reply)
    }
}
