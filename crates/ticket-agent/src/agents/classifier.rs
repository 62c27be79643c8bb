//! Ticket classifier agent.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use coordination::ticket::UNKNOWN_CATEGORY_CONFIDENCE;
use coordination::{ClassificationResult, Ticket, TicketCategory};
use rig::client::CompletionClient;
use rig::providers::openai;
use tracing::{debug, warn};

use super::{ModelSettings, OaiAgent, TicketClassifier};
use crate::errors::{AgentError, AgentRole};
use crate::llm::{json_f64, parse_json_reply, prompt_bounded};
use crate::prompts;

/// Confidence assumed when the reply names a category but omits a confidence.
const DEFAULT_CONFIDENCE: f64 = 0.5;

pub fn build_classifier(client: &openai::CompletionsClient, settings: &ModelSettings) -> OaiAgent {
    client
        .agent(&settings.model)
        .name("classifier")
        .description("Assigns a support ticket to billing, technical, security or general.")
        .preamble(prompts::CLASSIFIER_PREAMBLE)
        .temperature(settings.temperature)
        .max_tokens(settings.max_tokens)
        .build()
}

/// Parse a classifier reply.
///
/// A category outside the taxonomy becomes `general` with low confidence.
/// A reply without a JSON object is a parse error.
pub fn parse_classification(reply: &str) -> Result<ClassificationResult, AgentError> {
    let value = parse_json_reply(AgentRole::Classifier, reply)?;

    let raw = value
        .get("category")
        .and_then(|c| c.as_str())
        .unwrap_or("general");

    match TicketCategory::from_str(raw) {
        Ok(category) => {
            let confidence = json_f64(&value, "confidence").unwrap_or(DEFAULT_CONFIDENCE);
            Ok(ClassificationResult::new(category, confidence))
        }
        Err(_) => {
            warn!(category = raw, "Classifier returned unknown category, using general");
            Ok(ClassificationResult::new(
                TicketCategory::General,
                UNKNOWN_CATEGORY_CONFIDENCE,
            ))
        }
    }
}

pub struct RigClassifier {
    client: Arc<openai::CompletionsClient>,
    settings: ModelSettings,
}

impl RigClassifier {
    pub fn new(client: Arc<openai::CompletionsClient>, settings: ModelSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl TicketClassifier for RigClassifier {
    async fn classify(&self, ticket: &Ticket) -> Result<ClassificationResult, AgentError> {
        let agent = build_classifier(&self.client, &self.settings);
        let reply = prompt_bounded(
            &agent,
            &prompts::classifier_prompt(ticket),
            AgentRole::Classifier,
            &self.settings.policy,
        )
        .await?;
        debug!(reply_len = reply.len(), "Classifier replied");
        parse_classification(&reply)
    }
}
