//! System prompt constants for each agent role.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content changes.
//! The version is recorded in telemetry so a regression in scores can be
//! traced back to the prompt that produced it.

use coordination::{ContextSnippet, Ticket};

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Classifier preamble. Reply is a single JSON object.
pub const CLASSIFIER_PREAMBLE: &str = "\
You are a support ticket classifier. Classify tickets into exactly ONE category:
- billing: Payment, invoices, refunds, subscriptions, pricing
- technical: Login issues, API problems, bugs, system errors, performance
- security: Password, 2FA, suspicious activity, data privacy, account security
- general: Account management, feature requests, general inquiries

Respond with JSON only:
{
    \"category\": \"billing|technical|security|general\",
    \"confidence\": 0.0-1.0,
    \"reasoning\": \"brief explanation\"
}";

/// Drafter guidelines. Context snippets and reviewer feedback are appended
/// per attempt by [`draft_preamble`].
pub const DRAFTER_GUIDELINES: &str = "\
You are a customer support agent. Write a helpful, empathetic response to the customer's ticket.

GUIDELINES:
- Be professional, empathetic, and concise
- Use numbered steps for instructions
- Only use information from the provided context
- If context lacks information, politely say you don't have that information
- Don't overpromise refunds or make policy exceptions
- End with a next-step suggestion if the problem might persist
- Keep response under 300 words";

/// Reviewer preamble. `{threshold}` is substituted with the gate threshold.
pub const REVIEWER_PREAMBLE: &str = "\
You are a quality assurance reviewer for customer support responses.
Evaluate the draft response against these criteria:

1. CORRECTNESS (0.0-1.0): Is the response factually accurate and grounded in context?
2. USEFULNESS (0.0-1.0): Does it provide actionable steps and anticipate user needs?
3. TONE (0.0-1.0): Is it professional, empathetic, and appropriately concise?
4. SAFETY (0.0-1.0): Does it avoid risky instructions and overpromising?

APPROVAL THRESHOLD: Overall score >= {threshold}

Respond with JSON only:
{
    \"approved\": true/false,
    \"overall_score\": 0.0-1.0,
    \"criteria_scores\": {
        \"correctness\": 0.0-1.0,
        \"usefulness\": 0.0-1.0,
        \"tone\": 0.0-1.0,
        \"safety\": 0.0-1.0
    },
    \"feedback\": \"specific feedback for improvement or 'approved'\"
}";

/// Text used in place of a draft when the drafter fails.
pub const FALLBACK_DRAFT: &str = "I apologize, but I'm having trouble processing your request \
right now. Please contact our support team directly for immediate assistance.";

pub fn classifier_prompt(ticket: &Ticket) -> String {
    format!(
        "Classify this support ticket:\n\nSubject: {}\nDescription: {}\n\n\
         Classify into billing, technical, security, or general.",
        ticket.subject(),
        ticket.description()
    )
}

/// Drafter system prompt for one attempt.
pub fn draft_preamble(snippets: &[ContextSnippet], feedback: Option<&str>) -> String {
    let context = if snippets.is_empty() {
        "No context available".to_string()
    } else {
        snippets
            .iter()
            .map(|s| format!("Source: {}\nContent: {}", s.source, s.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let mut preamble = format!("{DRAFTER_GUIDELINES}\n\nCONTEXT INFORMATION:\n{context}");
    if let Some(feedback) = feedback {
        preamble.push_str(&format!(
            "\n\nPREVIOUS REVIEWER FEEDBACK TO ADDRESS:\n{feedback}"
        ));
    }
    preamble
}

pub fn draft_prompt(ticket: &Ticket) -> String {
    format!(
        "Customer Ticket:\nSubject: {}\nDescription: {}\n\n\
         Write a helpful response based on the provided context.",
        ticket.subject(),
        ticket.description()
    )
}

pub fn reviewer_preamble(threshold: f64) -> String {
    REVIEWER_PREAMBLE.replace("{threshold}", &format!("{threshold:.2}"))
}

pub fn review_prompt(ticket: &Ticket, draft: &str, snippets: &[ContextSnippet]) -> String {
    let context = if snippets.is_empty() {
        "No context available".to_string()
    } else {
        snippets
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Original Ticket:\nSubject: {}\nDescription: {}\n\n\
         Draft Response to Review:\n{draft}\n\n\
         Available Context:\n{context}\n\n\
         Evaluate this draft response.",
        ticket.subject(),
        ticket.description()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(source: &str, content: &str) -> ContextSnippet {
        ContextSnippet {
            content: content.into(),
            source: source.into(),
            relevance_score: 0.5,
        }
    }

    #[test]
    fn test_draft_preamble_includes_context_and_feedback() {
        let snippets = vec![snippet("refund_policy.md", "Refunds take 5-7 days.")];
        let first = draft_preamble(&snippets, None);
        assert!(first.contains("Source: refund_policy.md"));
        assert!(!first.contains("PREVIOUS REVIEWER FEEDBACK"));

        let retry = draft_preamble(&snippets, Some("Mention the 30 day window."));
        assert!(retry.ends_with("Mention the 30 day window."));
    }

    #[test]
    fn test_draft_preamble_without_context() {
        assert!(draft_preamble(&[], None).contains("No context available"));
    }

    #[test]
    fn test_reviewer_preamble_threshold() {
        let preamble = reviewer_preamble(0.75);
        assert!(preamble.contains("Overall score >= 0.75"));
        assert!(!preamble.contains("{threshold}"));
    }

    #[test]
    fn test_review_prompt_contains_draft() {
        let ticket = Ticket::new("Invoice not received", "Where is my invoice?").unwrap();
        let prompt = review_prompt(&ticket, "Check the dashboard.", &[]);
        assert!(prompt.contains("Subject: Invoice not received"));
        assert!(prompt.contains("Check the dashboard."));
    }
}
