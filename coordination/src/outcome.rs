//! Terminal outcome of a ticket and the report printed for it.

use serde::{Deserialize, Serialize};

use crate::escalation::state::{AttemptHistory, AttemptRecord};
use crate::ticket::{Ticket, TicketCategory};

/// Everything a human reviewer needs to pick up an escalated ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationDetails {
    pub reason: String,
    pub original_ticket: Ticket,
    /// Every attempt, in order. All of them scored below the threshold.
    pub history: Vec<AttemptRecord>,
    pub reviewer_feedback: Vec<String>,
}

impl EscalationDetails {
    pub fn from_history(ticket: &Ticket, history: &AttemptHistory) -> Self {
        Self {
            reason: format!(
                "Ticket failed after {} attempts. Requires human review.",
                history.len()
            ),
            original_ticket: ticket.clone(),
            history: history.attempts().to_vec(),
            reviewer_feedback: history.feedback(),
        }
    }
}

/// Terminal result for one ticket. Produced exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Approved {
        response: String,
        score: f64,
        attempts: u32,
    },
    Escalated(EscalationDetails),
}

impl Outcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    pub fn is_escalated(&self) -> bool {
        matches!(self, Self::Escalated(_))
    }

    /// Number of attempts it took to reach this outcome.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Approved { attempts, .. } => *attempts,
            Self::Escalated(details) => details.history.len() as u32,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approved { .. } => "approved",
            Self::Escalated(_) => "escalated",
        }
    }
}

/// Escalation block of the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EscalationSummary {
    pub needed: bool,
    pub details: Option<String>,
}

/// Human-readable report printed for every ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub category: TicketCategory,
    /// Snippet contents used by the final attempt
    pub context: Vec<String>,
    /// Approved response, or the last draft when escalated
    pub draft: String,
    pub approved: bool,
    pub score: f64,
    /// `"approved"` on approval, otherwise the last reviewer feedback
    pub feedback: String,
    pub escalation: EscalationSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionReport {
    pub fn from_outcome(category: TicketCategory, context: Vec<String>, outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Approved {
                response, score, ..
            } => Self {
                category,
                context,
                draft: response.clone(),
                approved: true,
                score: *score,
                feedback: "approved".to_string(),
                escalation: EscalationSummary::default(),
                error: None,
            },
            Outcome::Escalated(details) => {
                let last = details.history.last();
                Self {
                    category,
                    context,
                    draft: last
                        .map(|a| a.draft.clone())
                        .unwrap_or_else(|| "No response generated".to_string()),
                    approved: false,
                    score: last.map(|a| a.score).unwrap_or(0.0),
                    feedback: last
                        .map(|a| a.feedback.clone())
                        .unwrap_or_else(|| "No review completed".to_string()),
                    escalation: EscalationSummary {
                        needed: true,
                        details: Some(details.reason.clone()),
                    },
                    error: None,
                }
            }
        }
    }

    /// Report for a ticket that never made it into the loop.
    pub fn intake_error(error: impl std::fmt::Display) -> Self {
        let error = error.to_string();
        Self {
            category: TicketCategory::General,
            context: Vec::new(),
            draft: "Error processing ticket".to_string(),
            approved: false,
            score: 0.0,
            feedback: format!("Processing error: {error}"),
            escalation: EscalationSummary {
                needed: true,
                details: Some(format!("Error: {error}")),
            },
            error: Some(error),
        }
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{CriteriaScores, Review};

    fn history(scores: &[f64]) -> AttemptHistory {
        let mut history = AttemptHistory::new(scores.len() as u32);
        for (i, score) in scores.iter().enumerate() {
            let review = Review::new(
                *score,
                false,
                CriteriaScores::uniform(*score),
                format!("fix {}", i + 1),
            );
            history
                .record(AttemptRecord::new(i as u32 + 1, format!("draft {}", i + 1), &review))
                .unwrap();
        }
        history
    }

    #[test]
    fn test_approved_report() {
        let outcome = Outcome::Approved {
            response: "Here is how to find your invoice.".into(),
            score: 0.88,
            attempts: 1,
        };
        let report = ResolutionReport::from_outcome(
            TicketCategory::Billing,
            vec!["billing faq".into()],
            &outcome,
        );
        assert!(report.approved);
        assert_eq!(report.feedback, "approved");
        assert_eq!(report.score, 0.88);
        assert!(!report.escalation.needed);
        assert!(report.escalation.details.is_none());

        let json: serde_json::Value =
            serde_json::from_str(&report.to_pretty_json().unwrap()).unwrap();
        assert_eq!(json["category"], "billing");
        assert_eq!(json["escalation"]["details"], serde_json::Value::Null);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_escalated_report_uses_last_attempt() {
        let ticket = Ticket::new("System not working", "Something is broken").unwrap();
        let details = EscalationDetails::from_history(&ticket, &history(&[0.4, 0.55]));
        assert_eq!(
            details.reason,
            "Ticket failed after 2 attempts. Requires human review."
        );
        assert_eq!(details.reviewer_feedback, vec!["fix 1", "fix 2"]);

        let outcome = Outcome::Escalated(details);
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(outcome.label(), "escalated");

        let report = ResolutionReport::from_outcome(TicketCategory::Technical, vec![], &outcome);
        assert!(!report.approved);
        assert_eq!(report.draft, "draft 2");
        assert_eq!(report.score, 0.55);
        assert_eq!(report.feedback, "fix 2");
        assert!(report.escalation.needed);
    }

    #[test]
    fn test_intake_error_report() {
        let report = ResolutionReport::intake_error("Subject cannot be empty");
        assert_eq!(report.error.as_deref(), Some("Subject cannot be empty"));
        assert!(report.escalation.needed);
        assert_eq!(report.category, TicketCategory::General);
        assert_eq!(report.feedback, "Processing error: Subject cannot be empty");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = Outcome::Approved {
            response: "ok".into(),
            score: 0.9,
            attempts: 2,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "approved");
        assert_eq!(json["attempts"], 2);
    }
}
