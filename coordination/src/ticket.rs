//! Ticket intake model and category taxonomy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while accepting a ticket.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TicketError {
    #[error("Subject cannot be empty")]
    EmptySubject,

    #[error("Description cannot be empty")]
    EmptyDescription,

    #[error("Invalid ticket payload: {0}")]
    InvalidPayload(String),
}

/// A submitted support request.
///
/// Fields are private so a ticket cannot change after intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    subject: String,
    description: String,
}

/// Wire shape of the structured payload, validated into a [`Ticket`].
#[derive(Deserialize)]
struct TicketPayload {
    subject: String,
    description: String,
}

impl Ticket {
    /// Accept a ticket, trimming both fields.
    pub fn new(
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, TicketError> {
        let subject = subject.into().trim().to_string();
        let description = description.into().trim().to_string();

        if subject.is_empty() {
            return Err(TicketError::EmptySubject);
        }
        if description.is_empty() {
            return Err(TicketError::EmptyDescription);
        }

        Ok(Self {
            subject,
            description,
        })
    }

    /// Parse a `{"subject": ..., "description": ...}` payload.
    pub fn from_json(payload: &str) -> Result<Self, TicketError> {
        let raw: TicketPayload = serde_json::from_str(payload)
            .map_err(|e| TicketError::InvalidPayload(e.to_string()))?;
        Self::new(raw.subject, raw.description)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Subject and description joined by a space, the base retrieval query.
    pub fn text(&self) -> String {
        format!("{} {}", self.subject, self.description)
    }
}

impl<'de> Deserialize<'de> for Ticket {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = TicketPayload::deserialize(deserializer)?;
        Ticket::new(raw.subject, raw.description).map_err(serde::de::Error::custom)
    }
}

/// Support ticket categories. Each one scopes a slice of the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    /// Payments, invoices, refunds, subscriptions, pricing
    Billing,
    /// Login issues, API problems, bugs, system errors, performance
    Technical,
    /// Passwords, 2FA, suspicious activity, data privacy
    Security,
    /// Account management, feature requests, general inquiries
    General,
}

impl TicketCategory {
    pub const ALL: [TicketCategory; 4] = [
        Self::Billing,
        Self::Technical,
        Self::Security,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Technical => "technical",
            Self::Security => "security",
            Self::General => "general",
        }
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "billing" => Ok(Self::Billing),
            "technical" => Ok(Self::Technical),
            "security" => Ok(Self::Security),
            "general" => Ok(Self::General),
            other => Err(format!("unknown ticket category: {other}")),
        }
    }
}

/// Confidence assigned when the classifier names a category we do not know.
pub const UNKNOWN_CATEGORY_CONFIDENCE: f64 = 0.3;

/// Confidence assigned when classification failed outright.
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Category chosen for a ticket plus the classifier's confidence in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: TicketCategory,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(category: TicketCategory, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            category,
            confidence,
        }
    }

    /// Classification used when the classifier could not be consulted.
    pub fn fallback() -> Self {
        Self::new(TicketCategory::General, FALLBACK_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_trims_fields() {
        let ticket = Ticket::new("  Invoice not received ", "\tI paid last week\n").unwrap();
        assert_eq!(ticket.subject(), "Invoice not received");
        assert_eq!(ticket.description(), "I paid last week");
        assert_eq!(ticket.text(), "Invoice not received I paid last week");
    }

    #[test]
    fn test_ticket_rejects_empty_fields() {
        assert_eq!(
            Ticket::new("   ", "something").unwrap_err(),
            TicketError::EmptySubject
        );
        assert_eq!(
            Ticket::new("Login", "").unwrap_err(),
            TicketError::EmptyDescription
        );
    }

    #[test]
    fn test_ticket_from_json() {
        let ticket = Ticket::from_json(
            r#"{"subject": "System not working", "description": "Something is broken"}"#,
        )
        .unwrap();
        assert_eq!(ticket.subject(), "System not working");
    }

    #[test]
    fn test_ticket_from_json_rejects_bad_payloads() {
        assert!(matches!(
            Ticket::from_json("not json"),
            Err(TicketError::InvalidPayload(_))
        ));
        assert!(matches!(
            Ticket::from_json(r#"{"subject": "only subject"}"#),
            Err(TicketError::InvalidPayload(_))
        ));
        assert_eq!(
            Ticket::from_json(r#"{"subject": "", "description": "x"}"#).unwrap_err(),
            TicketError::EmptySubject
        );
    }

    #[test]
    fn test_ticket_deserialize_validates() {
        let err = serde_json::from_str::<Ticket>(r#"{"subject": "x", "description": " "}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_category_parse_and_display() {
        assert_eq!(
            "Billing".parse::<TicketCategory>(),
            Ok(TicketCategory::Billing)
        );
        assert_eq!(
            " SECURITY ".parse::<TicketCategory>(),
            Ok(TicketCategory::Security)
        );
        assert!("sales".parse::<TicketCategory>().is_err());
        assert_eq!(TicketCategory::Technical.to_string(), "technical");
        assert_eq!(
            serde_json::to_string(&TicketCategory::General).unwrap(),
            "\"general\""
        );
    }

    #[test]
    fn test_classification_clamps_confidence() {
        assert_eq!(
            ClassificationResult::new(TicketCategory::Billing, 1.7).confidence,
            1.0
        );
        assert_eq!(
            ClassificationResult::new(TicketCategory::Billing, -0.2).confidence,
            0.0
        );
        assert_eq!(
            ClassificationResult::new(TicketCategory::Billing, f64::NAN).confidence,
            0.0
        );

        let fallback = ClassificationResult::fallback();
        assert_eq!(fallback.category, TicketCategory::General);
        assert_eq!(fallback.confidence, FALLBACK_CONFIDENCE);
    }
}
