//! Append-only escalation log for human reviewers.
//!
//! One JSON object per line, one line per escalated ticket.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::escalation::state::AttemptHistory;
use crate::ticket::{Ticket, TicketCategory};

/// Default file name for the escalation log.
pub const DEFAULT_ESCALATION_LOG: &str = "escalation_log.jsonl";

/// A single escalation as written to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationLogEntry {
    pub escalation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
    pub description: String,
    pub category: TicketCategory,
    pub attempts: u32,
    pub final_score: f64,
    pub final_feedback: String,
}

impl EscalationLogEntry {
    pub fn new(ticket: &Ticket, category: TicketCategory, history: &AttemptHistory) -> Self {
        let last = history.last();
        Self {
            escalation_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            subject: ticket.subject().to_string(),
            description: ticket.description().to_string(),
            category,
            attempts: history.len() as u32,
            final_score: last.map(|a| a.score).unwrap_or(0.0),
            final_feedback: last
                .map(|a| a.feedback.clone())
                .unwrap_or_else(|| "No feedback".to_string()),
        }
    }
}

/// Append an escalation to the log at `path`.
///
/// Failures are logged and swallowed: an unwritable log never blocks a ticket.
pub fn append_escalation(entry: &EscalationLogEntry, path: &Path) {
    match serde_json::to_string(entry) {
        Ok(json) => {
            match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
            {
                Ok(mut file) => {
                    if let Err(e) = writeln!(file, "{json}") {
                        warn!("Failed to append escalation: {e}");
                    } else {
                        info!(path = %path.display(), "Logged escalation");
                    }
                }
                Err(e) => warn!("Failed to open escalation log: {e}"),
            }
        }
        Err(e) => warn!("Failed to serialize escalation: {e}"),
    }
}

/// Read every entry back from an escalation log, skipping malformed lines.
pub fn read_escalations(path: &Path) -> std::io::Result<Vec<EscalationLogEntry>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed escalation line: {e}");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::state::AttemptRecord;
    use crate::review::{CriteriaScores, Review};

    fn escalated_history() -> AttemptHistory {
        let mut history = AttemptHistory::new(2);
        for (i, score) in [0.4, 0.6].into_iter().enumerate() {
            let review = Review::new(
                score,
                false,
                CriteriaScores::uniform(score),
                format!("feedback {}", i + 1),
            );
            history
                .record(AttemptRecord::new(i as u32 + 1, "draft", &review))
                .unwrap();
        }
        history
    }

    #[test]
    fn test_entry_uses_last_attempt() {
        let ticket = Ticket::new("System not working", "Something is broken").unwrap();
        let entry = EscalationLogEntry::new(&ticket, TicketCategory::Technical, &escalated_history());
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.final_score, 0.6);
        assert_eq!(entry.final_feedback, "feedback 2");
        assert_eq!(entry.category, TicketCategory::Technical);
    }

    #[test]
    fn test_entry_without_attempts() {
        let ticket = Ticket::new("s", "d").unwrap();
        let entry = EscalationLogEntry::new(&ticket, TicketCategory::General, &AttemptHistory::new(2));
        assert_eq!(entry.attempts, 0);
        assert_eq!(entry.final_score, 0.0);
        assert_eq!(entry.final_feedback, "No feedback");
    }

    #[test]
    fn test_append_escalation_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_ESCALATION_LOG);
        let ticket = Ticket::new("System not working", "Something is broken").unwrap();
        let history = escalated_history();

        append_escalation(
            &EscalationLogEntry::new(&ticket, TicketCategory::Technical, &history),
            &path,
        );
        append_escalation(
            &EscalationLogEntry::new(&ticket, TicketCategory::General, &history),
            &path,
        );

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        let entries = read_escalations(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subject, "System not working");
        assert_eq!(entries[1].category, TicketCategory::General);
        assert_ne!(entries[0].escalation_id, entries[1].escalation_id);
    }

    #[test]
    fn test_append_to_unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("log.jsonl");
        let ticket = Ticket::new("s", "d").unwrap();
        append_escalation(
            &EscalationLogEntry::new(&ticket, TicketCategory::General, &AttemptHistory::new(2)),
            &path,
        );
        assert!(!path.exists());
    }

    #[test]
    fn test_read_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let ticket = Ticket::new("s", "d").unwrap();
        append_escalation(
            &EscalationLogEntry::new(&ticket, TicketCategory::Billing, &AttemptHistory::new(2)),
            &path,
        );
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();

        assert_eq!(read_escalations(&path).unwrap().len(), 1);
    }
}
