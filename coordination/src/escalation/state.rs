//! Attempt History: ordered, bounded record of scored drafts for one ticket

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::review::{CriteriaScores, Review};

/// One scored draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Which attempt this was (1-indexed)
    pub attempt_index: u32,
    /// Draft response produced by the drafter (or its fallback)
    pub draft: String,
    /// Gate-facing score in [0, 1]
    pub score: f64,
    /// Reviewer feedback for this draft
    pub feedback: String,
    /// Per-criterion breakdown from the reviewer
    pub criteria: CriteriaScores,
    /// The reviewer's own approve/reject opinion (advisory)
    pub reviewer_approved: bool,
    /// Knowledge sources the draft was grounded on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// Whether the draft was the fallback text rather than a model draft
    #[serde(default)]
    pub draft_fallback: bool,
    /// Whether the review was synthesized after a reviewer failure
    #[serde(default)]
    pub review_fallback: bool,
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(attempt_index: u32, draft: impl Into<String>, review: &Review) -> Self {
        Self {
            attempt_index,
            draft: draft.into(),
            score: review.score,
            feedback: review.feedback.clone(),
            criteria: review.criteria,
            reviewer_approved: review.reviewer_approved,
            sources: Vec::new(),
            draft_fallback: false,
            review_fallback: review.fallback,
            timestamp: Utc::now(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_draft_fallback(mut self, draft_fallback: bool) -> Self {
        self.draft_fallback = draft_fallback;
        self
    }
}

/// Error returned when a record would break ordering or the attempt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptLimitExceeded {
    /// Index that was offered
    pub attempt_index: u32,
    /// Index the history expected next
    pub expected: u32,
    pub max_attempts: u32,
}

impl fmt::Display for AttemptLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expected > self.max_attempts {
            write!(
                f,
                "Attempt {} exceeds budget of {} attempts",
                self.attempt_index, self.max_attempts
            )
        } else {
            write!(
                f,
                "Attempt {} out of order (expected {})",
                self.attempt_index, self.expected
            )
        }
    }
}

impl std::error::Error for AttemptLimitExceeded {}

/// All attempts for a single ticket.
///
/// Invariant: `attempts[i].attempt_index == i + 1` and
/// `attempts.len() <= max_attempts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptHistory {
    max_attempts: u32,
    attempts: Vec<AttemptRecord>,
}

impl AttemptHistory {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: Vec::new(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Index the next recorded attempt must carry.
    pub fn next_index(&self) -> u32 {
        self.attempts.len() as u32 + 1
    }

    /// Attempts left before the budget runs out.
    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts.len() as u32)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Append a record, enforcing strict ordering and the budget.
    pub fn record(&mut self, record: AttemptRecord) -> Result<&AttemptRecord, AttemptLimitExceeded> {
        let expected = self.next_index();
        if record.attempt_index != expected || expected > self.max_attempts {
            return Err(AttemptLimitExceeded {
                attempt_index: record.attempt_index,
                expected,
                max_attempts: self.max_attempts,
            });
        }
        self.attempts.push(record);
        Ok(&self.attempts[self.attempts.len() - 1])
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn last(&self) -> Option<&AttemptRecord> {
        self.attempts.last()
    }

    /// Feedback from the most recent review, used to refine the next attempt.
    pub fn last_feedback(&self) -> Option<&str> {
        self.last().map(|a| a.feedback.as_str())
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// All reviewer feedback, in attempt order.
    pub fn feedback(&self) -> Vec<String> {
        self.attempts.iter().map(|a| a.feedback.clone()).collect()
    }

    pub fn into_attempts(self) -> Vec<AttemptRecord> {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(score: f64, feedback: &str) -> Review {
        Review::new(score, false, CriteriaScores::uniform(score), feedback)
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = AttemptHistory::new(2);
        assert!(history.is_empty());
        assert_eq!(history.next_index(), 1);
        assert_eq!(history.remaining(), 2);
        assert!(history.last_feedback().is_none());
    }

    #[test]
    fn test_record_in_order() {
        let mut history = AttemptHistory::new(2);
        history
            .record(AttemptRecord::new(1, "draft one", &review(0.4, "add steps")))
            .unwrap();
        assert_eq!(history.next_index(), 2);
        assert_eq!(history.last_feedback(), Some("add steps"));

        history
            .record(AttemptRecord::new(2, "draft two", &review(0.6, "still vague")))
            .unwrap();
        assert!(history.is_exhausted());
        assert_eq!(history.feedback(), vec!["add steps", "still vague"]);
    }

    #[test]
    fn test_record_rejects_out_of_order() {
        let mut history = AttemptHistory::new(2);
        let err = history
            .record(AttemptRecord::new(2, "skipped", &review(0.9, "ok")))
            .unwrap_err();
        assert_eq!(err.expected, 1);
        assert!(err.to_string().contains("out of order"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_record_rejects_over_budget() {
        let mut history = AttemptHistory::new(1);
        history
            .record(AttemptRecord::new(1, "only", &review(0.1, "bad")))
            .unwrap();
        let err = history
            .record(AttemptRecord::new(2, "extra", &review(0.9, "good")))
            .unwrap_err();
        assert!(err.to_string().contains("exceeds budget"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_record_copies_review_fields() {
        let record = AttemptRecord::new(1, "draft", &Review::fallback())
            .with_sources(vec!["billing_faq.md".into()])
            .with_draft_fallback(true);
        assert_eq!(record.score, 0.3);
        assert!(record.review_fallback);
        assert!(record.draft_fallback);
        assert_eq!(record.sources, vec!["billing_faq.md"]);
    }
}
