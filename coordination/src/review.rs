//! Reviewer verdict on a single draft.

use serde::{Deserialize, Serialize};

/// Score assigned when the reviewer could not be consulted.
pub const FALLBACK_REVIEW_SCORE: f64 = 0.3;

/// Feedback recorded when the reviewer could not be consulted.
pub const FALLBACK_REVIEW_FEEDBACK: &str =
    "Unable to complete review due to technical error. Please revise the response.";

/// Clamp a score into [0, 1]; NaN counts as 0.
pub fn normalize_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Per-criterion scores, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CriteriaScores {
    /// Factually accurate and grounded in the retrieved context
    #[serde(default)]
    pub correctness: f64,
    /// Actionable steps that anticipate the customer's needs
    #[serde(default)]
    pub usefulness: f64,
    /// Professional, empathetic and concise
    #[serde(default)]
    pub tone: f64,
    /// Avoids risky instructions and overpromising
    #[serde(default)]
    pub safety: f64,
}

impl CriteriaScores {
    pub fn uniform(score: f64) -> Self {
        let score = normalize_score(score);
        Self {
            correctness: score,
            usefulness: score,
            tone: score,
            safety: score,
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            correctness: normalize_score(self.correctness),
            usefulness: normalize_score(self.usefulness),
            tone: normalize_score(self.tone),
            safety: normalize_score(self.safety),
        }
    }
}

/// The scorer's verdict on a draft.
///
/// `score` is what the decision gate acts on. `reviewer_approved` is the
/// reviewer's own opinion and is kept for diagnostics only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub score: f64,
    pub reviewer_approved: bool,
    pub criteria: CriteriaScores,
    pub feedback: String,
    /// True when this review was synthesized because the reviewer failed.
    #[serde(default)]
    pub fallback: bool,
}

impl Review {
    pub fn new(
        score: f64,
        reviewer_approved: bool,
        criteria: CriteriaScores,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            score: normalize_score(score),
            reviewer_approved,
            criteria: criteria.normalized(),
            feedback: feedback.into(),
            fallback: false,
        }
    }

    /// Rejecting review used when the reviewer errored or timed out.
    pub fn fallback() -> Self {
        Self {
            score: FALLBACK_REVIEW_SCORE,
            reviewer_approved: false,
            criteria: CriteriaScores::uniform(FALLBACK_REVIEW_SCORE),
            feedback: FALLBACK_REVIEW_FEEDBACK.to_string(),
            fallback: true,
        }
    }
}
