//! Decision gate property tests: sweep scores and budgets through the gate,
//! the attempt history and the outcome types without any language model.
//!
//! Tests verify:
//! - Approval happens iff the score reaches the threshold
//! - No ticket ever records more than `max_attempts` attempts
//! - Escalation happens only with the budget exhausted
//! - Escalation details carry every attempt in order
//! - Retrieval stays inside the ticket's category

use coordination::{
    append_escalation, read_escalations, AttemptHistory, AttemptRecord, CriteriaScores,
    DecisionGate, EscalationDetails, EscalationLogEntry, GateConfig, GateDecision, KnowledgeBase,
    Outcome, ResolutionReport, Review, StaticKnowledgeBase, Ticket, TicketCategory,
};

/// Drive the gate with a fixed score sequence, mirroring the resolver loop.
fn run(gate: &DecisionGate, scores: &[f64]) -> (Outcome, AttemptHistory) {
    let ticket = Ticket::new("Subject", "Description").unwrap();
    let mut history = AttemptHistory::new(gate.config().max_attempts);
    let mut scores = scores.iter().copied();

    loop {
        let index = history.next_index();
        let score = scores.next().unwrap_or(0.0);
        let review = Review::new(score, false, CriteriaScores::uniform(score), format!("fb {index}"));
        history
            .record(AttemptRecord::new(index, format!("draft {index}"), &review))
            .unwrap();

        match gate.decide(review.score, index) {
            GateDecision::Approve => {
                return (
                    Outcome::Approved {
                        response: format!("draft {index}"),
                        score: review.score,
                        attempts: index,
                    },
                    history,
                )
            }
            GateDecision::Retry => continue,
            GateDecision::Escalate => {
                let details = EscalationDetails::from_history(&ticket, &history);
                return (Outcome::Escalated(details), history);
            }
        }
    }
}

fn score_grid() -> Vec<f64> {
    (0..=20).map(|i| i as f64 * 0.05).collect()
}

#[test]
fn approval_iff_threshold_met_on_first_attempt() {
    let gate = DecisionGate::new();
    for score in score_grid() {
        let (outcome, history) = run(&gate, &[score, 0.0]);
        if score >= 0.75 {
            assert!(outcome.is_approved(), "score {score} should approve");
            assert_eq!(history.len(), 1);
        } else {
            assert!(outcome.is_escalated(), "score {score} should escalate");
            assert_eq!(history.len(), 2);
        }
    }
}

#[test]
fn second_attempt_decides_when_first_fails() {
    let gate = DecisionGate::new();
    for second in score_grid() {
        let (outcome, history) = run(&gate, &[0.5, second]);
        assert_eq!(history.len(), 2);
        assert_eq!(outcome.is_approved(), second >= 0.75);
    }
}

#[test]
fn attempts_never_exceed_budget() {
    for max_attempts in 1..=5 {
        let gate = DecisionGate::with_config(GateConfig {
            approval_threshold: 0.75,
            max_attempts,
        })
        .unwrap();
        let (outcome, history) = run(&gate, &[0.1; 8]);
        assert!(outcome.is_escalated());
        assert_eq!(history.len() as u32, max_attempts);
        assert!(history.is_exhausted());

        // The history refuses anything past the budget
        let extra = AttemptRecord::new(max_attempts + 1, "late", &Review::fallback());
        let mut history = history;
        assert!(history.record(extra).is_err());
    }
}

#[test]
fn escalation_carries_every_attempt_in_order() {
    let (outcome, _) = run(&DecisionGate::new(), &[0.2, 0.4]);
    let Outcome::Escalated(details) = outcome else {
        panic!("expected escalation");
    };
    let indices: Vec<u32> = details.history.iter().map(|a| a.attempt_index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(details.reviewer_feedback, vec!["fb 1", "fb 2"]);

    let report = ResolutionReport::from_outcome(TicketCategory::General, Vec::new(), &Outcome::Escalated(details));
    assert_eq!(report.score, 0.4);
    assert_eq!(report.draft, "draft 2");
    assert_eq!(report.feedback, "fb 2");
}

#[test]
fn out_of_range_scores_are_normalized_before_gating() {
    let gate = DecisionGate::new();
    let (outcome, _) = run(&gate, &[1.5]);
    let Outcome::Approved { score, .. } = outcome else {
        panic!("expected approval");
    };
    assert_eq!(score, 1.0);

    let (outcome, history) = run(&gate, &[-3.0, f64::NAN]);
    assert!(outcome.is_escalated());
    assert!(history.attempts().iter().all(|a| a.score == 0.0));
}

#[test]
fn escalation_log_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("escalation_log.jsonl");
    let ticket = Ticket::new("Account locked", "Too many failed logins").unwrap();
    let (_, history) = run(&DecisionGate::new(), &[0.3, 0.35]);

    let entry = EscalationLogEntry::new(&ticket, TicketCategory::Security, &history);
    append_escalation(&entry, &path);

    let entries = read_escalations(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, TicketCategory::Security);
    assert_eq!(entries[0].attempts, 2);
    assert_eq!(entries[0].final_score, 0.35);
}

#[test]
fn retrieval_stays_in_category() {
    let kb = StaticKnowledgeBase::builtin();
    for category in TicketCategory::ALL {
        let snippets = kb.retrieve("password refund api error account", category, 10);
        let sources: Vec<&str> = kb
            .entries_for(category)
            .map(|e| e.source.as_str())
            .collect();
        assert!(snippets.iter().all(|s| sources.contains(&s.source.as_str())));
        assert!(snippets
            .windows(2)
            .all(|w| w[0].relevance_score >= w[1].relevance_score));
    }
}
