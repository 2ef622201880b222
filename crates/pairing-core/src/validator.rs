use crate::oracle::Batch;
use crate::types::{Allocation, ProposedAllocation};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// Score absent, null, empty or not a number.
    MissingScore,
    /// Score of zero or less outside the final round.
    NonPositiveScore { score: i64 },
    /// The mentor was not part of this batch.
    UnknownMentor { mentor: String },
    /// The mentee was not part of this batch.
    UnknownMentee { mentee: String },
    /// The mentee was already accepted earlier in the same reply.
    DuplicateMentee { mentee: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingScore => f.write_str("missing alignment score"),
            Rejection::NonPositiveScore { score } => {
                write!(f, "alignment score {score} is not positive")
            }
            Rejection::UnknownMentor { mentor } => write!(f, "mentor {mentor} not in batch"),
            Rejection::UnknownMentee { mentee } => write!(f, "mentee {mentee} not in batch"),
            Rejection::DuplicateMentee { mentee } => {
                write!(f, "mentee {mentee} already paired in this reply")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub accepted: Vec<Allocation>,
    pub rejected: Vec<(ProposedAllocation, Rejection)>,
}

/// Filter the oracle's proposals for the current batch.
///
/// Eligibility (managers, levels, interests) is the oracle's call and is not
/// re-checked here. What is checked:
///
/// - both sides must belong to `batch`;
/// - a score must be present and numeric;
/// - outside the final round the score must be positive. The final round
///   accepts any score, since no later round could pick up what is dropped;
/// - a mentee is accepted at most once per reply.
///
/// Over-committed mentors are deliberately not rejected; reconciliation
/// absorbs them.
pub fn validate(raw: Vec<ProposedAllocation>, batch: &Batch, is_final_round: bool) -> Validation {
    let mut validation = Validation::default();
    let mut seen_mentees: HashSet<String> = HashSet::new();

    for proposal in raw {
        match check(&proposal, batch, is_final_round, &seen_mentees) {
            Ok(score) => {
                seen_mentees.insert(proposal.mentee.clone());
                validation
                    .accepted
                    .push(Allocation::from_proposed(proposal, score));
            }
            Err(reason) => {
                tracing::debug!(
                    round = batch.round,
                    mentor = %proposal.mentor,
                    mentee = %proposal.mentee,
                    %reason,
                    "rejected allocation"
                );
                validation.rejected.push((proposal, reason));
            }
        }
    }

    tracing::info!(
        round = batch.round,
        accepted = validation.accepted.len(),
        rejected = validation.rejected.len(),
        "number of allocations removed by validation: {}",
        validation.rejected.len()
    );
    validation
}

fn check(
    proposal: &ProposedAllocation,
    batch: &Batch,
    is_final_round: bool,
    seen_mentees: &HashSet<String>,
) -> Result<i64, Rejection> {
    if !batch.has_mentor(&proposal.mentor) {
        return Err(Rejection::UnknownMentor {
            mentor: proposal.mentor.clone(),
        });
    }
    if !batch.has_mentee(&proposal.mentee) {
        return Err(Rejection::UnknownMentee {
            mentee: proposal.mentee.clone(),
        });
    }
    let score = proposal.score().ok_or(Rejection::MissingScore)?;
    if !is_final_round && score <= 0 {
        return Err(Rejection::NonPositiveScore { score });
    }
    if seen_mentees.contains(&proposal.mentee) {
        return Err(Rejection::DuplicateMentee {
            mentee: proposal.mentee.clone(),
        });
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Actor;
    use serde_json::json;

    fn batch() -> Batch {
        Batch {
            round: 1,
            is_final_round: false,
            mentors: vec![Actor::mentor("m1", 2), Actor::mentor("m2", 1)],
            mentees: vec![
                Actor::mentee("e1"),
                Actor::mentee("e2"),
                Actor::mentee("e3"),
            ],
        }
    }

    fn proposal(mentor: &str, mentee: &str, score: serde_json::Value) -> ProposedAllocation {
        ProposedAllocation {
            mentor: mentor.into(),
            mentee: mentee.into(),
            reason_for: "shared goals".into(),
            reason_against: "different time zones".into(),
            alignment_score: Some(score),
            over_capacity: Some(json!(false)),
        }
    }

    #[test]
    fn accepts_positive_scores_and_keeps_rationale() {
        let v = validate(vec![proposal("m1", "e1", json!(8))], &batch(), false);
        assert_eq!(v.accepted.len(), 1);
        assert!(v.rejected.is_empty());
        let a = &v.accepted[0];
        assert_eq!(a.alignment_score, 8);
        assert_eq!(a.reason_for, "shared goals");
        assert_eq!(a.reason_against, "different time zones");
        assert!(!a.over_capacity);
    }

    #[test]
    fn rejects_missing_or_empty_score_in_every_round() {
        let mut missing = proposal("m1", "e1", json!(1));
        missing.alignment_score = None;
        let raw = vec![missing, proposal("m1", "e2", json!(""))];
        for is_final in [false, true] {
            let v = validate(raw.clone(), &batch(), is_final);
            assert!(v.accepted.is_empty());
            assert!(v
                .rejected
                .iter()
                .all(|(_, r)| *r == Rejection::MissingScore));
        }
    }

    #[test]
    fn non_final_round_rejects_zero_and_negative_scores() {
        let raw = vec![
            proposal("m1", "e1", json!(0)),
            proposal("m1", "e2", json!(-2)),
            proposal("m2", "e3", json!(1)),
        ];
        let v = validate(raw, &batch(), false);
        assert_eq!(v.accepted.len(), 1);
        assert_eq!(v.accepted[0].mentee, "e3");
        assert_eq!(
            v.rejected[0].1,
            Rejection::NonPositiveScore { score: 0 }
        );
    }

    #[test]
    fn final_round_never_rejects_on_score_alone() {
        let raw = vec![
            proposal("m1", "e1", json!(0)),
            proposal("m1", "e2", json!(-2)),
            proposal("m2", "e3", json!(9)),
        ];
        let strict = validate(raw.clone(), &batch(), false);
        let lenient = validate(raw, &batch(), true);
        assert_eq!(lenient.accepted.len(), 3);
        for a in &strict.accepted {
            assert!(lenient.accepted.contains(a));
        }
    }

    #[test]
    fn rejects_references_outside_the_batch() {
        let raw = vec![
            proposal("stranger", "e1", json!(9)),
            proposal("m1", "ghost", json!(9)),
        ];
        let v = validate(raw, &batch(), true);
        assert!(v.accepted.is_empty());
        assert_eq!(
            v.rejected[0].1,
            Rejection::UnknownMentor { mentor: "stranger".into() }
        );
        assert_eq!(
            v.rejected[1].1,
            Rejection::UnknownMentee { mentee: "ghost".into() }
        );
    }

    #[test]
    fn second_pairing_for_same_mentee_is_rejected() {
        let raw = vec![
            proposal("m1", "e1", json!(6)),
            proposal("m2", "e1", json!(9)),
        ];
        let v = validate(raw, &batch(), false);
        assert_eq!(v.accepted.len(), 1);
        assert_eq!(v.accepted[0].mentor, "m1");
        assert_eq!(
            v.rejected[0].1,
            Rejection::DuplicateMentee { mentee: "e1".into() }
        );
    }

    #[test]
    fn low_scored_duplicate_does_not_block_later_valid_pairing() {
        let raw = vec![
            proposal("m1", "e1", json!(0)),
            proposal("m2", "e1", json!(5)),
        ];
        let v = validate(raw, &batch(), false);
        assert_eq!(v.accepted.len(), 1);
        assert_eq!(v.accepted[0].mentor, "m2");
    }

    #[test]
    fn over_committed_mentor_is_not_rejected() {
        let mut p = proposal("m2", "e2", json!(7));
        p.over_capacity = Some(json!("true"));
        let raw = vec![proposal("m2", "e1", json!(7)), p];
        let v = validate(raw, &batch(), false);
        assert_eq!(v.accepted.len(), 2);
        assert!(v.accepted[1].over_capacity);
    }

    #[test]
    fn rejection_messages_are_readable() {
        assert_eq!(
            Rejection::NonPositiveScore { score: 0 }.to_string(),
            "alignment score 0 is not positive"
        );
        assert_eq!(
            Rejection::UnknownMentee { mentee: "x".into() }.to_string(),
            "mentee x not in batch"
        );
    }
}
