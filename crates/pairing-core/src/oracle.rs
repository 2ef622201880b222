use crate::error::{PairingError, Result};
use crate::types::{Actor, Participant, ProposedAllocation};

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// The actors sent to the oracle in one round.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// 1-based round number.
    pub round: usize,
    pub is_final_round: bool,
    pub mentors: Vec<Actor>,
    pub mentees: Vec<Actor>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.mentors.len() + self.mentees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentors.is_empty() && self.mentees.is_empty()
    }

    pub fn has_mentor(&self, id: &str) -> bool {
        self.mentors.iter().any(|a| a.id == id)
    }

    pub fn has_mentee(&self, id: &str) -> bool {
        self.mentees.iter().any(|a| a.id == id)
    }

    /// Mentors first, then mentees, each in pool order.
    pub fn records(&self) -> Vec<Participant> {
        self.mentors
            .iter()
            .chain(self.mentees.iter())
            .map(Actor::to_participant)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

/// The external matcher. One blocking call per round; the loop does not plan
/// the next batch until this returns.
///
/// Implementations return the parsed proposal list or an error. Any error
/// aborts the run.
pub trait Oracle {
    fn propose(&mut self, batch: &Batch) -> Result<Vec<ProposedAllocation>>;
}

impl<F> Oracle for F
where
    F: FnMut(&Batch) -> Result<Vec<ProposedAllocation>>,
{
    fn propose(&mut self, batch: &Batch) -> Result<Vec<ProposedAllocation>> {
        self(batch)
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

const SYSTEM_PROMPT: &str = r#"Help pair mentees with mentors in the provided JSON data. Each item is either a mentor or a mentee (see the "role" field). Follow these constraints:
- Only use mentors and mentees that appear in the provided JSON data.
- Never pair a mentor with more mentees than their "mentor_capacity".
- A mentor and mentee must have different managers, and a mentee must not be paired with their own manager.
- A mentor should be at least one level above the mentee, judged from the "title" field.
- Pair people on common goals or interests from the "objectives" and "details" fields.

For each pairing give a reason it is a good match and any reason it might not be ideal.
Rate from 0 to 10 how closely the mentor's and mentee's preferences align; the rating must be an integer.
Set "over_capacity" to true only if the pairing puts the mentor above their "mentor_capacity"; a mentor with capacity 2 paired with 2 mentees is not over capacity.

Respond with a JSON list and nothing else:
[
  {
    "mentor": "mentor email",
    "mentee": "mentee email",
    "reason_for": "why the mentor was paired with the mentee",
    "reason_against": "any reason this might not be a good match",
    "alignment_score": 7,
    "over_capacity": false
  }
]

Think step by step and check every constraint, especially capacity, before answering.
Only include valid matches."#;

/// Instructions given to the oracle alongside every batch.
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Serialize a batch as the JSON list the oracle receives.
pub fn render_batch(batch: &Batch) -> Result<String> {
    Ok(serde_json::to_string_pretty(&batch.records())?)
}

/// Parse the oracle's reply for `round`.
///
/// The reply must be a JSON list of allocation records. Nothing is repaired:
/// prose around the list, a truncated list or records without `mentor` and
/// `mentee` all fail.
pub fn parse_response(round: usize, text: &str) -> Result<Vec<ProposedAllocation>> {
    serde_json::from_str(text.trim()).map_err(|e| PairingError::UnparsableResponse {
        round,
        message: e.to_string(),
    })
}
