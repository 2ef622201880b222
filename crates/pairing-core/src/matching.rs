use crate::catalog::{ActorCatalog, Pool};
use crate::error::{PairingError, Result};
use crate::oracle::{Batch, Oracle};
use crate::planner::{is_final_round, plan_batch};
use crate::reconcile::reconcile;
use crate::types::{Actor, Allocation};
use crate::validator::validate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Termination / LoopState
// ---------------------------------------------------------------------------

/// Why a run stopped. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No mentor with remaining capacity is left.
    SupplyExhausted,
    /// Every mentee has been placed.
    DemandExhausted,
    /// The whole input population has been through at least one batch.
    InputProcessed,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::SupplyExhausted => "supply_exhausted",
            Termination::DemandExhausted => "demand_exhausted",
            Termination::InputProcessed => "input_processed",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// The final round, which takes every remaining mentor.
    Draining,
    Exhausted(Termination),
    /// An oracle call failed; the run cannot continue.
    Aborted,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Exhausted(_) | LoopState::Aborted)
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round: usize,
    pub is_final_round: bool,
    pub mentors: usize,
    pub mentees: usize,
    pub proposed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub retired_mentors: usize,
    pub remaining_mentors: usize,
    pub remaining_mentees: usize,
    pub total_processed: usize,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub allocations: Vec<Allocation>,
    /// Mentees still in the pool that were never part of an accepted pairing.
    pub unmatched: Vec<Actor>,
    pub termination: Termination,
    pub rounds: Vec<RoundReport>,
    pub total_input: usize,
    pub total_processed: usize,
}

// ---------------------------------------------------------------------------
// MatchingLoop
// ---------------------------------------------------------------------------

/// Drives batches through the oracle until one pool runs dry or the whole
/// population has been considered.
///
/// The loop owns both pools and the accumulated allocations. Exactly one
/// batch is in flight at a time: batch n+1 is planned from the capacity left
/// after batch n is reconciled.
pub struct MatchingLoop {
    target_capacity: usize,
    supply: Pool,
    demand: Pool,
    total_input: usize,
    total_processed: usize,
    allocations: Vec<Allocation>,
    matched: HashSet<String>,
    rounds: Vec<RoundReport>,
    state: LoopState,
}

impl MatchingLoop {
    /// `input_rows` is the size of the source population, including records
    /// that never made it into a pool.
    pub fn new(catalog: ActorCatalog, input_rows: usize, target_capacity: usize) -> Self {
        let total_input = input_rows.max(catalog.total());
        let mut this = Self {
            target_capacity,
            supply: catalog.supply,
            demand: catalog.demand,
            total_input,
            total_processed: 0,
            allocations: Vec::new(),
            matched: HashSet::new(),
            rounds: Vec::new(),
            state: LoopState::Running,
        };
        this.state = this.next_state();
        this
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn supply(&self) -> &Pool {
        &self.supply
    }

    pub fn demand(&self) -> &Pool {
        &self.demand
    }

    pub fn total_input(&self) -> usize {
        self.total_input
    }

    pub fn total_processed(&self) -> usize {
        self.total_processed
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn rounds(&self) -> &[RoundReport] {
        &self.rounds
    }

    /// Run one round: plan, call the oracle, validate, reconcile.
    ///
    /// Returns the state after the round. Calling `step` on a terminal loop
    /// is a no-op. An oracle failure moves the loop to `Aborted` and returns
    /// the error with the round number attached.
    pub fn step(&mut self, oracle: &mut dyn Oracle) -> Result<LoopState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let round = self.rounds.len() + 1;
        let remaining_total = self.total_input.saturating_sub(self.total_processed);
        let is_final = is_final_round(remaining_total, self.target_capacity);
        self.state = if is_final {
            LoopState::Draining
        } else {
            LoopState::Running
        };

        let plan = plan_batch(&self.supply, self.target_capacity, is_final, self.demand.len());
        if plan.is_empty() {
            self.state = LoopState::Exhausted(Termination::SupplyExhausted);
            return Ok(self.state);
        }

        let batch = Batch {
            round,
            is_final_round: is_final,
            mentors: self.supply.head(plan.num_supply).to_vec(),
            mentees: self.demand.head(plan.num_demand).to_vec(),
        };
        tracing::info!(
            round,
            is_final_round = is_final,
            mentors = batch.mentors.len(),
            mentees = batch.mentees.len(),
            "sending batch of {}",
            batch.len()
        );

        let proposals = match oracle.propose(&batch) {
            Ok(p) => p,
            Err(e) => {
                self.state = LoopState::Aborted;
                tracing::error!(round, error = %e, "oracle call failed, aborting run");
                return Err(with_round(round, e));
            }
        };
        let proposed = proposals.len();

        let validation = validate(proposals, &batch, is_final);
        let reconciled = reconcile(&mut self.supply, &mut self.demand, &validation.accepted);
        let accepted = validation.accepted.len();
        for allocation in &validation.accepted {
            self.matched.insert(allocation.mentee.clone());
        }
        self.allocations.extend(validation.accepted);
        self.total_processed += plan.size();

        let report = RoundReport {
            round,
            is_final_round: is_final,
            mentors: plan.num_supply,
            mentees: plan.num_demand,
            proposed,
            accepted,
            rejected: validation.rejected.len(),
            retired_mentors: reconciled.retired_mentors.len(),
            remaining_mentors: self.supply.len(),
            remaining_mentees: self.demand.len(),
            total_processed: self.total_processed,
        };
        tracing::info!(
            round,
            accepted = report.accepted,
            rejected = report.rejected,
            remaining_mentors = report.remaining_mentors,
            remaining_mentees = report.remaining_mentees,
            total_processed = report.total_processed,
            "round complete"
        );
        self.rounds.push(report);

        self.state = self.next_state();
        if let LoopState::Exhausted(reason) = self.state {
            tracing::info!(
                %reason,
                mentors = self.supply.len(),
                mentees = self.demand.len(),
                "matching stopped"
            );
        }
        Ok(self.state)
    }

    /// Step until a terminal state and collect the outcome.
    pub fn run(mut self, oracle: &mut dyn Oracle) -> Result<RunOutcome> {
        while !self.state.is_terminal() {
            self.step(oracle)?;
        }
        let LoopState::Exhausted(termination) = self.state else {
            // Aborted always surfaces through `step`'s error above.
            return Err(PairingError::Oracle {
                round: self.rounds.len() + 1,
                message: "run aborted".into(),
            });
        };

        let unmatched: Vec<Actor> = self
            .demand
            .iter()
            .filter(|a| !self.matched.contains(&a.id))
            .cloned()
            .collect();

        tracing::info!(
            reason = %termination,
            rounds = self.rounds.len(),
            matched = self.allocations.len(),
            unmatched = unmatched.len(),
            total_processed = self.total_processed,
            "matching finished"
        );

        Ok(RunOutcome {
            allocations: self.allocations,
            unmatched,
            termination,
            rounds: self.rounds,
            total_input: self.total_input,
            total_processed: self.total_processed,
        })
    }

    fn next_state(&self) -> LoopState {
        if self.demand.is_empty() {
            LoopState::Exhausted(Termination::DemandExhausted)
        } else if self.supply.is_empty() {
            LoopState::Exhausted(Termination::SupplyExhausted)
        } else if self.total_processed >= self.total_input {
            LoopState::Exhausted(Termination::InputProcessed)
        } else {
            LoopState::Running
        }
    }
}

fn with_round(round: usize, err: PairingError) -> PairingError {
    match err {
        PairingError::Oracle { message, .. } => PairingError::Oracle { round, message },
        PairingError::UnparsableResponse { message, .. } => {
            PairingError::UnparsableResponse { round, message }
        }
        other => PairingError::Oracle {
            round,
            message: other.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
