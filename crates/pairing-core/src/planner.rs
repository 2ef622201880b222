use crate::catalog::Pool;
use serde::Serialize;

/// How many mentors and mentees go into the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    pub num_supply: usize,
    pub num_demand: usize,
}

impl BatchPlan {
    pub fn size(&self) -> usize {
        self.num_supply + self.num_demand
    }

    pub fn is_empty(&self) -> bool {
        self.num_supply == 0
    }
}

/// The last round is the one where everything still unprocessed fits in a
/// single oracle call.
pub fn is_final_round(remaining_total: usize, target_capacity: usize) -> bool {
    remaining_total <= target_capacity
}

/// Decide the composition of the next batch.
///
/// Walks mentors in pool order, charging each `capacity + 1` (its mentees
/// plus a slot for the mentor itself), and stops once the running total
/// reaches `target_capacity`. The mentor that crosses the threshold is
/// included, so a batch may overshoot by at most one mentor's capacity.
/// On the final round every remaining mentor is taken.
///
/// The mentee count is the summed capacity of the chosen mentors, limited to
/// the mentees actually left. An empty supply pool yields an empty plan.
pub fn plan_batch(
    supply: &Pool,
    target_capacity: usize,
    is_final_round: bool,
    remaining_demand: usize,
) -> BatchPlan {
    if supply.is_empty() {
        return BatchPlan {
            num_supply: 0,
            num_demand: 0,
        };
    }

    let num_supply = if is_final_round {
        supply.len()
    } else {
        let mut capacity_used = 0usize;
        let mut count = 0usize;
        for mentor in supply.iter() {
            capacity_used = capacity_used
                .saturating_add(mentor_capacity(mentor.capacity))
                .saturating_add(1);
            count += 1;
            tracing::debug!(
                email = %mentor.id,
                capacity = mentor.capacity,
                capacity_used,
                "sizing batch"
            );
            if capacity_used >= target_capacity {
                break;
            }
        }
        count
    };

    let capacity = supply
        .head(num_supply)
        .iter()
        .fold(0usize, |acc, m| acc.saturating_add(mentor_capacity(m.capacity)));

    let plan = BatchPlan {
        num_supply,
        num_demand: capacity.min(remaining_demand),
    };
    tracing::debug!(
        mentors = plan.num_supply,
        mentees = plan.num_demand,
        mentee_slots = capacity,
        is_final_round,
        "planned batch"
    );
    plan
}

fn mentor_capacity(capacity: i64) -> usize {
    usize::try_from(capacity).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Actor, Role};

    fn supply(capacities: &[i64]) -> Pool {
        Pool::from_actors(
            Role::Supply,
            capacities
                .iter()
                .enumerate()
                .map(|(i, &c)| Actor::mentor(format!("m{i}"), c)),
        )
    }

    #[test]
    fn empty_supply_yields_empty_plan() {
        let plan = plan_batch(&Pool::new(Role::Supply), 12, false, 10);
        assert_eq!(plan, BatchPlan { num_supply: 0, num_demand: 0 });
        assert!(plan.is_empty());
        let plan = plan_batch(&Pool::new(Role::Supply), 12, true, 10);
        assert!(plan.is_empty());
    }

    #[test]
    fn stops_once_target_reached() {
        // 3 + 3 + 3 + 3 = 12 after four mentors of capacity 2
        let pool = supply(&[2, 2, 2, 2, 2, 2]);
        let plan = plan_batch(&pool, 12, false, 100);
        assert_eq!(plan.num_supply, 4);
        assert_eq!(plan.num_demand, 8);
        assert_eq!(plan.size(), 12);
    }

    #[test]
    fn includes_the_mentor_that_crosses_the_threshold() {
        // 4 + 4 + 4 = 12 ≥ 10 → three mentors, overshoot of 2
        let pool = supply(&[3, 3, 3, 3]);
        let plan = plan_batch(&pool, 10, false, 100);
        assert_eq!(plan.num_supply, 3);
        assert_eq!(plan.num_demand, 9);
    }

    #[test]
    fn single_large_mentor_overshoots_target() {
        let pool = supply(&[20]);
        let plan = plan_batch(&pool, 12, false, 50);
        assert_eq!(plan.num_supply, 1);
        assert_eq!(plan.num_demand, 20);

        let plan = plan_batch(&pool, 12, false, 7);
        assert_eq!(plan.num_supply, 1);
        assert_eq!(plan.num_demand, 7);
    }

    #[test]
    fn final_round_takes_every_mentor() {
        let pool = supply(&[5, 5, 5, 5]);
        let plan = plan_batch(&pool, 4, true, 3);
        assert_eq!(plan.num_supply, 4);
        assert_eq!(plan.num_demand, 3);
    }

    #[test]
    fn short_pool_takes_everything_below_target() {
        let pool = supply(&[1, 1]);
        let plan = plan_batch(&pool, 12, false, 10);
        assert_eq!(plan.num_supply, 2);
        assert_eq!(plan.num_demand, 2);
    }

    #[test]
    fn demand_limited_by_remaining_mentees() {
        let pool = supply(&[4, 4]);
        let plan = plan_batch(&pool, 12, false, 0);
        assert_eq!(plan.num_supply, 2);
        assert_eq!(plan.num_demand, 0);
    }

    #[test]
    fn zero_capacity_mentor_costs_one_slot() {
        // 1 + 3 + 3 + 3 + 3 = 13 ≥ 12 → five mentors, eight mentee slots
        let pool = supply(&[0, 2, 2, 2, 2, 2]);
        let plan = plan_batch(&pool, 12, false, 20);
        assert_eq!(plan.num_supply, 5);
        assert_eq!(plan.num_demand, 8);
    }

    #[test]
    fn huge_capacities_saturate_instead_of_overflowing() {
        let pool = supply(&[i64::MAX, i64::MAX, i64::MAX]);
        let plan = plan_batch(&pool, 12, false, 30);
        assert_eq!(plan.num_supply, 1);
        assert_eq!(plan.num_demand, 30);

        let plan = plan_batch(&pool, 12, true, 30);
        assert_eq!(plan.num_supply, 3);
        assert_eq!(plan.num_demand, 30);
    }

    #[test]
    fn final_round_threshold_is_inclusive() {
        assert!(is_final_round(12, 12));
        assert!(is_final_round(0, 12));
        assert!(!is_final_round(13, 12));
    }
}
