use crate::catalog::Pool;
use crate::types::Allocation;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Capacity decrements applied (one per allocation whose mentor was found).
    pub decrements: usize,
    /// Mentees removed from the demand pool.
    pub mentees_removed: usize,
    /// Allocations whose mentor was no longer in the supply pool.
    pub dangling_mentors: usize,
    /// Mentors removed because their capacity reached zero, in pool order.
    pub retired_mentors: Vec<String>,
}

/// Apply accepted allocations to the pools.
///
/// Every allocation costs its mentor exactly one unit of capacity, whatever
/// the allocation's own `over_capacity` flag says; a mentor handed more
/// mentees than it had left ends below zero and is retired with the rest.
/// Matched mentees leave the demand pool. Unknown mentors and mentees are
/// skipped. Afterwards the supply pool holds only mentors with capacity > 0.
pub fn reconcile(supply: &mut Pool, demand: &mut Pool, accepted: &[Allocation]) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for allocation in accepted {
        match supply.get_mut(&allocation.mentor) {
            Some(mentor) => {
                mentor.capacity -= 1;
                report.decrements += 1;
                tracing::debug!(
                    mentor = %mentor.id,
                    capacity = mentor.capacity,
                    "updated mentor capacity"
                );
            }
            None => report.dangling_mentors += 1,
        }

        if demand.remove(&allocation.mentee).is_some() {
            report.mentees_removed += 1;
            tracing::debug!(mentee = %allocation.mentee, "removed matched mentee");
        }
    }

    report.retired_mentors = supply.retain_with_capacity();
    report
}
