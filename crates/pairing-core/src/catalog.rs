use crate::types::{Actor, Participant, Role};

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// An ordered collection of actors of one role, keyed by identifier.
///
/// Order is the input order and is never rebalanced: batches always take a
/// prefix, so identical input yields identical batches.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    role: Role,
    actors: Vec<Actor>,
}

impl Pool {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            actors: Vec::new(),
        }
    }

    pub fn from_actors(role: Role, actors: impl IntoIterator<Item = Actor>) -> Self {
        let mut pool = Self::new(role);
        for actor in actors {
            pool.push(actor);
        }
        pool
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Append an actor. Returns `false` (and leaves the pool unchanged) when
    /// the role does not match or the identifier is already present.
    pub fn push(&mut self, actor: Actor) -> bool {
        if actor.role != self.role || self.contains(&actor.id) {
            return false;
        }
        self.actors.push(actor);
        true
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actors.iter().any(|a| a.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Actor> {
        let pos = self.actors.iter().position(|a| a.id == id)?;
        Some(self.actors.remove(pos))
    }

    /// The first `n` actors in pool order (fewer if the pool is smaller).
    pub fn head(&self, n: usize) -> &[Actor] {
        &self.actors[..n.min(self.actors.len())]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    /// Remove every actor whose capacity has dropped to zero or below and
    /// return their identifiers in pool order.
    pub fn retain_with_capacity(&mut self) -> Vec<String> {
        let mut retired = Vec::new();
        self.actors.retain(|a| {
            if a.capacity > 0 {
                true
            } else {
                retired.push(a.id.clone());
                false
            }
        });
        retired
    }
}

// ---------------------------------------------------------------------------
// ActorCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ActorCatalog {
    pub supply: Pool,
    pub demand: Pool,
}

/// What happened while partitioning the source population.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionReport {
    /// Records whose role was neither `Mentor` nor `Mentee`.
    pub unknown_role: Vec<String>,
    /// Second and later records for an identifier already in the pool.
    pub duplicates: Vec<String>,
    /// Mentors that start with no capacity. They stay in the pool and are
    /// retired after the first round they take part in.
    pub without_capacity: Vec<String>,
    /// Every source record, including the ones dropped above.
    pub input_rows: usize,
}

impl ActorCatalog {
    pub fn new(supply: Pool, demand: Pool) -> Self {
        Self { supply, demand }
    }

    /// Partition the source population into the two pools.
    ///
    /// Unknown roles are dropped without error. Mentors with no capacity are
    /// kept: they still count toward batch sizing until reconciliation
    /// retires them.
    pub fn from_participants<'a>(
        participants: impl IntoIterator<Item = &'a Participant>,
    ) -> (Self, PartitionReport) {
        let mut catalog = Self::new(Pool::new(Role::Supply), Pool::new(Role::Demand));
        let mut report = PartitionReport::default();

        for p in participants {
            report.input_rows += 1;
            let Some(actor) = Actor::from_participant(p) else {
                tracing::debug!(email = %p.email, role = %p.role, "dropping participant with unrecognized role");
                report.unknown_role.push(p.email.clone());
                continue;
            };
            let id = actor.id.clone();
            let without_capacity = actor.role == Role::Supply && actor.capacity <= 0;
            let pool = match actor.role {
                Role::Supply => &mut catalog.supply,
                Role::Demand => &mut catalog.demand,
            };
            if !pool.push(actor) {
                tracing::warn!(email = %id, "duplicate participant, keeping the first record");
                report.duplicates.push(id);
            } else if without_capacity {
                tracing::warn!(email = %id, "mentor has no capacity");
                report.without_capacity.push(id);
            }
        }

        (catalog, report)
    }

    pub fn total(&self) -> usize {
        self.supply.len() + self.demand.len()
    }
}
