use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Mentor")]
    Supply,
    #[serde(rename = "Mentee")]
    Demand,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Supply => "Mentor",
            Role::Demand => "Mentee",
        }
    }

    /// Parse a role exactly as the population provider presents it. Anything
    /// other than the two recognized values yields `None`.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "Mentor" => Some(Role::Supply),
            "Mentee" => Some(Role::Demand),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Eligibility attributes. The core loop never reads these; they are carried
/// through batches so the oracle can judge manager, level and interest rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objectives: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Any other survey columns, passed to the oracle verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Participant (wire record)
// ---------------------------------------------------------------------------

/// One row of the source population, as read from the input file and as
/// written back out for unmatched mentees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(alias = "Role")]
    pub role: String,
    #[serde(default, alias = "capacity", skip_serializing_if = "Option::is_none")]
    pub mentor_capacity: Option<i64>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    /// Remaining capacity. Only meaningful for mentors; mentees carry 0.
    /// Signed because reconciliation may push an over-committed mentor
    /// below zero before the cleanup pass removes it.
    pub capacity: i64,
    pub attributes: Attributes,
}

impl Actor {
    pub fn mentor(id: impl Into<String>, capacity: i64) -> Self {
        Self {
            id: id.into(),
            role: Role::Supply,
            capacity,
            attributes: Attributes::default(),
        }
    }

    pub fn mentee(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Demand,
            capacity: 0,
            attributes: Attributes::default(),
        }
    }

    /// Build an actor from a source record. Returns `None` for records whose
    /// role is not one of the recognized values.
    pub fn from_participant(p: &Participant) -> Option<Self> {
        let role = Role::parse(&p.role)?;
        let capacity = match role {
            Role::Supply => p.mentor_capacity.unwrap_or(0).max(0),
            Role::Demand => 0,
        };
        Some(Self {
            id: p.email.clone(),
            role,
            capacity,
            attributes: p.attributes.clone(),
        })
    }

    pub fn to_participant(&self) -> Participant {
        Participant {
            email: self.id.clone(),
            role: self.role.as_str().to_string(),
            mentor_capacity: match self.role {
                Role::Supply => Some(self.capacity),
                Role::Demand => None,
            },
            attributes: self.attributes.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProposedAllocation (raw oracle output)
// ---------------------------------------------------------------------------

/// A pairing exactly as the oracle returned it. `mentor` and `mentee` are
/// required; a record without them fails to parse and aborts the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAllocation {
    pub mentor: String,
    pub mentee: String,
    #[serde(default)]
    pub reason_for: String,
    #[serde(default)]
    pub reason_against: String,
    #[serde(default)]
    pub alignment_score: Option<serde_json::Value>,
    #[serde(default)]
    pub over_capacity: Option<serde_json::Value>,
}

impl ProposedAllocation {
    /// The alignment score as an integer. Missing, null, empty and
    /// non-numeric values all read as `None`.
    pub fn score(&self) -> Option<i64> {
        match self.alignment_score.as_ref()? {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            serde_json::Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    pub fn is_over_capacity(&self) -> bool {
        match &self.over_capacity {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Allocation (accepted)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub mentor: String,
    pub mentee: String,
    pub reason_for: String,
    pub reason_against: String,
    pub alignment_score: i64,
    pub over_capacity: bool,
}

impl Allocation {
    pub(crate) fn from_proposed(p: ProposedAllocation, score: i64) -> Self {
        let over_capacity = p.is_over_capacity();
        Self {
            mentor: p.mentor,
            mentee: p.mentee,
            reason_for: p.reason_for,
            reason_against: p.reason_against,
            alignment_score: score,
            over_capacity,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
