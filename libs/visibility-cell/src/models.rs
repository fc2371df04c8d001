// libs/visibility-cell/src/models.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use shared_models::{Appointment, Principal};

// ==============================================================================
// PREDICATE TREE
// ==============================================================================

/// Boolean expression over the named appointment access predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPredicate {
    /// `record.user_id == principal.id`
    OwnedByUser,
    /// `record.assigned_to == principal.id`
    AssignedToUser,
    /// `principal.id ∈ record.team` (set containment)
    OnPrincipalsTeam,
    /// `record.public`
    IsPublic,
    And(Vec<AccessPredicate>),
    Or(Vec<AccessPredicate>),
    Not(Box<AccessPredicate>),
}

impl AccessPredicate {
    pub fn evaluate(&self, principal: &Principal, appointment: &Appointment) -> bool {
        match self {
            AccessPredicate::OwnedByUser => appointment.user_id == principal.id,
            AccessPredicate::AssignedToUser => appointment.assigned_to == Some(principal.id),
            AccessPredicate::OnPrincipalsTeam => appointment.team.contains(&principal.id),
            AccessPredicate::IsPublic => appointment.public,
            AccessPredicate::And(terms) => terms.iter().all(|term| term.evaluate(principal, appointment)),
            AccessPredicate::Or(terms) => terms.iter().any(|term| term.evaluate(principal, appointment)),
            AccessPredicate::Not(term) => !term.evaluate(principal, appointment),
        }
    }

    pub fn and(self, other: AccessPredicate) -> AccessPredicate {
        match self {
            AccessPredicate::And(mut terms) => {
                terms.push(other);
                AccessPredicate::And(terms)
            }
            first => AccessPredicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: AccessPredicate) -> AccessPredicate {
        match self {
            AccessPredicate::Or(mut terms) => {
                terms.push(other);
                AccessPredicate::Or(terms)
            }
            first => AccessPredicate::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> AccessPredicate {
        AccessPredicate::Not(Box::new(self))
    }
}

impl fmt::Display for AccessPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, terms: &[AccessPredicate], op: &str) -> fmt::Result {
            write!(f, "(")?;
            for (index, term) in terms.iter().enumerate() {
                if index > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", term)?;
            }
            write!(f, ")")
        }

        match self {
            AccessPredicate::OwnedByUser => write!(f, "owned_by_user"),
            AccessPredicate::AssignedToUser => write!(f, "assigned_to_user"),
            AccessPredicate::OnPrincipalsTeam => write!(f, "on_principals_team"),
            AccessPredicate::IsPublic => write!(f, "is_public"),
            AccessPredicate::And(terms) => join(f, terms, "AND"),
            AccessPredicate::Or(terms) => join(f, terms, "OR"),
            AccessPredicate::Not(term) => write!(f, "NOT {}", term),
        }
    }
}

// ==============================================================================
// LISTING INTENTS
// ==============================================================================

/// What a caller wants to see, instead of and/or string flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityIntent {
    /// Only appointments the principal created.
    StrictMine,
    /// Owned, assigned or team appointments.
    #[default]
    BroadVisible,
    /// Broad visibility plus anything public in the squad.
    SharedView,
}

impl VisibilityIntent {
    pub fn predicate(&self) -> AccessPredicate {
        match self {
            VisibilityIntent::StrictMine => AccessPredicate::OwnedByUser,
            VisibilityIntent::BroadVisible => AccessPredicate::Or(vec![
                AccessPredicate::OwnedByUser,
                AccessPredicate::AssignedToUser,
                AccessPredicate::OnPrincipalsTeam,
            ]),
            VisibilityIntent::SharedView => VisibilityIntent::BroadVisible
                .predicate()
                .or(AccessPredicate::IsPublic),
        }
    }
}
