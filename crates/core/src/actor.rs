//! Actor identity for audited operations.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Who performed a stock-changing operation.
///
/// Automated paths (checkout deductions, scheduled reconciliation) record the
/// distinguished `System` actor rather than a magic "system" string, so the
/// ledger's `performed_by` field is always a closed, typed value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    /// An authenticated user.
    User(UserId),
    /// The system itself (no authenticated user present).
    System,
}

impl Actor {
    /// The user id, if this actor is an authenticated user.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::System => None,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user:{id}"),
            Actor::System => f.write_str("system"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_actor_has_no_user_id() {
        assert_eq!(Actor::System.user_id(), None);
        assert!(Actor::System.is_system());
    }

    #[test]
    fn user_actor_exposes_user_id() {
        let id = UserId::new();
        let actor = Actor::User(id);
        assert_eq!(actor.user_id(), Some(id));
        assert!(!actor.is_system());
    }

    #[test]
    fn serde_shape_is_tagged() {
        let v = serde_json::to_value(Actor::System).unwrap();
        assert_eq!(v["kind"], "system");

        let id = UserId::new();
        let v = serde_json::to_value(Actor::User(id)).unwrap();
        assert_eq!(v["kind"], "user");
        assert_eq!(v["user_id"], serde_json::to_value(id).unwrap());
    }
}
