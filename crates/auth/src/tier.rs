//! Resolved authorization level for approval decisions.

use serde::{Deserialize, Serialize};

use crate::Role;

/// Ordered authorization tier of the acting principal.
///
/// The approval gate takes this as a *typed input* resolved once at the
/// request boundary; downstream code never re-derives authority from raw
/// headers or role strings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationTier {
    /// Bartenders, servers, kitchen staff.
    Staff,
    /// Shift leads: can run service but not sign off on risky adjustments.
    Supervisor,
    /// Floor/bar managers: can approve large or negative-going movements.
    Manager,
    /// Venue administrators.
    Admin,
}

impl AuthorizationTier {
    /// Resolve the effective tier from a role set (highest role wins).
    pub fn from_roles(roles: &[Role]) -> Self {
        roles
            .iter()
            .map(|r| match r.as_str() {
                "admin" => AuthorizationTier::Admin,
                "manager" => AuthorizationTier::Manager,
                "supervisor" | "shift_lead" => AuthorizationTier::Supervisor,
                _ => AuthorizationTier::Staff,
            })
            .max()
            .unwrap_or(AuthorizationTier::Staff)
    }

    /// Whether this tier can satisfy the stock-adjustment approval gate on
    /// its own (manager tier or above).
    pub fn can_approve_stock_adjustments(self) -> bool {
        self >= AuthorizationTier::Manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_role_wins() {
        let roles = vec![Role::new("bartender"), Role::new("manager")];
        assert_eq!(
            AuthorizationTier::from_roles(&roles),
            AuthorizationTier::Manager
        );
    }

    #[test]
    fn unknown_roles_resolve_to_staff() {
        let roles = vec![Role::new("dishwasher")];
        assert_eq!(
            AuthorizationTier::from_roles(&roles),
            AuthorizationTier::Staff
        );
        assert_eq!(AuthorizationTier::from_roles(&[]), AuthorizationTier::Staff);
    }

    #[test]
    fn manager_and_above_can_approve() {
        assert!(!AuthorizationTier::Staff.can_approve_stock_adjustments());
        assert!(!AuthorizationTier::Supervisor.can_approve_stock_adjustments());
        assert!(AuthorizationTier::Manager.can_approve_stock_adjustments());
        assert!(AuthorizationTier::Admin.can_approve_stock_adjustments());
    }
}
