use std::collections::HashSet;

use thiserror::Error;

use tapline_core::VenueId;

use crate::{Permission, PrincipalId, Role};

/// A fully resolved principal for authorization decisions.
///
/// Construction of this object is intentionally decoupled from storage and
/// transport: the API layer derives it from validated claims and a policy
/// source, then hands it to pure checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    /// Venue the principal is acting within.
    pub active_venue_id: VenueId,
    /// Venue the granted roles/permissions belong to.
    pub granted_venue_id: VenueId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("venue mismatch")]
    VenueMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Command-side authorization contract (checked at the command boundary).
///
/// Implement this on commands that require permissions. The API layer
/// enforces these requirements before any domain code runs.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

/// Authorize a principal within its active venue context.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_venue_id != principal.granted_venue_id {
        return Err(AuthzError::VenueMismatch);
    }

    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(perms: Vec<Permission>) -> Principal {
        let venue = VenueId::new();
        Principal {
            principal_id: PrincipalId::new(),
            active_venue_id: venue,
            granted_venue_id: venue,
            roles: vec![Role::new("bartender")],
            permissions: perms,
        }
    }

    #[test]
    fn explicit_permission_is_granted() {
        let p = principal(vec![Permission::new("inventory.movements.apply")]);
        assert!(authorize(&p, &Permission::new("inventory.movements.apply")).is_ok());
    }

    #[test]
    fn wildcard_grants_everything() {
        let p = principal(vec![Permission::new("*")]);
        assert!(authorize(&p, &Permission::new("catalog.packages.create")).is_ok());
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let p = principal(vec![]);
        match authorize(&p, &Permission::new("inventory.movements.apply")).unwrap_err() {
            AuthzError::Forbidden(name) => assert_eq!(name, "inventory.movements.apply"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn venue_mismatch_is_rejected_even_with_wildcard() {
        let mut p = principal(vec![Permission::new("*")]);
        p.active_venue_id = VenueId::new();
        assert_eq!(
            authorize(&p, &Permission::new("inventory.movements.apply")),
            Err(AuthzError::VenueMismatch)
        );
    }
}
