//! API-side authorization guard.
//!
//! Enforces permission checks at the request boundary, before any domain
//! code runs. Roles map to permissions here; the domain crates never see
//! role strings.

use tapline_auth::{
    AuthzError, CommandAuthorization, Permission, Principal, Role, authorize,
};

use crate::context::{PrincipalContext, VenueContext};

/// An API action with its permission requirements.
pub struct GuardedAction {
    required: Vec<Permission>,
}

impl GuardedAction {
    pub fn new(required: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            required: required.into_iter().map(Permission::new).collect(),
        }
    }
}

impl CommandAuthorization for GuardedAction {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

/// Check authorization for an action in the current request context.
pub fn authorize_action<C: CommandAuthorization>(
    venue: &VenueContext,
    principal: &PrincipalContext,
    action: &C,
) -> Result<(), AuthzError> {
    let principal = Principal {
        principal_id: principal.principal_id(),
        active_venue_id: venue.venue_id(),
        granted_venue_id: venue.venue_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };

    for perm in action.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

/// Static role → permission mapping.
///
/// Every authenticated venue member may read the catalog, read and apply
/// movements, and query availability; risky movements are caught by the
/// approval gate rather than by withholding the apply permission. Creating
/// catalog entries is a manager action.
fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(|r| r.as_str() == "admin") {
        return vec![Permission::new("*")];
    }

    let mut perms = vec![
        Permission::new("catalog.products.read"),
        Permission::new("catalog.packages.read"),
        Permission::new("inventory.movements.apply"),
        Permission::new("inventory.movements.read"),
        Permission::new("availability.read"),
    ];

    if roles.iter().any(|r| r.as_str() == "manager") {
        perms.push(Permission::new("catalog.products.create"));
        perms.push(Permission::new("catalog.packages.create"));
    }

    perms
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapline_auth::PrincipalId;
    use tapline_core::VenueId;

    fn contexts(roles: Vec<Role>) -> (VenueContext, PrincipalContext) {
        (
            VenueContext::new(VenueId::new()),
            PrincipalContext::new(PrincipalId::new(), roles),
        )
    }

    #[test]
    fn staff_can_apply_movements_but_not_create_products() {
        let (venue, principal) = contexts(vec![Role::new("bartender")]);

        let apply = GuardedAction::new(["inventory.movements.apply"]);
        assert!(authorize_action(&venue, &principal, &apply).is_ok());

        let create = GuardedAction::new(["catalog.products.create"]);
        assert!(authorize_action(&venue, &principal, &create).is_err());
    }

    #[test]
    fn manager_can_create_catalog_entries() {
        let (venue, principal) = contexts(vec![Role::new("manager")]);
        let create = GuardedAction::new(["catalog.packages.create"]);
        assert!(authorize_action(&venue, &principal, &create).is_ok());
    }

    #[test]
    fn admin_wildcard_covers_everything() {
        let (venue, principal) = contexts(vec![Role::new("admin")]);
        let action = GuardedAction::new(["catalog.products.create", "availability.read"]);
        assert!(authorize_action(&venue, &principal, &action).is_ok());
    }
}
