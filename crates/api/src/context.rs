use tapline_auth::{AuthorizationTier, PrincipalId, Role};
use tapline_core::VenueId;

/// Venue context for a request.
///
/// This is immutable and must be present for all domain routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VenueContext {
    venue_id: VenueId,
}

impl VenueContext {
    pub fn new(venue_id: VenueId) -> Self {
        Self { venue_id }
    }

    pub fn venue_id(&self) -> VenueId {
        self.venue_id
    }
}

/// Principal context for a request (authenticated identity + authority).
///
/// The authorization tier is resolved once here, at the boundary; downstream
/// code (the approval gate in particular) takes it as a typed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
    tier: AuthorizationTier,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        let tier = AuthorizationTier::from_roles(&roles);
        Self {
            principal_id,
            roles,
            tier,
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn tier(&self) -> AuthorizationTier {
        self.tier
    }
}
