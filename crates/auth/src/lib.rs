//! `tapline-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Token
//! *issuance* is an external collaborator; this crate only validates claims
//! and answers policy questions (permissions, authorization tier).

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod tier;

pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize};
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use permissions::Permission;
pub use principal::PrincipalId;
pub use roles::Role;
pub use tier::AuthorizationTier;
