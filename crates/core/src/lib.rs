//! `tapline-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the actor identity model, the domain error
//! taxonomy, and the optimistic-concurrency token shared by all stores.

pub mod actor;
pub mod concurrency;
pub mod entity;
pub mod error;
pub mod id;

pub use actor::Actor;
pub use concurrency::ExpectedVersion;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{EntityId, UserId, VenueId};
