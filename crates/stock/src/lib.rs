//! Stock ledger domain module.
//!
//! This crate contains the business rules for stock movements, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage):
//!
//! - [`MovementType`]: the closed set of reasons a balance may change.
//! - [`validate_movement`]: sign/magnitude/balance rules per movement type,
//!   checked before any write is attempted.
//! - [`ApprovalPolicy`]: the gate deciding when a movement needs a manager.
//!
//! The transactional `apply` pipeline that persists movements lives in
//! `tapline-infra`; it calls into this crate for every decision.

pub mod approval;
pub mod movement;
pub mod validator;

pub use approval::{ApprovalDecision, ApprovalGrant, ApprovalPolicy};
pub use movement::{MovementDraft, MovementId, MovementType, StockMovement};
pub use validator::{MovementViolation, validate_movement};
