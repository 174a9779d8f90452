//! Infrastructure and orchestration for the stock engine.
//!
//! Composes the pure domain crates (`tapline-stock`, `tapline-availability`,
//! `tapline-catalog`) with storage:
//!
//! - [`store`]: the venue-scoped [`InventoryStore`] trait with in-memory
//!   and (feature `postgres`) Postgres implementations
//! - [`ledger`]: [`StockLedger`], the single transactional write path for
//!   balances
//! - [`availability`]: [`AvailabilityService`], the advisory read path
//! - [`cache`]: short-TTL availability cache
//!
//! [`InventoryStore`]: store::InventoryStore

pub mod availability;
pub mod cache;
pub mod ledger;
pub mod store;

pub use availability::AvailabilityService;
pub use cache::{AvailabilityCache, DEFAULT_AVAILABILITY_TTL};
pub use ledger::{LedgerError, StockLedger};
pub use store::{InMemoryInventoryStore, InventoryStore, MovementFilter, StoreError};

#[cfg(feature = "postgres")]
pub use store::PostgresInventoryStore;
