//! Venue-scoped inventory storage abstraction.
//!
//! One trait covers everything the ledger and the availability services need
//! from storage: catalog records, the current balance (on the product row),
//! and the append-only movement history. No storage assumptions; the
//! in-memory implementation backs tests and dev, the Postgres one (behind
//! the `postgres` feature) backs production.

mod in_memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use in_memory::InMemoryInventoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresInventoryStore;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use tapline_catalog::{Package, PackageComponent, PackageId, Product, ProductId};
use tapline_core::{ExpectedVersion, VenueId};
use tapline_stock::{MovementType, StockMovement};

/// Hard cap on movement-history page size.
pub const MAX_PAGE_SIZE: usize = 500;

/// Storage operation error.
///
/// Infrastructure failures only; deterministic business failures
/// (validation, approval) never reach the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("venue isolation violation: {0}")]
    VenueIsolation(String),

    #[error("duplicate identifier: {0}")]
    DuplicateId(String),

    #[error("invalid write: {0}")]
    InvalidWrite(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Filter and page for movement-history reads. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl MovementFilter {
    /// Page size actually applied: requested limit capped at
    /// [`MAX_PAGE_SIZE`], defaulting to 50.
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(50).min(MAX_PAGE_SIZE)
    }

    fn matches(&self, movement: &StockMovement) -> bool {
        if self.movement_type.is_some_and(|t| t != movement.movement_type) {
            return false;
        }
        if self.from.is_some_and(|from| movement.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| movement.created_at > to) {
            return false;
        }
        true
    }
}

/// Venue-scoped inventory store.
///
/// ## Write semantics
///
/// `commit_movement()` is the only way a balance changes after creation. It
/// must atomically, under optimistic concurrency:
/// - replace the product row with the post-movement record (new balance,
///   bumped version), failing with [`StoreError::Concurrency`] if the stored
///   version no longer matches `expected_version`
/// - append the movement record (append-only; never updated or deleted)
///
/// ## Venue isolation
///
/// Every read takes an explicit [`VenueId`] and must never return another
/// venue's rows. Writes must reject records whose embedded venue ids
/// disagree with each other.
pub trait InventoryStore: Send + Sync {
    fn insert_product(&self, product: Product) -> Result<(), StoreError>;

    fn get_product(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError>;

    /// Insert a package together with its recipe, atomically. Every
    /// component must reference the package and an existing product in the
    /// same venue.
    fn insert_package(
        &self,
        package: Package,
        components: Vec<PackageComponent>,
    ) -> Result<(), StoreError>;

    fn get_package(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<Option<Package>, StoreError>;

    /// All component edges for a venue, in insertion order.
    fn list_components(&self, venue_id: VenueId) -> Result<Vec<PackageComponent>, StoreError>;

    /// Atomically persist one applied movement. See the trait docs for the
    /// required semantics.
    fn commit_movement(
        &self,
        product: &Product,
        movement: &StockMovement,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError>;

    /// Movement history for one product, newest first.
    fn list_movements(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, StoreError>;

    /// Current balances for a set of products in one read. Products that do
    /// not exist in the venue are simply absent from the result.
    fn balances(
        &self,
        venue_id: VenueId,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        (**self).insert_product(product)
    }

    fn get_product(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        (**self).get_product(venue_id, product_id)
    }

    fn insert_package(
        &self,
        package: Package,
        components: Vec<PackageComponent>,
    ) -> Result<(), StoreError> {
        (**self).insert_package(package, components)
    }

    fn get_package(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<Option<Package>, StoreError> {
        (**self).get_package(venue_id, package_id)
    }

    fn list_components(&self, venue_id: VenueId) -> Result<Vec<PackageComponent>, StoreError> {
        (**self).list_components(venue_id)
    }

    fn commit_movement(
        &self,
        product: &Product,
        movement: &StockMovement,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        (**self).commit_movement(product, movement, expected_version)
    }

    fn list_movements(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, StoreError> {
        (**self).list_movements(venue_id, product_id, filter)
    }

    fn balances(
        &self,
        venue_id: VenueId,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, StoreError> {
        (**self).balances(venue_id, product_ids)
    }
}
