use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tapline_core::{DomainError, Entity, EntityId, VenueId};

/// Product identifier (venue-scoped via `venue_id` on the record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A stock-keeping unit: a bottle, a keg, a garnish tray.
///
/// `current_stock` is the single source of truth for quantity on hand and is
/// mutated exclusively through the stock ledger; every change is paired with
/// an immutable movement record. The non-negative invariant is enforced by
/// the movement validator at the application layer, not by this type or the
/// store (a `physical_count` reconciliation may pass through any delta whose
/// resulting balance is still ≥ 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    venue_id: VenueId,
    name: String,
    current_stock: Decimal,
    reorder_point: Decimal,
    reorder_quantity: Decimal,
    unit_of_measure: String,
    version: u64,
    created_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product record.
    ///
    /// `initial_stock` may legitimately be zero (a product listed before its
    /// first delivery) but never negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProductId,
        venue_id: VenueId,
        name: impl Into<String>,
        initial_stock: Decimal,
        reorder_point: Decimal,
        reorder_quantity: Decimal,
        unit_of_measure: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if initial_stock < Decimal::ZERO {
            return Err(DomainError::validation("initial stock cannot be negative"));
        }
        if reorder_point < Decimal::ZERO || reorder_quantity < Decimal::ZERO {
            return Err(DomainError::validation(
                "reorder point and reorder quantity cannot be negative",
            ));
        }
        let unit_of_measure = unit_of_measure.into();
        if unit_of_measure.trim().is_empty() {
            return Err(DomainError::validation("unit of measure cannot be empty"));
        }

        Ok(Self {
            id,
            venue_id,
            name,
            current_stock: initial_stock,
            reorder_point,
            reorder_quantity,
            unit_of_measure,
            version: 1,
            created_at,
        })
    }

    /// Rebuild a record from storage. Skips creation validation; the row
    /// was validated when first written.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: ProductId,
        venue_id: VenueId,
        name: String,
        current_stock: Decimal,
        reorder_point: Decimal,
        reorder_quantity: Decimal,
        unit_of_measure: String,
        version: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            venue_id,
            name,
            current_stock,
            reorder_point,
            reorder_quantity,
            unit_of_measure,
            version,
            created_at,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn venue_id(&self) -> VenueId {
        self.venue_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_stock(&self) -> Decimal {
        self.current_stock
    }

    pub fn reorder_point(&self) -> Decimal {
        self.reorder_point
    }

    pub fn reorder_quantity(&self) -> Decimal {
        self.reorder_quantity
    }

    pub fn unit_of_measure(&self) -> &str {
        &self.unit_of_measure
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether on-hand stock has fallen to (or below) the reorder point.
    pub fn is_below_reorder_point(&self) -> bool {
        self.current_stock <= self.reorder_point
    }

    /// Record a committed balance change.
    ///
    /// Called by the stock ledger only, after validation; bumps the
    /// optimistic-concurrency version.
    pub fn apply_balance(&mut self, new_balance: Decimal) {
        self.current_stock = new_balance;
        self.version += 1;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_product(initial: Decimal) -> Product {
        Product::new(
            ProductId::new(EntityId::new()),
            VenueId::new(),
            "House Gin",
            initial,
            dec!(5),
            dec!(24),
            "bottle",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn new_product_rejects_empty_name() {
        let err = Product::new(
            ProductId::new(EntityId::new()),
            VenueId::new(),
            "   ",
            dec!(10),
            dec!(5),
            dec!(24),
            "bottle",
            Utc::now(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn new_product_rejects_negative_initial_stock() {
        let err = Product::new(
            ProductId::new(EntityId::new()),
            VenueId::new(),
            "House Gin",
            dec!(-1),
            dec!(5),
            dec!(24),
            "bottle",
            Utc::now(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn new_product_rejects_empty_unit_of_measure() {
        let err = Product::new(
            ProductId::new(EntityId::new()),
            VenueId::new(),
            "House Gin",
            dec!(10),
            dec!(5),
            dec!(24),
            " ",
            Utc::now(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn apply_balance_updates_stock_and_version() {
        let mut product = test_product(dec!(10));
        assert_eq!(product.version(), 1);

        product.apply_balance(dec!(7.5));
        assert_eq!(product.current_stock(), dec!(7.5));
        assert_eq!(product.version(), 2);
    }

    #[test]
    fn reorder_point_boundary_is_inclusive() {
        let mut product = test_product(dec!(10));
        assert!(!product.is_below_reorder_point());

        product.apply_balance(dec!(5));
        assert!(product.is_below_reorder_point());

        product.apply_balance(dec!(4));
        assert!(product.is_below_reorder_point());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: version increments by exactly one per applied balance.
            #[test]
            fn version_tracks_applied_balances(balances in proptest::collection::vec(0i64..10_000, 0..20)) {
                let mut product = test_product(dec!(10));
                let start = product.version();

                for (i, b) in balances.iter().enumerate() {
                    product.apply_balance(Decimal::from(*b));
                    prop_assert_eq!(product.version(), start + i as u64 + 1);
                }
            }

            /// Property: the last applied balance always wins.
            #[test]
            fn last_applied_balance_wins(balances in proptest::collection::vec(0i64..10_000, 1..20)) {
                let mut product = test_product(dec!(10));
                for b in &balances {
                    product.apply_balance(Decimal::from(*b));
                }
                prop_assert_eq!(product.current_stock(), Decimal::from(*balances.last().unwrap()));
            }
        }
    }
}
