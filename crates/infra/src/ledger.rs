//! Stock ledger: the single write path for product balances.
//!
//! Every balance change flows through [`StockLedger::apply`]:
//!
//! 1. Load the product (venue-scoped) and its current version
//! 2. Validate the movement (pure rules in `tapline-stock`)
//! 3. Evaluate the approval gate against the caller's authority
//! 4. Commit atomically: balance + version on the product row, plus the
//!    append-only movement record
//!
//! Commits use optimistic concurrency. On a version conflict the ledger
//! reloads and re-runs the full pipeline (validation may now fail against
//! the fresh balance), bounded by a small retry budget; a still-contended
//! movement surfaces as [`LedgerError::Conflict`] for the caller to retry.

use rust_decimal::Decimal;

use tapline_auth::AuthorizationTier;
use tapline_catalog::{Product, ProductId};
use tapline_core::{DomainError, Entity, EntityId, ExpectedVersion, VenueId};
use tapline_stock::{
    ApprovalDecision, ApprovalPolicy, MovementDraft, MovementId, MovementViolation, StockMovement,
    validate_movement,
};

use crate::store::{InventoryStore, MovementFilter, StoreError};

/// How many times a conflicted commit is re-attempted before giving up.
const MAX_COMMIT_RETRIES: u32 = 3;

/// Ledger operation error.
#[derive(Debug)]
pub enum LedgerError {
    /// Product (or package) does not exist in this venue.
    NotFound,
    /// Request shape failure (deterministic).
    Validation(String),
    /// The movement broke a sign or balance rule.
    InvalidMovement {
        violation: MovementViolation,
        current_stock: Decimal,
        quantity_change: Decimal,
    },
    /// The movement needs manager authorization the caller did not supply.
    ApprovalRequired {
        current_stock: Decimal,
        quantity_change: Decimal,
    },
    /// Cross-venue access attempted.
    VenueIsolation(String),
    /// Optimistic concurrency exhausted its retry budget.
    Conflict(String),
    /// Persisting failed.
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => LedgerError::Conflict(msg),
            StoreError::VenueIsolation(msg) => LedgerError::VenueIsolation(msg),
            _ => LedgerError::Store(value),
        }
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => LedgerError::NotFound,
            DomainError::Conflict(msg) => LedgerError::Conflict(msg),
            other => LedgerError::Validation(other.to_string()),
        }
    }
}

/// Transactional front door for stock movements.
///
/// Generic over the store so tests run against [`InMemoryInventoryStore`]
/// and production against the Postgres store without touching this code.
///
/// [`InMemoryInventoryStore`]: crate::store::InMemoryInventoryStore
#[derive(Debug)]
pub struct StockLedger<S> {
    store: S,
    policy: ApprovalPolicy,
}

impl<S> StockLedger<S> {
    pub fn new(store: S, policy: ApprovalPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: InventoryStore> StockLedger<S> {
    /// Apply one movement end to end. Returns the committed record with its
    /// resulting balance snapshot.
    ///
    /// `tier` and `manager_approved` carry the caller's authority into the
    /// approval gate; they never bypass validation.
    pub fn apply(
        &self,
        venue_id: VenueId,
        tier: AuthorizationTier,
        manager_approved: bool,
        draft: &MovementDraft,
    ) -> Result<StockMovement, LedgerError> {
        if draft.venue_id != venue_id {
            return Err(LedgerError::VenueIsolation(format!(
                "draft venue {} does not match request venue {venue_id}",
                draft.venue_id
            )));
        }
        if draft.reason.trim().is_empty() {
            return Err(LedgerError::Validation(
                "movement reason cannot be empty".to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            let product = self
                .store
                .get_product(venue_id, draft.product_id)?
                .ok_or(LedgerError::NotFound)?;
            let current_stock = product.current_stock();

            validate_movement(
                current_stock,
                draft.quantity_change,
                draft.movement_type,
                draft.allow_negative,
            )
            .map_err(|violation| LedgerError::InvalidMovement {
                violation,
                current_stock,
                quantity_change: draft.quantity_change,
            })?;

            let decision = self.policy.evaluate(
                current_stock,
                draft.quantity_change,
                tier,
                manager_approved,
            );
            if decision == ApprovalDecision::Required {
                return Err(LedgerError::ApprovalRequired {
                    current_stock,
                    quantity_change: draft.quantity_change,
                });
            }

            let expected = ExpectedVersion::Exact(product.version());
            let new_balance = current_stock + draft.quantity_change;

            let mut updated = product;
            updated.apply_balance(new_balance);

            let movement = StockMovement {
                id: MovementId::new(EntityId::new()),
                venue_id,
                product_id: draft.product_id,
                movement_type: draft.movement_type,
                quantity_change: draft.quantity_change,
                resulting_balance: new_balance,
                reason: draft.reason.clone(),
                performed_by: draft.performed_by,
                unit_cost: draft.unit_cost,
                notes: draft.notes.clone(),
                created_at: draft.occurred_at,
            };

            match self.store.commit_movement(&updated, &movement, expected) {
                Ok(()) => {
                    tracing::info!(
                        venue_id = %venue_id,
                        product_id = %draft.product_id,
                        movement_id = %movement.id,
                        movement_type = %draft.movement_type,
                        quantity_change = %draft.quantity_change,
                        resulting_balance = %new_balance,
                        below_reorder_point = updated.is_below_reorder_point(),
                        "stock movement committed"
                    );
                    return Ok(movement);
                }
                Err(StoreError::Concurrency(msg)) => {
                    if attempt >= MAX_COMMIT_RETRIES {
                        return Err(LedgerError::Conflict(msg));
                    }
                    attempt += 1;
                    tracing::debug!(
                        venue_id = %venue_id,
                        product_id = %draft.product_id,
                        attempt,
                        "commit conflicted, reloading"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Current product record (balance, version, reorder levels).
    pub fn product(&self, venue_id: VenueId, product_id: ProductId) -> Result<Product, LedgerError> {
        self.store
            .get_product(venue_id, product_id)?
            .ok_or(LedgerError::NotFound)
    }

    /// Current balance only.
    pub fn balance(&self, venue_id: VenueId, product_id: ProductId) -> Result<Decimal, LedgerError> {
        Ok(self.product(venue_id, product_id)?.current_stock())
    }

    /// Movement history for a product, newest first. Fails with `NotFound`
    /// for unknown products rather than returning an empty page.
    pub fn movements(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, LedgerError> {
        if self.store.get_product(venue_id, product_id)?.is_none() {
            return Err(LedgerError::NotFound);
        }
        Ok(self.store.list_movements(venue_id, product_id, filter)?)
    }
}
