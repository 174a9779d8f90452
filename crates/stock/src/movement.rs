use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tapline_catalog::ProductId;
use tapline_core::{Actor, EntityId, VenueId};

/// Movement identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub EntityId);

impl MovementId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MovementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Why a product's balance changed.
///
/// Closed enumeration: every consumer matches exhaustively, so adding a
/// movement type is a compile-time-checked change across the workspace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Goods received (delivery, transfer in). Positive.
    StockIn,
    /// Manual removal (breakage, spillage, transfer out). Negative.
    StockOut,
    /// Reconciliation delta from a physical count. Either sign.
    PhysicalCount,
    /// Automatic deduction from a completed sale. Negative.
    Sale,
    /// Reversal of a prior sale (void/return). Positive.
    VoidReturn,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::StockIn => "stock_in",
            MovementType::StockOut => "stock_out",
            MovementType::PhysicalCount => "physical_count",
            MovementType::Sale => "sale",
            MovementType::VoidReturn => "void_return",
        }
    }

    /// Human-facing label, used verbatim in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            MovementType::StockIn => "Stock In",
            MovementType::StockOut => "Stock Out",
            MovementType::PhysicalCount => "Physical Count",
            MovementType::Sale => "Sale",
            MovementType::VoidReturn => "Void Return",
        }
    }

    /// Types guarded against driving the balance negative (overridable only
    /// with an explicit flag).
    pub fn guards_negative_balance(&self) -> bool {
        matches!(self, MovementType::StockOut | MovementType::Sale)
    }
}

impl core::str::FromStr for MovementType {
    type Err = tapline_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock_in" => Ok(MovementType::StockIn),
            "stock_out" => Ok(MovementType::StockOut),
            "physical_count" => Ok(MovementType::PhysicalCount),
            "sale" => Ok(MovementType::Sale),
            "void_return" => Ok(MovementType::VoidReturn),
            other => Err(tapline_core::DomainError::validation(format!(
                "unknown movement type: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable ledger entry: one recorded change to one product's balance.
///
/// Append-only; never updated or deleted once written. `resulting_balance`
/// snapshots the product's stock immediately after the change, which makes
/// the ledger auditable and replayable (initial stock + sum of changes must
/// reproduce every snapshot in order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub venue_id: VenueId,
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity_change: Decimal,
    pub resulting_balance: Decimal,
    pub reason: String,
    pub performed_by: Actor,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A proposed movement, before validation and commit.
///
/// `allow_negative` is the explicit override for the negative-balance guard
/// on `stock_out`/`sale`; it still passes through the approval gate, so a
/// silent negative write is impossible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub venue_id: VenueId,
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity_change: Decimal,
    pub reason: String,
    pub performed_by: Actor,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub allow_negative: bool,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_round_trips_through_str() {
        for mt in [
            MovementType::StockIn,
            MovementType::StockOut,
            MovementType::PhysicalCount,
            MovementType::Sale,
            MovementType::VoidReturn,
        ] {
            let parsed: MovementType = mt.as_str().parse().unwrap();
            assert_eq!(parsed, mt);
        }
    }

    #[test]
    fn unknown_movement_type_is_rejected() {
        assert!("stock_levitation".parse::<MovementType>().is_err());
    }

    #[test]
    fn only_outbound_types_guard_negative_balance() {
        assert!(MovementType::StockOut.guards_negative_balance());
        assert!(MovementType::Sale.guards_negative_balance());
        assert!(!MovementType::StockIn.guards_negative_balance());
        assert!(!MovementType::VoidReturn.guards_negative_balance());
        assert!(!MovementType::PhysicalCount.guards_negative_balance());
    }
}
