//! Pure sign/magnitude/balance rules for proposed movements.
//!
//! No side effects, no IO: callers (the ledger, form validation, tests) get a
//! structured verdict and decide themselves whether to escalate to the
//! approval gate or reject outright.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::movement::MovementType;

/// Why a proposed movement is invalid.
///
/// The `WrongSign` wording is load-bearing: existing POS clients match on
/// these strings when rendering adjustment-form errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MovementViolation {
    #[error("{} movement must have {} quantity change", movement_type.label(), expected_sign(*movement_type))]
    WrongSign { movement_type: MovementType },

    #[error(
        "insufficient stock: balance would go negative by {deficit} (current stock {current_stock}, change {quantity_change})"
    )]
    InsufficientStock {
        current_stock: Decimal,
        quantity_change: Decimal,
        /// How far below zero the balance would land (positive number).
        deficit: Decimal,
    },
}

fn expected_sign(movement_type: MovementType) -> &'static str {
    match movement_type {
        MovementType::StockIn | MovementType::VoidReturn => "positive",
        MovementType::StockOut | MovementType::Sale => "negative",
        // Physical counts have no sign constraint; they never produce WrongSign.
        MovementType::PhysicalCount => "any",
    }
}

/// Validate a proposed movement against the current balance.
///
/// Rules per movement type:
///
/// | type             | sign constraint      | negative balance        |
/// |------------------|----------------------|-------------------------|
/// | `stock_in`       | change > 0           | n/a (balance increases) |
/// | `stock_out`      | change < 0           | rejected unless `allow_negative` |
/// | `sale`           | change < 0           | rejected unless `allow_negative` |
/// | `void_return`    | change > 0           | n/a                     |
/// | `physical_count` | any sign             | always rejected (a count reconciles to a real shelf quantity, which cannot be negative) |
pub fn validate_movement(
    current_stock: Decimal,
    quantity_change: Decimal,
    movement_type: MovementType,
    allow_negative: bool,
) -> Result<(), MovementViolation> {
    let sign_ok = match movement_type {
        MovementType::StockIn | MovementType::VoidReturn => quantity_change > Decimal::ZERO,
        MovementType::StockOut | MovementType::Sale => quantity_change < Decimal::ZERO,
        MovementType::PhysicalCount => true,
    };
    if !sign_ok {
        return Err(MovementViolation::WrongSign { movement_type });
    }

    let resulting = current_stock + quantity_change;
    if resulting < Decimal::ZERO {
        let rejected = match movement_type {
            MovementType::StockOut | MovementType::Sale => !allow_negative,
            MovementType::PhysicalCount => true,
            // Inbound movements on an already-negative balance only improve
            // it; let them through.
            MovementType::StockIn | MovementType::VoidReturn => false,
        };
        if rejected {
            return Err(MovementViolation::InsufficientStock {
                current_stock,
                quantity_change,
                deficit: -resulting,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stock_in_requires_positive_change() {
        let err = validate_movement(dec!(10), dec!(-5), MovementType::StockIn, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Stock In movement must have positive quantity change"
        );

        assert!(validate_movement(dec!(10), dec!(5), MovementType::StockIn, false).is_ok());
    }

    #[test]
    fn stock_out_requires_negative_change() {
        let err = validate_movement(dec!(10), dec!(5), MovementType::StockOut, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Stock Out movement must have negative quantity change"
        );

        assert!(validate_movement(dec!(10), dec!(-5), MovementType::StockOut, false).is_ok());
    }

    #[test]
    fn sale_requires_negative_change() {
        let err = validate_movement(dec!(10), dec!(1), MovementType::Sale, false).unwrap_err();
        assert!(matches!(
            err,
            MovementViolation::WrongSign {
                movement_type: MovementType::Sale
            }
        ));
    }

    #[test]
    fn void_return_requires_positive_change() {
        let err =
            validate_movement(dec!(10), dec!(-1), MovementType::VoidReturn, false).unwrap_err();
        assert!(matches!(
            err,
            MovementViolation::WrongSign {
                movement_type: MovementType::VoidReturn
            }
        ));
        assert!(validate_movement(dec!(10), dec!(1), MovementType::VoidReturn, false).is_ok());
    }

    #[test]
    fn physical_count_accepts_either_sign() {
        assert!(validate_movement(dec!(10), dec!(3), MovementType::PhysicalCount, false).is_ok());
        assert!(validate_movement(dec!(10), dec!(-3), MovementType::PhysicalCount, false).is_ok());
        assert!(validate_movement(dec!(10), dec!(0), MovementType::PhysicalCount, false).is_ok());
    }

    #[test]
    fn sale_cannot_drive_balance_negative_without_override() {
        let err = validate_movement(dec!(3), dec!(-5), MovementType::Sale, false).unwrap_err();
        match err {
            MovementViolation::InsufficientStock {
                current_stock,
                quantity_change,
                deficit,
            } => {
                assert_eq!(current_stock, dec!(3));
                assert_eq!(quantity_change, dec!(-5));
                assert_eq!(deficit, dec!(2));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn override_flag_permits_negative_balance_for_guarded_types() {
        assert!(validate_movement(dec!(3), dec!(-5), MovementType::Sale, true).is_ok());
        assert!(validate_movement(dec!(3), dec!(-5), MovementType::StockOut, true).is_ok());
    }

    #[test]
    fn physical_count_never_reconciles_below_zero() {
        let err =
            validate_movement(dec!(4), dec!(-6), MovementType::PhysicalCount, false).unwrap_err();
        assert!(matches!(err, MovementViolation::InsufficientStock { .. }));

        // The override flag is for stock_out/sale only.
        let err =
            validate_movement(dec!(4), dec!(-6), MovementType::PhysicalCount, true).unwrap_err();
        assert!(matches!(err, MovementViolation::InsufficientStock { .. }));
    }

    #[test]
    fn exact_zero_balance_is_allowed() {
        assert!(validate_movement(dec!(5), dec!(-5), MovementType::Sale, false).is_ok());
        assert!(
            validate_movement(dec!(5), dec!(-5), MovementType::PhysicalCount, false).is_ok()
        );
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_guarded_type() -> impl Strategy<Value = MovementType> {
            prop_oneof![Just(MovementType::StockOut), Just(MovementType::Sale)]
        }

        proptest! {
            /// Property: a valid guarded movement never lands below zero
            /// without the override flag.
            #[test]
            fn guarded_movements_preserve_non_negative_balance(
                current in 0i64..10_000,
                change in -10_000i64..0,
                movement_type in any_guarded_type(),
            ) {
                let current = Decimal::from(current);
                let change = Decimal::from(change);

                match validate_movement(current, change, movement_type, false) {
                    Ok(()) => prop_assert!(current + change >= Decimal::ZERO),
                    Err(MovementViolation::InsufficientStock { deficit, .. }) => {
                        prop_assert_eq!(deficit, -(current + change));
                        prop_assert!(deficit > Decimal::ZERO);
                    }
                    Err(MovementViolation::WrongSign { .. }) => {
                        // change == 0 fails the strict negative-sign rule.
                        prop_assert_eq!(change, Decimal::ZERO);
                    }
                }
            }

            /// Property: validation is deterministic.
            #[test]
            fn validation_is_deterministic(
                current in -1_000i64..1_000,
                change in -1_000i64..1_000,
                allow_negative in proptest::bool::ANY,
            ) {
                let current = Decimal::from(current);
                let change = Decimal::from(change);
                for movement_type in [
                    MovementType::StockIn,
                    MovementType::StockOut,
                    MovementType::PhysicalCount,
                    MovementType::Sale,
                    MovementType::VoidReturn,
                ] {
                    let a = validate_movement(current, change, movement_type, allow_negative);
                    let b = validate_movement(current, change, movement_type, allow_negative);
                    prop_assert_eq!(a, b);
                }
            }
        }
    }
}
