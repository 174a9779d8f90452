//! Maximum-sellable computation for packages.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use tapline_catalog::{PackageId, ProductId};

use crate::graph::PackageComponentGraph;

/// Per-component contribution to a package's availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAvailability {
    pub product_id: ProductId,
    pub required_quantity: Decimal,
    pub stock: Decimal,
    /// How many packages this component alone could supply.
    pub max_packages: u64,
}

/// How many units of a package can be sold right now, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub package_id: PackageId,
    /// `None` means unconstrained: the package has no stock-tracked
    /// components, so stock never limits it.
    pub max_sellable: Option<u64>,
    /// The component that limits `max_sellable`. On ties, the earliest
    /// component in recipe order wins, so the answer is stable run to run.
    pub bottleneck_product: Option<ProductId>,
    pub breakdown: Vec<ComponentAvailability>,
}

impl AvailabilityResult {
    pub fn is_sellable(&self) -> bool {
        self.max_sellable.is_none_or(|n| n > 0)
    }
}

/// Packages a single component can supply: floor(stock / required), clamped
/// to zero when the balance is negative or the recipe row is degenerate.
fn component_capacity(stock: Decimal, required_quantity: Decimal) -> u64 {
    if stock <= Decimal::ZERO || required_quantity <= Decimal::ZERO {
        return 0;
    }
    (stock / required_quantity)
        .floor()
        .to_u64()
        .unwrap_or(u64::MAX)
}

/// Compute availability for one package against a balance snapshot.
///
/// Products missing from `balances` are treated as zero stock: an unknown
/// balance must never inflate what the floor says it can sell.
pub fn calculate(
    graph: &PackageComponentGraph,
    package_id: PackageId,
    balances: &HashMap<ProductId, Decimal>,
) -> AvailabilityResult {
    let mut breakdown = Vec::new();
    let mut limit: Option<(u64, ProductId)> = None;

    for component in graph.components_of(package_id) {
        let stock = balances
            .get(&component.product_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let max_packages = component_capacity(stock, component.required_quantity);

        // Strictly-less keeps the first component on ties.
        if limit.is_none_or(|(current, _)| max_packages < current) {
            limit = Some((max_packages, component.product_id));
        }

        breakdown.push(ComponentAvailability {
            product_id: component.product_id,
            required_quantity: component.required_quantity,
            stock,
            max_packages,
        });
    }

    let (max_sellable, bottleneck_product) = match limit {
        Some((n, product)) => (Some(n), Some(product)),
        None => (None, None),
    };

    AvailabilityResult {
        package_id,
        max_sellable,
        bottleneck_product,
        breakdown,
    }
}

/// Batch variant over the same snapshot. All results are computed against
/// one consistent set of balances, so two packages sharing a component see
/// the same stock figure.
pub fn calculate_many(
    graph: &PackageComponentGraph,
    package_ids: &[PackageId],
    balances: &HashMap<ProductId, Decimal>,
) -> Vec<AvailabilityResult> {
    package_ids
        .iter()
        .map(|&package_id| calculate(graph, package_id, balances))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tapline_catalog::PackageComponent;
    use tapline_core::EntityId;

    fn graph_of(edges: &[(PackageId, ProductId, Decimal)]) -> PackageComponentGraph {
        PackageComponentGraph::new(
            edges
                .iter()
                .map(|&(pkg, prod, qty)| PackageComponent::new(pkg, prod, qty).unwrap()),
        )
    }

    #[test]
    fn bottleneck_is_the_scarcest_component() {
        let pkg = PackageId(EntityId::new());
        let vodka = ProductId(EntityId::new());
        let redbull = ProductId(EntityId::new());

        let graph = graph_of(&[(pkg, vodka, dec!(1)), (pkg, redbull, dec!(4))]);
        let balances = HashMap::from([(vodka, dec!(10)), (redbull, dec!(12))]);

        let result = calculate(&graph, pkg, &balances);
        // vodka supports 10, redbull supports floor(12/4) = 3
        assert_eq!(result.max_sellable, Some(3));
        assert_eq!(result.bottleneck_product, Some(redbull));
        assert_eq!(result.breakdown[0].max_packages, 10);
        assert_eq!(result.breakdown[1].max_packages, 3);
    }

    #[test]
    fn fractional_capacity_floors() {
        let pkg = PackageId(EntityId::new());
        let gin = ProductId(EntityId::new());

        let graph = graph_of(&[(pkg, gin, dec!(0.75))]);
        let balances = HashMap::from([(gin, dec!(2))]);

        // 2 / 0.75 = 2.66.. floors to 2
        let result = calculate(&graph, pkg, &balances);
        assert_eq!(result.max_sellable, Some(2));
    }

    #[test]
    fn ties_resolve_to_the_first_component_in_recipe_order() {
        let pkg = PackageId(EntityId::new());
        let first = ProductId(EntityId::new());
        let second = ProductId(EntityId::new());

        let graph = graph_of(&[(pkg, first, dec!(2)), (pkg, second, dec!(2))]);
        let balances = HashMap::from([(first, dec!(6)), (second, dec!(6))]);

        let result = calculate(&graph, pkg, &balances);
        assert_eq!(result.max_sellable, Some(3));
        assert_eq!(result.bottleneck_product, Some(first));
    }

    #[test]
    fn packages_without_components_are_unconstrained() {
        let graph = PackageComponentGraph::default();
        let result = calculate(&graph, PackageId(EntityId::new()), &HashMap::new());
        assert_eq!(result.max_sellable, None);
        assert_eq!(result.bottleneck_product, None);
        assert!(result.breakdown.is_empty());
        assert!(result.is_sellable());
    }

    #[test]
    fn missing_and_negative_balances_clamp_to_zero() {
        let pkg = PackageId(EntityId::new());
        let known = ProductId(EntityId::new());
        let unknown = ProductId(EntityId::new());

        let graph = graph_of(&[(pkg, known, dec!(1)), (pkg, unknown, dec!(1))]);
        let balances = HashMap::from([(known, dec!(-3))]);

        let result = calculate(&graph, pkg, &balances);
        assert_eq!(result.max_sellable, Some(0));
        assert!(!result.is_sellable());
        assert_eq!(result.breakdown[0].max_packages, 0);
        assert_eq!(result.breakdown[1].stock, Decimal::ZERO);
    }

    #[test]
    fn batch_results_share_one_snapshot() {
        let shared = ProductId(EntityId::new());
        let pkg_a = PackageId(EntityId::new());
        let pkg_b = PackageId(EntityId::new());

        let graph = graph_of(&[(pkg_a, shared, dec!(1)), (pkg_b, shared, dec!(2))]);
        let balances = HashMap::from([(shared, dec!(8))]);

        let results = calculate_many(&graph, &[pkg_a, pkg_b], &balances);
        assert_eq!(results[0].max_sellable, Some(8));
        assert_eq!(results[1].max_sellable, Some(4));
        assert_eq!(results[0].breakdown[0].stock, results[1].breakdown[0].stock);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: max_sellable never exceeds any single component's
            /// capacity, and equals the minimum across the breakdown.
            #[test]
            fn max_sellable_is_the_component_minimum(
                stocks in proptest::collection::vec(0i64..1_000, 1..6),
                required in proptest::collection::vec(1i64..20, 1..6),
            ) {
                let pkg = PackageId(EntityId::new());
                let n = stocks.len().min(required.len());

                let mut edges = Vec::new();
                let mut balances = HashMap::new();
                for i in 0..n {
                    let product = ProductId(EntityId::new());
                    edges.push((pkg, product, Decimal::from(required[i])));
                    balances.insert(product, Decimal::from(stocks[i]));
                }

                let graph = graph_of(&edges);
                let result = calculate(&graph, pkg, &balances);

                let expected = result
                    .breakdown
                    .iter()
                    .map(|c| c.max_packages)
                    .min();
                prop_assert_eq!(result.max_sellable, expected);
            }

            /// Property: selling max_sellable units never over-draws any
            /// component's stock.
            #[test]
            fn selling_the_maximum_never_overdraws(
                stock in 0i64..10_000,
                required in 1i64..50,
            ) {
                let pkg = PackageId(EntityId::new());
                let product = ProductId(EntityId::new());
                let graph = graph_of(&[(pkg, product, Decimal::from(required))]);
                let balances = HashMap::from([(product, Decimal::from(stock))]);

                let result = calculate(&graph, pkg, &balances);
                let max = result.max_sellable.unwrap();
                let consumed = Decimal::from(max) * Decimal::from(required);
                prop_assert!(consumed <= Decimal::from(stock));
                // One more unit would over-draw.
                let over = Decimal::from(max + 1) * Decimal::from(required);
                prop_assert!(over > Decimal::from(stock));
            }
        }
    }
}
