//! Reverse lookup: what a product's stock level does to package availability.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tapline_catalog::{PackageId, ProductId};

use crate::calculator;
use crate::graph::PackageComponentGraph;

/// One package constrained by the product under inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageImpact {
    pub package_id: PackageId,
    /// How much of the product one unit of the package consumes.
    pub quantity_per_package: Decimal,
    /// The package's full availability (all components considered, not just
    /// this product).
    pub max_sellable: Option<u64>,
}

/// The blast radius of a product's stock level.
///
/// Answers the bartender's question before a big stock-out: "if this keg
/// runs dry, which menu items die with it?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImpact {
    pub product_id: ProductId,
    pub current_stock: Decimal,
    pub affected_packages: Vec<PackageImpact>,
    pub total_packages_impacted: usize,
    /// The worst availability among affected packages; `None` when the
    /// product appears in no package.
    pub minimum_package_availability: Option<u64>,
}

/// Compute the impact of one product across every package that uses it.
pub fn product_impact(
    graph: &PackageComponentGraph,
    product_id: ProductId,
    balances: &HashMap<ProductId, Decimal>,
) -> ProductImpact {
    let current_stock = balances.get(&product_id).copied().unwrap_or(Decimal::ZERO);

    let mut affected_packages = Vec::new();
    let mut minimum: Option<u64> = None;

    for &package_id in graph.packages_using(product_id) {
        let availability = calculator::calculate(graph, package_id, balances);

        // Sum the recipe rows for this product; a recipe may list it more
        // than once.
        let quantity_per_package = graph
            .components_of(package_id)
            .iter()
            .filter(|c| c.product_id == product_id)
            .map(|c| c.required_quantity)
            .sum();

        if let Some(max) = availability.max_sellable {
            minimum = Some(minimum.map_or(max, |m| m.min(max)));
        }

        affected_packages.push(PackageImpact {
            package_id,
            quantity_per_package,
            max_sellable: availability.max_sellable,
        });
    }

    ProductImpact {
        product_id,
        current_stock,
        total_packages_impacted: affected_packages.len(),
        affected_packages,
        minimum_package_availability: minimum,
    }
}
