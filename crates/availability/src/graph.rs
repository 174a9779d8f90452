//! Bipartite package/product component graph.

use std::collections::HashMap;

use tapline_catalog::{PackageComponent, PackageId, ProductId};

/// The recipe graph: which products each package consumes, and (inverted)
/// which packages each product appears in.
///
/// Built once from the component list; both directions are indexed up front
/// so availability and impact lookups are O(degree), not O(edges).
#[derive(Debug, Clone, Default)]
pub struct PackageComponentGraph {
    components: HashMap<PackageId, Vec<PackageComponent>>,
    usages: HashMap<ProductId, Vec<PackageId>>,
}

impl PackageComponentGraph {
    pub fn new(components: impl IntoIterator<Item = PackageComponent>) -> Self {
        let mut graph = Self::default();
        for component in components {
            graph.insert(component);
        }
        graph
    }

    /// Add one edge. Per-package component order follows insertion order,
    /// which downstream ties (bottleneck selection) depend on.
    pub fn insert(&mut self, component: PackageComponent) {
        let usages = self.usages.entry(component.product_id).or_default();
        if !usages.contains(&component.package_id) {
            usages.push(component.package_id);
        }
        self.components
            .entry(component.package_id)
            .or_default()
            .push(component);
    }

    /// Components of a package, in insertion order. Empty for unknown
    /// packages and for packages with no recipe.
    pub fn components_of(&self, package_id: PackageId) -> &[PackageComponent] {
        self.components
            .get(&package_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every package whose recipe includes this product.
    pub fn packages_using(&self, product_id: ProductId) -> &[PackageId] {
        self.usages
            .get(&product_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn package_count(&self) -> usize {
        self.components.len()
    }

    pub fn edge_count(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }
}
