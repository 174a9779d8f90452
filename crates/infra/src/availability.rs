//! Availability read path over the store.
//!
//! Reads are advisory and eventually consistent with the ledger: a balance
//! snapshot is taken per request (one batched read, deduplicated across
//! packages) and results may be served from a short-TTL cache. A committed
//! movement invalidates the cached entries of every package the product
//! appears in.

use std::collections::HashSet;

use tapline_availability::{
    AvailabilityResult, PackageComponentGraph, ProductImpact, calculator, impact,
};
use tapline_catalog::{PackageId, ProductId};
use tapline_core::VenueId;

use crate::cache::AvailabilityCache;
use crate::ledger::LedgerError;
use crate::store::InventoryStore;

/// Venue-scoped availability and impact queries.
#[derive(Debug)]
pub struct AvailabilityService<S> {
    store: S,
    cache: AvailabilityCache,
}

impl<S: InventoryStore> AvailabilityService<S> {
    pub fn new(store: S, cache: AvailabilityCache) -> Self {
        Self { store, cache }
    }

    fn graph(&self, venue_id: VenueId) -> Result<PackageComponentGraph, LedgerError> {
        Ok(PackageComponentGraph::new(
            self.store.list_components(venue_id)?,
        ))
    }

    /// Availability for one package.
    pub fn package_availability(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<AvailabilityResult, LedgerError> {
        if let Some(cached) = self.cache.get(venue_id, package_id) {
            return Ok(cached);
        }

        if self.store.get_package(venue_id, package_id)?.is_none() {
            return Err(LedgerError::NotFound);
        }

        let graph = self.graph(venue_id)?;
        let product_ids: Vec<ProductId> = graph
            .components_of(package_id)
            .iter()
            .map(|c| c.product_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let balances = self.store.balances(venue_id, &product_ids)?;

        let result = calculator::calculate(&graph, package_id, &balances);
        self.cache.put(venue_id, result.clone());
        Ok(result)
    }

    /// Availability for several packages against one balance snapshot.
    /// Fails with `NotFound` if any requested package is unknown.
    pub fn packages_availability(
        &self,
        venue_id: VenueId,
        package_ids: &[PackageId],
    ) -> Result<Vec<AvailabilityResult>, LedgerError> {
        for &package_id in package_ids {
            if self.store.get_package(venue_id, package_id)?.is_none() {
                return Err(LedgerError::NotFound);
            }
        }

        let graph = self.graph(venue_id)?;

        // One deduplicated balance read across every requested package.
        let product_ids: Vec<ProductId> = package_ids
            .iter()
            .flat_map(|&id| graph.components_of(id))
            .map(|c| c.product_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let balances = self.store.balances(venue_id, &product_ids)?;

        let results = calculator::calculate_many(&graph, package_ids, &balances);
        for result in &results {
            self.cache.put(venue_id, result.clone());
        }
        Ok(results)
    }

    /// Which packages a product's stock constrains, and how hard.
    pub fn product_impact(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<ProductImpact, LedgerError> {
        if self.store.get_product(venue_id, product_id)?.is_none() {
            return Err(LedgerError::NotFound);
        }

        let graph = self.graph(venue_id)?;

        // Impact needs full availability of every affected package, so pull
        // all of their components' balances in one read.
        let mut ids: HashSet<ProductId> = HashSet::from([product_id]);
        for &package_id in graph.packages_using(product_id) {
            ids.extend(graph.components_of(package_id).iter().map(|c| c.product_id));
        }
        let product_ids: Vec<ProductId> = ids.into_iter().collect();
        let balances = self.store.balances(venue_id, &product_ids)?;

        Ok(impact::product_impact(&graph, product_id, &balances))
    }

    /// Drop cached availability for every package using this product.
    /// Called after each committed movement.
    pub fn invalidate_for_product(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<(), LedgerError> {
        let graph = self.graph(venue_id)?;
        self.cache
            .invalidate(venue_id, graph.packages_using(product_id));
        Ok(())
    }
}
