use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;

use tapline_catalog::{Package, PackageComponent, PackageId, Product, ProductId};
use tapline_core::{Entity, ExpectedVersion, VenueId};
use tapline_stock::StockMovement;

use super::{InventoryStore, MovementFilter, StoreError};

#[derive(Debug, Default)]
struct VenueData {
    products: HashMap<ProductId, Product>,
    packages: HashMap<PackageId, Package>,
    components: Vec<PackageComponent>,
    movements: Vec<StockMovement>,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    venues: RwLock<HashMap<VenueId, VenueData>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl InventoryStore for InMemoryInventoryStore {
    fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut venues = self.venues.write().map_err(|_| poisoned())?;
        let venue = venues.entry(product.venue_id()).or_default();

        let id = product.id_typed();
        if venue.products.contains_key(&id) {
            return Err(StoreError::DuplicateId(format!("product {id}")));
        }
        venue.products.insert(id, product);
        Ok(())
    }

    fn get_product(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let venues = self.venues.read().map_err(|_| poisoned())?;
        Ok(venues
            .get(&venue_id)
            .and_then(|v| v.products.get(&product_id))
            .cloned())
    }

    fn insert_package(
        &self,
        package: Package,
        components: Vec<PackageComponent>,
    ) -> Result<(), StoreError> {
        let mut venues = self.venues.write().map_err(|_| poisoned())?;
        let venue = venues.entry(package.venue_id()).or_default();

        let id = package.id_typed();
        if venue.packages.contains_key(&id) {
            return Err(StoreError::DuplicateId(format!("package {id}")));
        }
        for (idx, component) in components.iter().enumerate() {
            if component.package_id != id {
                return Err(StoreError::InvalidWrite(format!(
                    "component batch references a different package (index {idx})"
                )));
            }
            if !venue.products.contains_key(&component.product_id) {
                return Err(StoreError::InvalidWrite(format!(
                    "component references unknown product {} (index {idx})",
                    component.product_id
                )));
            }
        }

        venue.packages.insert(id, package);
        venue.components.extend(components);
        Ok(())
    }

    fn get_package(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<Option<Package>, StoreError> {
        let venues = self.venues.read().map_err(|_| poisoned())?;
        Ok(venues
            .get(&venue_id)
            .and_then(|v| v.packages.get(&package_id))
            .cloned())
    }

    fn list_components(&self, venue_id: VenueId) -> Result<Vec<PackageComponent>, StoreError> {
        let venues = self.venues.read().map_err(|_| poisoned())?;
        Ok(venues
            .get(&venue_id)
            .map(|v| v.components.clone())
            .unwrap_or_default())
    }

    fn commit_movement(
        &self,
        product: &Product,
        movement: &StockMovement,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        if movement.venue_id != product.venue_id() {
            return Err(StoreError::VenueIsolation(format!(
                "movement venue {} does not match product venue {}",
                movement.venue_id,
                product.venue_id()
            )));
        }
        if movement.product_id != product.id_typed() {
            return Err(StoreError::InvalidWrite(format!(
                "movement product {} does not match product record {}",
                movement.product_id,
                product.id_typed()
            )));
        }

        let mut venues = self.venues.write().map_err(|_| poisoned())?;
        let venue = venues
            .get_mut(&product.venue_id())
            .ok_or_else(|| StoreError::InvalidWrite("unknown venue".to_string()))?;

        let stored = venue
            .products
            .get_mut(&product.id_typed())
            .ok_or_else(|| StoreError::InvalidWrite("unknown product".to_string()))?;

        if !expected_version.matches(stored.version()) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected_version:?}, found {}",
                stored.version()
            )));
        }

        *stored = product.clone();
        venue.movements.push(movement.clone());
        Ok(())
    }

    fn list_movements(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, StoreError> {
        let venues = self.venues.read().map_err(|_| poisoned())?;
        let Some(venue) = venues.get(&venue_id) else {
            return Ok(vec![]);
        };

        // Append order is chronological; walk backwards for newest-first.
        Ok(venue
            .movements
            .iter()
            .rev()
            .filter(|m| m.product_id == product_id && filter.matches(m))
            .skip(filter.offset)
            .take(filter.effective_limit())
            .cloned()
            .collect())
    }

    fn balances(
        &self,
        venue_id: VenueId,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, StoreError> {
        let venues = self.venues.read().map_err(|_| poisoned())?;
        let Some(venue) = venues.get(&venue_id) else {
            return Ok(HashMap::new());
        };

        Ok(product_ids
            .iter()
            .filter_map(|id| venue.products.get(id).map(|p| (*id, p.current_stock())))
            .collect())
    }
}
