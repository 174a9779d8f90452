//! Request DTOs and JSON response mapping.
//!
//! Responses are built with `serde_json::json!` rather than mirrored structs
//! so domain types never need HTTP-shaped serde attributes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use tapline_availability::{AvailabilityResult, ProductImpact};
use tapline_catalog::{Package, PackageComponent, Product};
use tapline_core::Entity;
use tapline_stock::StockMovement;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub initial_stock: Decimal,
    #[serde(default)]
    pub reorder_point: Decimal,
    #[serde(default)]
    pub reorder_quantity: Decimal,
    pub unit_of_measure: String,
}

#[derive(Debug, Deserialize)]
pub struct ComponentRequest {
    pub product_id: String,
    pub required_quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreatePackageRequest {
    pub name: String,
    pub package_type: String,
    pub base_price: Decimal,
    pub cost_price: Option<Decimal>,
    pub components: Vec<ComponentRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyMovementRequest {
    pub product_id: String,
    pub movement_type: String,
    pub quantity_change: Decimal,
    pub reason: String,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    #[serde(default)]
    pub allow_negative: bool,
    #[serde(default)]
    pub manager_approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct MovementHistoryQuery {
    pub movement_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize)]
pub struct BatchAvailabilityQuery {
    /// Comma-separated package ids.
    pub ids: String,
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    json!({
        "id": product.id_typed().to_string(),
        "venue_id": product.venue_id().to_string(),
        "name": product.name(),
        "current_stock": product.current_stock(),
        "reorder_point": product.reorder_point(),
        "reorder_quantity": product.reorder_quantity(),
        "unit_of_measure": product.unit_of_measure(),
        "below_reorder_point": product.is_below_reorder_point(),
        "version": product.version(),
        "created_at": product.created_at(),
    })
}

pub fn package_to_json(package: &Package, components: &[PackageComponent]) -> serde_json::Value {
    json!({
        "id": package.id_typed().to_string(),
        "venue_id": package.venue_id().to_string(),
        "name": package.name(),
        "package_type": package.package_type().as_str(),
        "base_price": package.base_price(),
        "cost_price": package.cost_price(),
        "created_at": package.created_at(),
        "components": components.iter().map(|c| json!({
            "product_id": c.product_id.to_string(),
            "required_quantity": c.required_quantity,
        })).collect::<Vec<_>>(),
    })
}

pub fn movement_to_json(movement: &StockMovement) -> serde_json::Value {
    json!({
        "id": movement.id.to_string(),
        "venue_id": movement.venue_id.to_string(),
        "product_id": movement.product_id.to_string(),
        "movement_type": movement.movement_type.as_str(),
        "quantity_change": movement.quantity_change,
        "resulting_balance": movement.resulting_balance,
        "reason": movement.reason,
        "performed_by": movement.performed_by,
        "unit_cost": movement.unit_cost,
        "notes": movement.notes,
        "created_at": movement.created_at,
    })
}

pub fn availability_to_json(result: &AvailabilityResult) -> serde_json::Value {
    json!({
        "package_id": result.package_id.to_string(),
        "max_sellable": result.max_sellable,
        "is_sellable": result.is_sellable(),
        "bottleneck_product": result.bottleneck_product.map(|p| p.to_string()),
        "breakdown": result.breakdown.iter().map(|c| json!({
            "product_id": c.product_id.to_string(),
            "required_quantity": c.required_quantity,
            "stock": c.stock,
            "max_packages": c.max_packages,
        })).collect::<Vec<_>>(),
    })
}

pub fn impact_to_json(impact: &ProductImpact) -> serde_json::Value {
    json!({
        "product_id": impact.product_id.to_string(),
        "current_stock": impact.current_stock,
        "total_packages_impacted": impact.total_packages_impacted,
        "minimum_package_availability": impact.minimum_package_availability,
        "affected_packages": impact.affected_packages.iter().map(|p| json!({
            "package_id": p.package_id.to_string(),
            "quantity_per_package": p.quantity_per_package,
            "max_sellable": p.max_sellable,
        })).collect::<Vec<_>>(),
    })
}
