use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use tapline_catalog::{Package, PackageComponent, PackageId, PackageType, Product, ProductId};
use tapline_core::EntityId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::{GuardedAction, authorize_action};
use crate::context::{PrincipalContext, VenueContext};

pub fn router() -> Router {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", get(get_product))
        .route("/packages", post(create_package))
        .route("/packages/:id", get(get_package))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let action = GuardedAction::new(["catalog.products.create"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let product = match Product::new(
        ProductId::new(EntityId::new()),
        venue.venue_id(),
        body.name,
        body.initial_stock,
        body.reorder_point,
        body.reorder_quantity,
        body.unit_of_measure,
        Utc::now(),
    ) {
        Ok(p) => p,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
    };

    if let Err(e) = services.insert_product(product.clone()).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let action = GuardedAction::new(["catalog.products.read"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let product_id = match id.parse::<EntityId>() {
        Ok(v) => ProductId::new(v),
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.get_product(venue.venue_id(), product_id).await {
        Ok(Some(product)) => {
            (StatusCode::OK, Json(dto::product_to_json(&product))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreatePackageRequest>,
) -> axum::response::Response {
    let action = GuardedAction::new(["catalog.packages.create"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let package_type = match body.package_type.parse::<PackageType>() {
        Ok(t) => t,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
    };

    let package_id = PackageId::new(EntityId::new());
    let package = match Package::new(
        package_id,
        venue.venue_id(),
        body.name,
        package_type,
        body.base_price,
        body.cost_price,
        Utc::now(),
    ) {
        Ok(p) => p,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
    };

    let mut components = Vec::with_capacity(body.components.len());
    for c in body.components {
        let product_id = match c.product_id.parse::<EntityId>() {
            Ok(v) => ProductId::new(v),
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "invalid component product id",
                );
            }
        };
        match PackageComponent::new(package_id, product_id, c.required_quantity) {
            Ok(component) => components.push(component),
            Err(e) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    e.to_string(),
                );
            }
        }
    }

    if let Err(e) = services
        .insert_package(package.clone(), components.clone())
        .await
    {
        return errors::store_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(dto::package_to_json(&package, &components)),
    )
        .into_response()
}

pub async fn get_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let action = GuardedAction::new(["catalog.packages.read"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let package_id = match id.parse::<EntityId>() {
        Ok(v) => PackageId::new(v),
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid package id");
        }
    };

    let package = match services.get_package(venue.venue_id(), package_id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "package not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let components = match services
        .package_components(venue.venue_id(), package_id)
        .await
    {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(dto::package_to_json(&package, &components)),
    )
        .into_response()
}
