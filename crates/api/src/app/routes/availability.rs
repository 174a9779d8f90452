use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use tapline_catalog::PackageId;
use tapline_core::EntityId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::{GuardedAction, authorize_action};
use crate::context::{PrincipalContext, VenueContext};

pub fn router() -> Router {
    Router::new()
        .route("/packages", get(batch_availability))
        .route("/packages/:id", get(package_availability))
}

pub async fn package_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let action = GuardedAction::new(["availability.read"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let package_id = match id.parse::<EntityId>() {
        Ok(v) => PackageId::new(v),
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid package id");
        }
    };

    match services
        .package_availability(venue.venue_id(), package_id)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(dto::availability_to_json(&result))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn batch_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::BatchAvailabilityQuery>,
) -> axum::response::Response {
    let action = GuardedAction::new(["availability.read"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let mut package_ids = Vec::new();
    for raw in query.ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match raw.parse::<EntityId>() {
            Ok(v) => package_ids.push(PackageId::new(v)),
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    format!("invalid package id: {raw}"),
                );
            }
        }
    }
    if package_ids.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "ids must contain at least one package id",
        );
    }

    match services
        .packages_availability(venue.venue_id(), package_ids)
        .await
    {
        Ok(results) => (
            StatusCode::OK,
            Json(json!({
                "count": results.len(),
                "items": results.iter().map(dto::availability_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
