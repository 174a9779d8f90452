use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use tapline_catalog::ProductId;
use tapline_core::{Actor, EntityId, UserId};
use tapline_infra::MovementFilter;
use tapline_stock::{MovementDraft, MovementType};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::{GuardedAction, authorize_action};
use crate::context::{PrincipalContext, VenueContext};

pub fn router() -> Router {
    Router::new()
        .route("/movements", post(apply_movement))
        .route("/products/:id/movements", get(movement_history))
        .route("/products/:id/impact", get(product_impact))
}

pub async fn apply_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ApplyMovementRequest>,
) -> axum::response::Response {
    let action = GuardedAction::new(["inventory.movements.apply"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let product_id = match body.product_id.parse::<EntityId>() {
        Ok(v) => ProductId::new(v),
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };
    let movement_type = match body.movement_type.parse::<MovementType>() {
        Ok(t) => t,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
    };

    let draft = MovementDraft {
        venue_id: venue.venue_id(),
        product_id,
        movement_type,
        quantity_change: body.quantity_change,
        reason: body.reason,
        performed_by: Actor::User(UserId::from_uuid(*principal.principal_id().as_uuid())),
        unit_cost: body.unit_cost,
        notes: body.notes,
        allow_negative: body.allow_negative,
        occurred_at: Utc::now(),
    };

    match services
        .apply_movement(principal.tier(), body.manager_approved, draft)
        .await
    {
        Ok(movement) => {
            (StatusCode::CREATED, Json(dto::movement_to_json(&movement))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn movement_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::MovementHistoryQuery>,
) -> axum::response::Response {
    let action = GuardedAction::new(["inventory.movements.read"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let product_id = match id.parse::<EntityId>() {
        Ok(v) => ProductId::new(v),
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    let movement_type = match query.movement_type.as_deref() {
        Some(raw) => match raw.parse::<MovementType>() {
            Ok(t) => Some(t),
            Err(e) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    e.to_string(),
                );
            }
        },
        None => None,
    };

    let filter = MovementFilter {
        movement_type,
        from: query.from,
        to: query.to,
        limit: query.limit,
        offset: query.offset,
    };

    match services.movements(venue.venue_id(), product_id, filter).await {
        Ok(movements) => (
            StatusCode::OK,
            Json(json!({
                "count": movements.len(),
                "items": movements.iter().map(dto::movement_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn product_impact(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let action = GuardedAction::new(["availability.read"]);
    if let Err(e) = authorize_action(&venue, &principal, &action) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let product_id = match id.parse::<EntityId>() {
        Ok(v) => ProductId::new(v),
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.product_impact(venue.venue_id(), product_id).await {
        Ok(impact) => (StatusCode::OK, Json(dto::impact_to_json(&impact))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
