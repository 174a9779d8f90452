use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::context::{PrincipalContext, VenueContext};

pub async fn health() -> axum::response::Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

pub async fn whoami(
    Extension(venue): Extension<VenueContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(json!({
            "venue_id": venue.venue_id().to_string(),
            "principal_id": principal.principal_id().to_string(),
            "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
            "tier": principal.tier(),
        })),
    )
        .into_response()
}
