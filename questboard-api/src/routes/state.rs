/// User document endpoints
///
/// # Endpoints
///
/// ```text
/// GET   /v1/users/:user_id/state   → 200 document | 404
/// PUT   /v1/users/:user_id/state   → 201 {"created": true} | 200 {"created": false}
/// PATCH /v1/users/:user_id/state   → 204 | 404
/// ```
///
/// `PUT` never overwrites: if a document already exists it is left as it is
/// and `created` is `false`. `PATCH` replaces only the top-level fields present
/// in the body.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use questboard_shared::models::{UserDocument, UserId};
use serde::{Deserialize, Serialize};

/// Response for the create endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStateResponse {
    pub created: bool,
}

fn parse_user(raw: String) -> ApiResult<UserId> {
    UserId::new(raw).ok_or_else(|| ApiError::BadRequest("user id must not be blank".to_string()))
}

/// Fetches a user's document
pub async fn get_state(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserDocument>> {
    let user = parse_user(user_id)?;

    match state.store.get(&user).await? {
        Some(document) => Ok(Json(document)),
        None => Err(ApiError::NotFound(format!("No document stored for user {}", user))),
    }
}

/// Creates a user's document unless one exists
pub async fn create_state(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(document): Json<UserDocument>,
) -> ApiResult<(StatusCode, Json<CreateStateResponse>)> {
    let user = parse_user(user_id)?;

    let created = state.store.create_if_absent(&user, document).await?;
    tracing::info!(user_id = %user, created, "Create-if-absent request");

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CreateStateResponse { created })))
}

/// Replaces the fields present in the body
pub async fn update_state(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(patch): Json<UserDocument>,
) -> ApiResult<StatusCode> {
    let user = parse_user(user_id)?;

    let fields = patch.present_fields();
    state.store.update(&user, patch).await?;
    tracing::debug!(user_id = %user, fields = ?fields, "Updated document fields");

    Ok(StatusCode::NO_CONTENT)
}
