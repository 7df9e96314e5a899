use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    routing::{delete, get, patch},
    Json, Router,
};
use chrono::Utc;

use safeaid_auth::{policy, UserView};
use safeaid_core::UserId;

use crate::app::dto::{MessageResponse, UpdateStatusRequest, UserStatusResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/status/:id", patch(update_status))
        .route("/:id", delete(delete_user))
}

fn parse_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("Invalid user ID"))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    require(&ctx, policy::USER_ADMIN)?;
    Ok(Json(services.accounts.list_users().await?))
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<UserStatusResponse>, ApiError> {
    require(&ctx, policy::USER_ADMIN)?;
    let id = parse_id(&id)?;
    let Json(body) = body?;

    let Some(is_active) = body.is_active.as_ref().and_then(serde_json::Value::as_bool) else {
        return Err(ApiError::bad_request("isActive must be a boolean"));
    };

    let user = services
        .accounts
        .set_status(ctx.user_id(), id, is_active, Utc::now())
        .await?;
    Ok(Json(UserStatusResponse {
        message: "User status updated",
        user,
    }))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&ctx, policy::USER_ADMIN)?;
    let id = parse_id(&id)?;

    services.accounts.delete_user(ctx.user_id(), id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
