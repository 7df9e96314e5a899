use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use safeaid_auth::{policy, RegisterUser, UserView};
use safeaid_infra::LoginOutcome;

use crate::app::dto::LoginRequest;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::AuthContext;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginOutcome>, ApiError> {
    let Json(body) = body?;
    let outcome = services
        .accounts
        .login(body.email.as_deref(), body.password.as_deref(), Utc::now())
        .await?;
    Ok(Json(outcome))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    body: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    require(&ctx, policy::USER_ADMIN)?;
    let Json(body) = body?;

    let user = services
        .accounts
        .register(body, Some(ctx.user_id()), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(services.accounts.get_user(ctx.user_id()).await?))
}
