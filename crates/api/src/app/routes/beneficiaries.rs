use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use safeaid_auth::policy;
use safeaid_beneficiaries::{Beneficiary, BeneficiaryInput};
use safeaid_core::BeneficiaryId;

use crate::app::dto::MessageResponse;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_beneficiaries).post(create_beneficiary))
        .route(
            "/:id",
            get(get_beneficiary)
                .put(update_beneficiary)
                .patch(update_beneficiary)
                .delete(delete_beneficiary),
        )
}

fn parse_id(raw: &str) -> Result<BeneficiaryId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("Invalid beneficiary ID"))
}

pub async fn create_beneficiary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    body: Result<Json<BeneficiaryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Beneficiary>), ApiError> {
    require(&ctx, policy::BENEFICIARY_WRITE)?;
    let Json(body) = body?;

    let created = services
        .beneficiaries
        .create(body, ctx.user_id(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_beneficiaries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<Beneficiary>>, ApiError> {
    require(&ctx, policy::BENEFICIARY_READ)?;
    Ok(Json(services.beneficiaries.list().await?))
}

pub async fn get_beneficiary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<Beneficiary>, ApiError> {
    require(&ctx, policy::BENEFICIARY_READ)?;
    let id = parse_id(&id)?;
    Ok(Json(services.beneficiaries.get(id).await?))
}

pub async fn update_beneficiary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<BeneficiaryInput>, JsonRejection>,
) -> Result<Json<Beneficiary>, ApiError> {
    require(&ctx, policy::BENEFICIARY_WRITE)?;
    let id = parse_id(&id)?;
    let Json(body) = body?;

    Ok(Json(services.beneficiaries.update(id, body, Utc::now()).await?))
}

pub async fn delete_beneficiary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&ctx, policy::BENEFICIARY_WRITE)?;
    let id = parse_id(&id)?;

    services.beneficiaries.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Beneficiary deleted successfully",
    }))
}
