use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use safeaid_auth::policy;
use safeaid_core::TrainingModuleId;
use safeaid_infra::TrainingFilter;
use safeaid_training::{TrainingInput, TrainingModule};

use crate::app::dto::{MessageResponse, TrainingListQuery};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_training).post(create_training))
        .route(
            "/:id",
            get(get_training)
                .put(update_training)
                .patch(update_training)
                .delete(delete_training),
        )
}

fn parse_id(raw: &str) -> Result<TrainingModuleId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("Invalid training module ID"))
}

pub async fn create_training(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    body: Result<Json<TrainingInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TrainingModule>), ApiError> {
    require(&ctx, policy::TRAINING_WRITE)?;
    let Json(body) = body?;

    let module = services.training.create(body, ctx.user_id(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

pub async fn list_training(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    query: Result<Query<TrainingListQuery>, QueryRejection>,
) -> Result<Json<Vec<TrainingModule>>, ApiError> {
    require(&ctx, policy::TRAINING_READ)?;
    let Query(query) = query?;

    let filter = TrainingFilter {
        include_inactive: query.include_inactive,
        category: query.category.filter(|c| !c.trim().is_empty()),
    };
    Ok(Json(services.training.list(&filter).await?))
}

pub async fn get_training(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<TrainingModule>, ApiError> {
    require(&ctx, policy::TRAINING_READ)?;
    let id = parse_id(&id)?;
    Ok(Json(services.training.get(id).await?))
}

pub async fn update_training(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<TrainingInput>, JsonRejection>,
) -> Result<Json<TrainingModule>, ApiError> {
    require(&ctx, policy::TRAINING_WRITE)?;
    let id = parse_id(&id)?;
    let Json(body) = body?;

    Ok(Json(services.training.update(id, body, Utc::now()).await?))
}

pub async fn delete_training(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&ctx, policy::TRAINING_WRITE)?;
    let id = parse_id(&id)?;

    services.training.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Training module deleted successfully",
    }))
}
