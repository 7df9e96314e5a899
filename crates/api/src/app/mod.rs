//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: stores, cipher, token signer and the application services
//! - `routes/`: HTTP handlers, one file per resource
//! - `dto.rs`: request/response DTOs that are not domain types
//! - `errors.rs`: the JSON error envelope

use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Settings;
use crate::middleware;
use crate::rate_limit::ClientRateLimiter;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{AppServices, Stores};

/// Build the full HTTP router from settings (public entrypoint used by `main.rs`).
pub async fn build_app(settings: &Settings) -> anyhow::Result<Router> {
    let stores = Stores::from_settings(settings).await?;
    build_app_with(settings, stores).await
}

/// Build the router over caller-provided stores.
///
/// Creates the bootstrap admin first when one is configured and the user
/// collection is empty.
pub async fn build_app_with(settings: &Settings, stores: Stores) -> anyhow::Result<Router> {
    let services = Arc::new(AppServices::new(settings, stores)?);

    if let Some(admin) = settings.bootstrap_admin.clone() {
        if let Some(user) = services
            .accounts
            .bootstrap_admin(admin, Utc::now())
            .await
            .context("failed to create bootstrap admin")?
        {
            info!(user_id = %user.id, "bootstrap admin created");
        }
    }

    let login_limiter = ClientRateLimiter::new(settings.login_rate_limit);
    let api_limiter = ClientRateLimiter::new(settings.api_rate_limit);
    login_limiter.spawn_pruning();
    api_limiter.spawn_pruning();
    let trusted_proxies = middleware::TrustedProxies::new(&settings.trusted_proxies);
    let auth_state = middleware::AuthState {
        accounts: services.accounts.clone(),
    };

    // Login is the only unauthenticated /api route.
    let public = Router::new().route(
        "/auth/login",
        post(routes::auth::login).route_layer(from_fn_with_state(login_limiter, middleware::rate_limit)),
    );

    let protected = routes::router().layer(from_fn_with_state(auth_state, middleware::auth_middleware));

    let api = public
        .merge(protected)
        .layer(from_fn_with_state(api_limiter, middleware::rate_limit));

    let cors = cors_layer(&settings.cors_origin)?;

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .fallback(routes::system::not_found)
        .layer(Extension(services))
        .layer(from_fn_with_state(trusted_proxies, middleware::extract_client_ip))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                )),
        ))
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin).with_context(|| format!("invalid CORS_ORIGIN '{origin}'"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}
