//! Clinic API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the clinic API router.
///
/// Layers, innermost first: audit logger, then CORS.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route(
            "/patients/:id/statut",
            post(endpoints::patients::change_status),
        )
        .route(
            "/medecins",
            get(endpoints::medecins::list).post(endpoints::medecins::create),
        )
        .route(
            "/medecins/:id",
            get(endpoints::medecins::detail)
                .put(endpoints::medecins::update)
                .delete(endpoints::medecins::remove),
        )
        .route(
            "/rendez-vous",
            get(endpoints::rendez_vous::list).post(endpoints::rendez_vous::create),
        )
        .route(
            "/rendez-vous/:id",
            get(endpoints::rendez_vous::detail)
                .put(endpoints::rendez_vous::update)
                .delete(endpoints::rendez_vous::remove),
        )
        .route(
            "/consultations",
            get(endpoints::consultations::list).post(endpoints::consultations::create),
        )
        .route(
            "/consultations/:id",
            get(endpoints::consultations::detail)
                .put(endpoints::consultations::update)
                .delete(endpoints::consultations::remove),
        )
        .route("/stats/dashboard", get(endpoints::stats::dashboard))
        .route("/dashboard/weekly", get(endpoints::stats::weekly))
        .route("/notifications", get(endpoints::notifications::list))
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(CorsLayer::permissive());

    Router::new().nest("/api", api)
}
