//! HTTP router composition.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::onboarding::{OnboardingManager, OnboardingRouteState, onboarding_routes};
use crate::store::Database;
use crate::users::{UserRegistry, UserRouteState, user_routes};

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// All service routes over one database, with CORS and request tracing.
pub fn app_router(db: Arc<dyn Database>) -> Router {
    let onboarding = OnboardingRouteState {
        manager: Arc::new(OnboardingManager::new(Arc::clone(&db))),
    };
    let users = UserRouteState {
        registry: Arc::new(UserRegistry::new(db)),
    };

    Router::new()
        .route("/health", get(health))
        .merge(onboarding_routes(onboarding))
        .merge(user_routes(users))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the app on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, db: Arc<dyn Database>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Onboarding server listening");
    }
    axum::serve(listener, app_router(db)).await
}
