//! REST endpoints for the onboarding form layout.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::manager::OnboardingManager;
use super::model::OnboardingPage;
use crate::error::ApiError;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub manager: Arc<OnboardingManager>,
}

/// GET /onboarding-form
///
/// All pages, ascending by `index`.
async fn get_form(
    State(state): State<OnboardingRouteState>,
) -> Result<Json<Vec<OnboardingPage>>, ApiError> {
    Ok(Json(state.manager.get_pages().await?))
}

/// PUT /onboarding-form
///
/// Replaces the whole layout. Responds 200 with an empty body, or 400 if any
/// page would be left empty.
async fn put_form(
    State(state): State<OnboardingRouteState>,
    payload: Result<Json<Vec<OnboardingPage>>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(pages) = payload?;
    state.manager.replace_pages(pages).await?;
    Ok(StatusCode::OK)
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/onboarding-form", get(get_form).put(put_form))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::onboarding::model::default_pages;
    use crate::store::{Database, LibSqlBackend};

    async fn app() -> Router {
        let db = LibSqlBackend::new_memory().await.unwrap();
        db.replace_pages(&default_pages()).await.unwrap();
        onboarding_routes(OnboardingRouteState {
            manager: Arc::new(OnboardingManager::new(Arc::new(db))),
        })
    }

    fn put(body: &str) -> Request<Body> {
        Request::put("/onboarding-form")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn get_json(app: Router) -> Value {
        let resp = app
            .oneshot(Request::get("/onboarding-form").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn get_returns_pages() {
        let body = get_json(app().await).await;
        let pages = body.as_array().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0]["index"], 0);
        assert_eq!(pages[0]["components"][1]["key"], "address");
        assert_eq!(pages[1]["components"][0]["type"], "date");
    }

    #[tokio::test]
    async fn put_replaces_layout() {
        let app = app().await;
        let body = json!([
            {"index": 0, "components": [{"name": "Birthday", "key": "birthday", "type": "date"}]},
            {"index": 1, "components": [{"name": "About Me", "key": "aboutMe", "type": "textarea"}]}
        ]);

        let resp = app.clone().oneshot(put(&body.to_string())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());

        assert_eq!(get_json(app).await, body);
    }

    #[tokio::test]
    async fn put_with_empty_page_is_rejected() {
        let app = app().await;
        let before = get_json(app.clone()).await;
        let body = json!([
            {"index": 0, "components": [{"name": "Birthday", "key": "birthday", "type": "date"}]},
            {"index": 1, "components": []}
        ]);

        let resp = app.clone().oneshot(put(&body.to_string())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let err: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(err["error"], "Each index must have at least one component");

        assert_eq!(get_json(app).await, before);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let app = app().await;
        let resp = app
            .clone()
            .oneshot(put(r#"[{"index": -1, "components": []}]"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.oneshot(put("not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
