//! REST endpoints for user signup and the collected data.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::model::{CreateUserRequest, UserDataRow};
use super::registry::UserRegistry;
use crate::error::ApiError;

/// Shared state for user routes.
#[derive(Clone)]
pub struct UserRouteState {
    pub registry: Arc<UserRegistry>,
}

/// POST /users
///
/// 201 with an empty body once the user and address are stored.
async fn create_user(
    State(state): State<UserRouteState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    state.registry.create_user(request).await?;
    Ok(StatusCode::CREATED)
}

/// GET /data
async fn get_data(
    State(state): State<UserRouteState>,
) -> Result<Json<Vec<UserDataRow>>, ApiError> {
    Ok(Json(state.registry.list_data().await?))
}

/// Build the user REST routes.
pub fn user_routes(state: UserRouteState) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/data", get(get_data))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::store::LibSqlBackend;

    async fn app() -> Router {
        let db = LibSqlBackend::new_memory().await.unwrap();
        user_routes(UserRouteState {
            registry: Arc::new(UserRegistry::new(Arc::new(db))),
        })
    }

    fn signup(email: &str, zip: &str) -> Request<Body> {
        let body = json!({
            "email": email,
            "password": "secret",
            "dynamic": {
                "aboutMe": "Hi",
                "birthday": "1990-05-17T00:00:00.000Z",
                "address": {"street": "1 Main St", "city": "Springfield", "state": "IL", "zipCode": zip}
            }
        });
        Request::post("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_then_list() {
        let app = app().await;
        let resp = app
            .clone()
            .oneshot(signup("ada@example.com", "62701"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());

        let resp = app
            .oneshot(Request::get("/data").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!([{
                "email": "ada@example.com",
                "aboutMe": "Hi",
                "birthday": "1990-05-17T00:00:00.000Z",
                "address": {"street": "1 Main St", "city": "Springfield", "state": "IL", "zipCode": "62701"}
            }])
        );
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let app = app().await;
        let first = app.clone().oneshot(signup("ada@example.com", "62701")).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app.oneshot(signup("ada@example.com", "62701")).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert!(body_json(second).await["error"].is_string());
    }

    #[tokio::test]
    async fn short_zip_is_bad_request() {
        let app = app().await;
        let resp = app.clone().oneshot(signup("ada@example.com", "1234")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["error"],
            "Zip code must be exactly 5 characters"
        );

        let resp = app
            .oneshot(Request::get("/data").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await, json!([]));
    }

    #[tokio::test]
    async fn missing_fields_are_bad_request() {
        let resp = app()
            .await
            .oneshot(
                Request::post("/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email": "a@example.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
