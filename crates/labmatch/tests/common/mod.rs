//! Test utilities and common setup.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use labmatch::api::{AppState, create_router};
use labmatch::auth::{AuthState, Identity, Role, TokenIssuer};
use labmatch::db::Database;

pub const ACCESS_SECRET: &str = "access-secret-for-integration-tests-32-chars";
pub const REFRESH_SECRET: &str = "refresh-secret-for-integration-tests-32-chars";

/// A router over an in-memory database, plus the auth state used to build
/// it so tests can mint tokens directly (expired ones included).
pub struct TestApp {
    pub router: Router,
    pub auth: AuthState,
}

/// Create a test application over an in-memory database.
pub async fn test_app() -> TestApp {
    let db = Database::in_memory().await.unwrap();

    let issuer = TokenIssuer::new(ACCESS_SECRET, REFRESH_SECRET, 15 * 60, 7 * 24 * 60 * 60);
    let auth = AuthState::new(issuer);

    let state = AppState::new(&db, auth.clone());
    TestApp {
        router: create_router(state),
        auth,
    }
}

impl TestApp {
    /// Send a request; `bearer` adds an Authorization header, `body` is
    /// serialized as JSON.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sign up an account and return its token pair as
    /// `(access_token, refresh_token)`.
    pub async fn signup(&self, email: &str, password: &str, name: &str, role: &str) -> (String, String) {
        let response = self
            .request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": password,
                    "name": name,
                    "role": role,
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    /// Mint an access token directly, bypassing the HTTP surface. Negative
    /// `ttl_secs` yields an already-expired token.
    pub fn mint_access_token(&self, id: i64, email: &str, role: Role, ttl_secs: i64) -> String {
        let identity = Identity {
            id,
            email: email.to_string(),
            role,
        };
        self.auth
            .issuer()
            .issue_with_ttls(&identity, ttl_secs, ttl_secs)
            .unwrap()
            .access_token
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
