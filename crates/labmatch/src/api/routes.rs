//! API route definitions.
//!
//! Every route is registered with its `RouteAuthSpec`: public routes skip
//! the guard pipeline entirely, everything else passes the authentication
//! guard (whole protected group) and then a per-route authorization guard.

use axum::http::{Method, header};
use axum::{
    Router, middleware,
    routing::{MethodRouter, get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::{Role, RouteAuthSpec, auth_middleware, require_roles};

use super::handlers;
use super::handlers::{admin, applications, auth as auth_handlers, projects};
use super::state::AppState;

const ALL_ROLES: RouteAuthSpec =
    RouteAuthSpec::RequiresRoles(&[Role::Student, Role::Professor, Role::Admin]);
const STUDENT_ONLY: RouteAuthSpec = RouteAuthSpec::RequiresRoles(&[Role::Student]);
const PROFESSOR_ONLY: RouteAuthSpec = RouteAuthSpec::RequiresRoles(&[Role::Professor]);
const ADMIN_ONLY: RouteAuthSpec = RouteAuthSpec::RequiresRoles(&[Role::Admin]);

/// Attach the authorization guard for one route's declared spec.
fn authorized(routes: MethodRouter<AppState>, spec: RouteAuthSpec) -> MethodRouter<AppState> {
    routes.layer(middleware::from_fn_with_state(spec, require_roles))
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Tracing layer with request timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    // Clone auth state for the middleware layer
    let auth_state = state.auth.clone();

    // Protected routes: authentication guard for the whole group, then a
    // per-route authorization guard.
    let protected_routes = Router::new()
        .route("/auth/logout", authorized(post(auth_handlers::logout), ALL_ROLES))
        .route("/auth/me", authorized(get(auth_handlers::me), ALL_ROLES))
        .route(
            "/projects",
            authorized(get(projects::list_projects), ALL_ROLES)
                .merge(authorized(post(projects::create_project), PROFESSOR_ONLY)),
        )
        .route(
            "/projects/{id}",
            authorized(get(projects::get_project), ALL_ROLES).merge(authorized(
                put(projects::update_project).delete(projects::delete_project),
                PROFESSOR_ONLY,
            )),
        )
        .route(
            "/projects/{id}/applications",
            authorized(post(applications::apply), STUDENT_ONLY).merge(authorized(
                get(applications::list_for_project),
                PROFESSOR_ONLY,
            )),
        )
        .route(
            "/applications/mine",
            authorized(get(applications::mine), STUDENT_ONLY),
        )
        .route(
            "/applications/{id}/decision",
            authorized(post(applications::decide), PROFESSOR_ONLY),
        )
        .route("/admin/users", authorized(get(admin::list_users), ADMIN_ONLY))
        .route(
            "/admin/users/{id}",
            authorized(
                get(admin::get_user).delete(admin::delete_user),
                ADMIN_ONLY,
            ),
        )
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(state.clone());

    // Public routes (no authentication). The refresh endpoint is public for
    // the access-token guard; its handler verifies the refresh token itself.
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/signup", post(auth_handlers::signup))
        .route("/auth/signin", post(auth_handlers::signin))
        .route("/auth/refresh", post(auth_handlers::refresh))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(trace_layer)
}
