use axum::{middleware, routing::{get, post}, Router};

use crate::handlers::request::{
    create_request, decide_request, get_request, list_requests, resubmit_request,
    supplier_respond,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    // Every request endpoint is scoped by role, so all of them sit
    // behind the JWT gate.
    Router::new()
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/{id}", get(get_request))
        .route("/requests/{id}/decision", post(decide_request))
        .route("/requests/{id}/response", post(supplier_respond))
        .route("/requests/{id}/resubmit", post(resubmit_request))
        .layer(middleware::from_fn(require_auth))
}
