use axum::{middleware, routing::{get, post}, Router};

use crate::handlers::order::{confirm_order, get_order, list_orders};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/confirm", post(confirm_order))
        .layer(middleware::from_fn(require_auth))
}
