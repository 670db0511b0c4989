use axum::{middleware, routing::{get, post}, Router};

use crate::handlers::shipment::{
    advance_shipment, confirm_delivery, get_shipment, list_shipments,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shipments", get(list_shipments))
        .route("/shipments/{id}", get(get_shipment))
        .route("/shipments/{id}/status", post(advance_shipment))
        .route("/shipments/{id}/confirm-delivery", post(confirm_delivery))
        .layer(middleware::from_fn(require_auth))
}
