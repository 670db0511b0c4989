use axum::{routing::get, Router};

use crate::handlers::item::list_items;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    // Public: catalog browsing needs no token.
    Router::new().route("/items", get(list_items))
}
