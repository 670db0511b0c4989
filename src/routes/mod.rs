pub mod items;
pub mod orders;
pub mod requests;
pub mod shipments;

use axum::Router;

use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(requests::routes())
        .merge(orders::routes())
        .merge(shipments::routes())
        .merge(items::routes())
}
