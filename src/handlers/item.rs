use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::models::CatalogItem;
use crate::state::AppState;

/// The item catalog is reference data; it stays readable without a token.
pub async fn list_items(
    State(AppState { engine }): State<AppState>,
) -> Result<Json<Vec<CatalogItem>>, AppError> {
    Ok(Json(engine.list_items().await?))
}
