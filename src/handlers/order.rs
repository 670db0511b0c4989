use axum::extract::{Extension, Path, State};
use axum::Json;

use crate::dtos::order::ConfirmOrderResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::Order;
use crate::state::AppState;

pub async fn list_orders(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(engine.list_orders(&auth.actor).await?))
}

pub async fn get_order(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(engine.get_order(&auth.actor, id).await?))
}

pub async fn confirm_order(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ConfirmOrderResponse>, AppError> {
    let (order, shipment) = engine.confirm_order(&auth.actor, id).await?;
    Ok(Json(ConfirmOrderResponse { order, shipment }))
}
