use axum::extract::{Extension, Path, State};
use axum::Json;

use crate::dtos::shipment::AdvanceShipmentBody;
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::Shipment;
use crate::state::AppState;
use crate::workflow::ShipmentFields;

pub async fn list_shipments(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Shipment>>, AppError> {
    Ok(Json(engine.list_shipments(&auth.actor).await?))
}

pub async fn get_shipment(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<Shipment>, AppError> {
    Ok(Json(engine.get_shipment(&auth.actor, id).await?))
}

pub async fn advance_shipment(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<AdvanceShipmentBody>,
) -> Result<Json<Shipment>, AppError> {
    let fields = ShipmentFields {
        tracking_number: body.tracking_number,
        carrier: body.carrier,
        estimated_delivery: body.estimated_delivery,
        notes: body.notes,
    };
    let shipment = engine
        .advance_shipment(&auth.actor, id, body.status, fields)
        .await?;
    Ok(Json(shipment))
}

pub async fn confirm_delivery(
    State(AppState { engine }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<Shipment>, AppError> {
    Ok(Json(engine.confirm_delivery(&auth.actor, id).await?))
}
