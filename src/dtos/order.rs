use serde::Serialize;

use crate::models::{Order, Shipment};

#[derive(Serialize)]
pub struct ConfirmOrderResponse {
    pub order: Order,
    pub shipment: Shipment,
}
