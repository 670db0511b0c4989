use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::ShipmentStatus;

#[derive(Deserialize)]
pub struct AdvanceShipmentBody {
    pub status: ShipmentStatus,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
