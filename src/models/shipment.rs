use chrono::{DateTime, Utc};
use serde::Serialize;

use super::status::ShipmentStatus;

#[derive(Debug, Clone, Serialize)]
pub struct Shipment {
    pub id: i64,
    pub shipment_number: String,
    pub order_id: i64,
    pub status: ShipmentStatus,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
