use chrono::{DateTime, Utc};
use serde::Serialize;

use super::status::OrderStatus;

/// A supplier's commitment to fulfil a confirmed request. Created only as a
/// side effect of the supplier confirming the request; at most one per
/// request.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub request_id: i64,
    pub supplier_id: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
