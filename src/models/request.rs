use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::status::{Priority, RequestStatus};

#[derive(Debug, Clone, Serialize)]
pub struct SupplyRequest {
    pub id: i64,
    pub request_number: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: RequestStatus,
    pub branch_id: i64,
    pub requested_by: i64,
    pub requested_date: NaiveDate,
    pub required_date: Option<NaiveDate>,
    pub approved_by: Option<i64>,
    pub approved_date: Option<DateTime<Utc>>,
    /// Append-only action log. Decision reasons are appended as
    /// `ACTION: reason` blocks, newest last; existing entries are never
    /// overwritten.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestItem {
    pub id: i64,
    pub request_id: i64,
    pub item_id: i64,
    pub quantity: i32,
    pub specifications: Option<String>,
    pub notes: Option<String>,
}
