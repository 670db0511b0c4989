use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Order, Priority, RequestItem, SupplyRequest};
use crate::workflow::{Decision, SupplierResponse};

#[derive(Deserialize)]
pub struct CreateRequestBody {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub required_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<RequestItemBody>,
}

#[derive(Deserialize)]
pub struct RequestItemBody {
    pub item_id: i64,
    pub quantity: i32,
    pub specifications: Option<String>,
    pub notes: Option<String>,
}

/// Admin decision on a pending request. `reason` is required for
/// reject and modify.
#[derive(Deserialize)]
pub struct DecisionBody {
    pub action: Decision,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct SupplierResponseBody {
    pub action: SupplierResponse,
    pub notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ResubmitBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub required_date: Option<NaiveDate>,
    pub items: Option<Vec<RequestItemBody>>,
}

#[derive(Serialize)]
pub struct RequestDetailResponse {
    #[serde(flatten)]
    pub request: SupplyRequest,
    pub items: Vec<RequestItem>,
}

/// A confirm response carries the order it created (or the one it
/// already matched, on replay); modify/deny carry no order.
#[derive(Serialize)]
pub struct SupplierResponseResponse {
    pub request: SupplyRequest,
    pub order: Option<Order>,
}
