//! Persistence collaborator for the workflow engine.
//!
//! The engine only ever talks to a [`WorkflowStore`]. Transition writes are
//! conditional on the expected current status; a failed precondition comes
//! back as [`WriteOutcome::PreconditionFailed`] rather than overwriting.
//! Creates that carry a generated number report [`CreateOutcome::DuplicateNumber`]
//! on a uniqueness conflict so the engine can re-derive and retry.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{
    CatalogItem, Order, OrderStatus, Priority, RequestItem, RequestStatus, Shipment,
    ShipmentStatus, SupplyRequest,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or timed out. No partial write happened.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a conditional transition write.
#[derive(Debug)]
pub enum WriteOutcome<T> {
    Applied(T),
    /// Current status did not match the expected one; nothing written.
    PreconditionFailed,
    NotFound,
}

/// Result of a create that enforces a unique generated number.
#[derive(Debug)]
pub enum CreateOutcome<T> {
    Created(T),
    DuplicateNumber,
    /// For transactional creates gated on a parent status (confirm paths):
    /// the parent's status precondition failed, nothing written.
    PreconditionFailed,
    NotFound,
}

/// Which entities a query may see, derived from the actor's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    All,
    Branch(i64),
    Supplier(i64),
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub request_number: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub branch_id: i64,
    pub requested_by: i64,
    pub requested_date: NaiveDate,
    pub required_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRequestItem {
    pub item_id: i64,
    pub quantity: i32,
    pub specifications: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub request_id: i64,
    pub supplier_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewShipment {
    pub shipment_number: String,
    pub order_id: i64,
}

/// Field updates applied together with a request status transition.
/// `notes` replaces the whole column; the engine composes the appended log
/// before writing, and the status precondition rules out lost updates.
#[derive(Debug, Clone, Default)]
pub struct RequestChange {
    pub notes: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_date: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub required_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ShipmentChange {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub notes: Option<String>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
}

/// Order status change applied together with a shipment transition. The pair
/// commits as one unit; the order is never moved without its shipment.
#[derive(Debug, Clone, Copy)]
pub struct OrderShadow {
    pub order_id: i64,
    pub expected: OrderStatus,
    pub new_status: OrderStatus,
}

/// Outcome of the combined shipment + order transition write. On any
/// precondition miss, neither entity was modified.
#[derive(Debug)]
pub enum ShipmentWriteOutcome {
    Applied(Shipment),
    ShipmentPreconditionFailed,
    ShipmentNotFound,
    OrderPreconditionFailed,
    OrderNotFound,
}

/// Storage contract the workflow engine requires. Implementations must make
/// each transition write atomic (check-and-set on the current status) and the
/// confirm paths transactional: a request is never marked confirmed without
/// its order, an order never confirmed without its shipment.
#[async_trait]
pub trait WorkflowStore: Send + Sync + 'static {
    async fn read_request(&self, id: i64) -> StoreResult<Option<SupplyRequest>>;

    async fn read_request_items(&self, request_id: i64) -> StoreResult<Vec<RequestItem>>;

    /// Insert a request and its items in one transaction.
    async fn create_request(
        &self,
        request: NewRequest,
        items: Vec<NewRequestItem>,
    ) -> StoreResult<CreateOutcome<SupplyRequest>>;

    /// Conditionally move a request from `expected` to `new_status`, applying
    /// `change` in the same write.
    async fn write_request_transition(
        &self,
        id: i64,
        expected: RequestStatus,
        new_status: RequestStatus,
        change: RequestChange,
    ) -> StoreResult<WriteOutcome<SupplyRequest>>;

    /// Resubmission: `modified -> pending` plus field updates and, when
    /// provided, full replacement of the item list — one transaction.
    async fn resubmit_request(
        &self,
        id: i64,
        change: RequestChange,
        items: Option<Vec<NewRequestItem>>,
    ) -> StoreResult<WriteOutcome<SupplyRequest>>;

    /// Confirm path: `approved -> confirmed` on the request and the order
    /// insert succeed or fail together.
    async fn confirm_request_and_create_order(
        &self,
        request_id: i64,
        notes: Option<String>,
        order: NewOrder,
    ) -> StoreResult<CreateOutcome<Order>>;

    async fn read_order(&self, id: i64) -> StoreResult<Option<Order>>;

    async fn order_for_request(&self, request_id: i64) -> StoreResult<Option<Order>>;

    /// Confirm path: `pending -> confirmed` on the order and the shipment
    /// insert succeed or fail together.
    async fn confirm_order_and_create_shipment(
        &self,
        order_id: i64,
        shipment: NewShipment,
    ) -> StoreResult<CreateOutcome<Shipment>>;

    async fn read_shipment(&self, id: i64) -> StoreResult<Option<Shipment>>;

    async fn shipment_for_order(&self, order_id: i64) -> StoreResult<Option<Shipment>>;

    /// Conditionally move a shipment from `expected` to `new_status`,
    /// applying `change`, and when `shadow` is given apply the order's
    /// check-and-set in the same transaction. Both writes land or neither
    /// does.
    async fn write_shipment_and_order_transition(
        &self,
        id: i64,
        expected: ShipmentStatus,
        new_status: ShipmentStatus,
        change: ShipmentChange,
        shadow: Option<OrderShadow>,
    ) -> StoreResult<ShipmentWriteOutcome>;

    async fn list_requests(&self, scope: ReadScope) -> StoreResult<Vec<SupplyRequest>>;

    async fn list_orders(&self, scope: ReadScope) -> StoreResult<Vec<Order>>;

    async fn list_shipments(&self, scope: ReadScope) -> StoreResult<Vec<Shipment>>;

    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>>;

    async fn item_exists(&self, item_id: i64) -> StoreResult<bool>;
}
