//! In-process store with the same conditional-write and unique-number
//! semantics as the Postgres backend. Used by the test suite and handy for
//! local demos without a database.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{
    CatalogItem, Order, OrderStatus, RequestItem, RequestStatus, Shipment, ShipmentStatus,
    SupplyRequest,
};

use super::{
    CreateOutcome, NewOrder, NewRequest, NewRequestItem, NewShipment, OrderShadow, ReadScope,
    RequestChange, ShipmentChange, ShipmentWriteOutcome, StoreError, StoreResult, WorkflowStore,
    WriteOutcome,
};

#[derive(Default)]
struct Inner {
    requests: HashMap<i64, SupplyRequest>,
    request_items: HashMap<i64, Vec<RequestItem>>,
    orders: HashMap<i64, Order>,
    shipments: HashMap<i64, Shipment>,
    items: HashMap<i64, CatalogItem>,
    numbers: HashSet<String>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    unavailable: Arc<AtomicBool>,
    forced_duplicates: Arc<AtomicU32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a catalog item, returning its id.
    pub fn seed_item(&self, name: &str, unit: &str) -> i64 {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id();
        inner.items.insert(
            id,
            CatalogItem {
                id,
                name: name.to_string(),
                unit: unit.to_string(),
                description: None,
            },
        );
        id
    }

    /// Make every subsequent call fail as unavailable, for tests exercising
    /// the collaborator-outage path.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make the next `n` number-bearing creates report a duplicate number,
    /// for tests exercising the re-derive-and-retry loop.
    pub fn fail_creates_with_duplicate(&self, n: u32) {
        self.forced_duplicates.store(n, Ordering::SeqCst);
    }

    /// Overwrite an order's status out-of-band, simulating a concurrent
    /// writer between an engine's read and its conditional write.
    pub fn force_order_status(&self, id: i64, status: OrderStatus) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(order) = inner.orders.get_mut(&id) {
            order.status = status;
        }
    }

    fn guard(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn take_forced_duplicate(&self) -> bool {
        self.forced_duplicates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn apply_request_change(request: &mut SupplyRequest, change: RequestChange) {
    if let Some(notes) = change.notes {
        request.notes = Some(notes);
    }
    if let Some(by) = change.approved_by {
        request.approved_by = Some(by);
    }
    if let Some(at) = change.approved_date {
        request.approved_date = Some(at);
    }
    if let Some(title) = change.title {
        request.title = title;
    }
    if let Some(description) = change.description {
        request.description = Some(description);
    }
    if let Some(priority) = change.priority {
        request.priority = priority;
    }
    if let Some(required) = change.required_date {
        request.required_date = Some(required);
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn read_request(&self, id: i64) -> StoreResult<Option<SupplyRequest>> {
        Ok(self.guard()?.requests.get(&id).cloned())
    }

    async fn read_request_items(&self, request_id: i64) -> StoreResult<Vec<RequestItem>> {
        Ok(self
            .guard()?
            .request_items
            .get(&request_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_request(
        &self,
        request: NewRequest,
        items: Vec<NewRequestItem>,
    ) -> StoreResult<CreateOutcome<SupplyRequest>> {
        let mut inner = self.guard()?;
        if self.take_forced_duplicate() || !inner.numbers.insert(request.request_number.clone()) {
            return Ok(CreateOutcome::DuplicateNumber);
        }
        let id = inner.next_id();
        let created = SupplyRequest {
            id,
            request_number: request.request_number,
            title: request.title,
            description: request.description,
            priority: request.priority,
            status: RequestStatus::Pending,
            branch_id: request.branch_id,
            requested_by: request.requested_by,
            requested_date: request.requested_date,
            required_date: request.required_date,
            approved_by: None,
            approved_date: None,
            notes: request.notes,
            created_at: Utc::now(),
        };
        let items = items
            .into_iter()
            .map(|item| {
                let item_row_id = inner.next_id();
                RequestItem {
                    id: item_row_id,
                    request_id: id,
                    item_id: item.item_id,
                    quantity: item.quantity,
                    specifications: item.specifications,
                    notes: item.notes,
                }
            })
            .collect();
        inner.requests.insert(id, created.clone());
        inner.request_items.insert(id, items);
        Ok(CreateOutcome::Created(created))
    }

    async fn write_request_transition(
        &self,
        id: i64,
        expected: RequestStatus,
        new_status: RequestStatus,
        change: RequestChange,
    ) -> StoreResult<WriteOutcome<SupplyRequest>> {
        let mut inner = self.guard()?;
        let Some(request) = inner.requests.get_mut(&id) else {
            return Ok(WriteOutcome::NotFound);
        };
        if request.status != expected {
            return Ok(WriteOutcome::PreconditionFailed);
        }
        request.status = new_status;
        apply_request_change(request, change);
        Ok(WriteOutcome::Applied(request.clone()))
    }

    async fn resubmit_request(
        &self,
        id: i64,
        change: RequestChange,
        items: Option<Vec<NewRequestItem>>,
    ) -> StoreResult<WriteOutcome<SupplyRequest>> {
        let mut inner = self.guard()?;
        let Some(request) = inner.requests.get_mut(&id) else {
            return Ok(WriteOutcome::NotFound);
        };
        if request.status != RequestStatus::Modified {
            return Ok(WriteOutcome::PreconditionFailed);
        }
        request.status = RequestStatus::Pending;
        apply_request_change(request, change);
        let updated = request.clone();
        if let Some(items) = items {
            let replaced = items
                .into_iter()
                .map(|item| {
                    let item_row_id = inner.next_id();
                    RequestItem {
                        id: item_row_id,
                        request_id: id,
                        item_id: item.item_id,
                        quantity: item.quantity,
                        specifications: item.specifications,
                        notes: item.notes,
                    }
                })
                .collect();
            inner.request_items.insert(id, replaced);
        }
        Ok(WriteOutcome::Applied(updated))
    }

    async fn confirm_request_and_create_order(
        &self,
        request_id: i64,
        notes: Option<String>,
        order: NewOrder,
    ) -> StoreResult<CreateOutcome<Order>> {
        let mut inner = self.guard()?;
        if !inner.requests.contains_key(&request_id) {
            return Ok(CreateOutcome::NotFound);
        }
        if inner.requests[&request_id].status != RequestStatus::Approved {
            return Ok(CreateOutcome::PreconditionFailed);
        }
        if self.take_forced_duplicate() || !inner.numbers.insert(order.order_number.clone()) {
            return Ok(CreateOutcome::DuplicateNumber);
        }
        if let Some(request) = inner.requests.get_mut(&request_id) {
            request.status = RequestStatus::Confirmed;
            if let Some(notes) = notes {
                request.notes = Some(notes);
            }
        }
        let id = inner.next_id();
        let created = Order {
            id,
            order_number: order.order_number,
            request_id,
            supplier_id: order.supplier_id,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        inner.orders.insert(id, created.clone());
        Ok(CreateOutcome::Created(created))
    }

    async fn read_order(&self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.guard()?.orders.get(&id).cloned())
    }

    async fn order_for_request(&self, request_id: i64) -> StoreResult<Option<Order>> {
        Ok(self
            .guard()?
            .orders
            .values()
            .find(|o| o.request_id == request_id)
            .cloned())
    }

    async fn confirm_order_and_create_shipment(
        &self,
        order_id: i64,
        shipment: NewShipment,
    ) -> StoreResult<CreateOutcome<Shipment>> {
        let mut inner = self.guard()?;
        if !inner.orders.contains_key(&order_id) {
            return Ok(CreateOutcome::NotFound);
        }
        if inner.orders[&order_id].status != OrderStatus::Pending {
            return Ok(CreateOutcome::PreconditionFailed);
        }
        if self.take_forced_duplicate() || !inner.numbers.insert(shipment.shipment_number.clone()) {
            return Ok(CreateOutcome::DuplicateNumber);
        }
        if let Some(order) = inner.orders.get_mut(&order_id) {
            order.status = OrderStatus::Confirmed;
        }
        let id = inner.next_id();
        let created = Shipment {
            id,
            shipment_number: shipment.shipment_number,
            order_id,
            status: ShipmentStatus::Preparing,
            tracking_number: None,
            carrier: None,
            shipped_date: None,
            estimated_delivery: None,
            actual_delivery: None,
            notes: None,
            created_at: Utc::now(),
        };
        inner.shipments.insert(id, created.clone());
        Ok(CreateOutcome::Created(created))
    }

    async fn read_shipment(&self, id: i64) -> StoreResult<Option<Shipment>> {
        Ok(self.guard()?.shipments.get(&id).cloned())
    }

    async fn shipment_for_order(&self, order_id: i64) -> StoreResult<Option<Shipment>> {
        Ok(self
            .guard()?
            .shipments
            .values()
            .find(|s| s.order_id == order_id)
            .cloned())
    }

    async fn write_shipment_and_order_transition(
        &self,
        id: i64,
        expected: ShipmentStatus,
        new_status: ShipmentStatus,
        change: ShipmentChange,
        shadow: Option<OrderShadow>,
    ) -> StoreResult<ShipmentWriteOutcome> {
        let mut inner = self.guard()?;

        // Check both preconditions before touching either entity, so a miss
        // leaves everything as it was.
        match inner.shipments.get(&id) {
            None => return Ok(ShipmentWriteOutcome::ShipmentNotFound),
            Some(shipment) if shipment.status != expected => {
                return Ok(ShipmentWriteOutcome::ShipmentPreconditionFailed)
            }
            Some(_) => {}
        }
        if let Some(shadow) = shadow {
            match inner.orders.get(&shadow.order_id) {
                None => return Ok(ShipmentWriteOutcome::OrderNotFound),
                Some(order) if order.status != shadow.expected => {
                    return Ok(ShipmentWriteOutcome::OrderPreconditionFailed)
                }
                Some(_) => {}
            }
        }

        if let Some(shadow) = shadow {
            if let Some(order) = inner.orders.get_mut(&shadow.order_id) {
                order.status = shadow.new_status;
            }
        }
        let Some(shipment) = inner.shipments.get_mut(&id) else {
            return Ok(ShipmentWriteOutcome::ShipmentNotFound);
        };
        shipment.status = new_status;
        if let Some(tracking) = change.tracking_number {
            shipment.tracking_number = Some(tracking);
        }
        if let Some(carrier) = change.carrier {
            shipment.carrier = Some(carrier);
        }
        if let Some(notes) = change.notes {
            shipment.notes = Some(notes);
        }
        if let Some(shipped) = change.shipped_date {
            shipment.shipped_date = Some(shipped);
        }
        if let Some(estimated) = change.estimated_delivery {
            shipment.estimated_delivery = Some(estimated);
        }
        if let Some(delivered) = change.actual_delivery {
            shipment.actual_delivery = Some(delivered);
        }
        Ok(ShipmentWriteOutcome::Applied(shipment.clone()))
    }

    async fn list_requests(&self, scope: ReadScope) -> StoreResult<Vec<SupplyRequest>> {
        let inner = self.guard()?;
        let mut out: Vec<SupplyRequest> = inner
            .requests
            .values()
            .filter(|r| match scope {
                ReadScope::All => true,
                ReadScope::Branch(branch_id) => r.branch_id == branch_id,
                ReadScope::Supplier(supplier_id) => {
                    r.status == RequestStatus::Approved
                        || inner
                            .orders
                            .values()
                            .any(|o| o.request_id == r.id && o.supplier_id == supplier_id)
                }
            })
            .cloned()
            .collect();
        out.sort_by_key(|r| std::cmp::Reverse(r.id));
        Ok(out)
    }

    async fn list_orders(&self, scope: ReadScope) -> StoreResult<Vec<Order>> {
        let inner = self.guard()?;
        let mut out: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| match scope {
                ReadScope::All => true,
                ReadScope::Supplier(supplier_id) => o.supplier_id == supplier_id,
                ReadScope::Branch(branch_id) => inner
                    .requests
                    .get(&o.request_id)
                    .is_some_and(|r| r.branch_id == branch_id),
            })
            .cloned()
            .collect();
        out.sort_by_key(|o| std::cmp::Reverse(o.id));
        Ok(out)
    }

    async fn list_shipments(&self, scope: ReadScope) -> StoreResult<Vec<Shipment>> {
        let inner = self.guard()?;
        let mut out: Vec<Shipment> = inner
            .shipments
            .values()
            .filter(|s| match scope {
                ReadScope::All => true,
                ReadScope::Supplier(supplier_id) => inner
                    .orders
                    .get(&s.order_id)
                    .is_some_and(|o| o.supplier_id == supplier_id),
                ReadScope::Branch(branch_id) => inner
                    .orders
                    .get(&s.order_id)
                    .and_then(|o| inner.requests.get(&o.request_id))
                    .is_some_and(|r| r.branch_id == branch_id),
            })
            .cloned()
            .collect();
        out.sort_by_key(|s| std::cmp::Reverse(s.id));
        Ok(out)
    }

    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        let inner = self.guard()?;
        let mut out: Vec<CatalogItem> = inner.items.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn item_exists(&self, item_id: i64) -> StoreResult<bool> {
        Ok(self.guard()?.items.contains_key(&item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn poisoned_lock_surfaces_as_backend_error() {
        let store = MemoryStore::new();
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.lock().unwrap();
            panic!("poison the store lock");
        })
        .join();

        assert!(matches!(
            store.read_request(1).await,
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn forced_duplicates_drain_then_creates_succeed() {
        let store = MemoryStore::new();
        store.fail_creates_with_duplicate(1);
        assert!(store.take_forced_duplicate());
        assert!(!store.take_forced_duplicate());
    }
}
