//! The workflow engine: every status transition for supply requests, orders
//! and shipments goes through here. Handlers never touch the store directly.
//!
//! Each command checks authorization first, then state-machine legality, then
//! applies the write conditionally on the status it read. A precondition that
//! fails at write time surfaces as `ConcurrentModification`; the engine never
//! retries a command on the caller's behalf.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::{
    Actor, CatalogItem, Order, OrderStatus, Priority, RequestItem, RequestStatus, Role, Shipment,
    ShipmentStatus, SupplyRequest,
};
use crate::store::{
    CreateOutcome, NewOrder, NewRequest, NewRequestItem, NewShipment, OrderShadow, RequestChange,
    ShipmentChange, ShipmentWriteOutcome, WorkflowStore, WriteOutcome,
};

use super::authz;
use super::error::WorkflowError;
use super::events::{EntityKind, TransitionEvent, TransitionListener};
use super::numbers;

const REQUEST: &str = "supply_request";
const ORDER: &str = "order";
const SHIPMENT: &str = "shipment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
    Modify,
}

impl Decision {
    fn note_prefix(&self) -> &'static str {
        match self {
            Decision::Approve => "APPROVE",
            Decision::Reject => "REJECT",
            Decision::Modify => "MODIFY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierResponse {
    Confirm,
    Modify,
    Deny,
}

impl SupplierResponse {
    fn note_prefix(&self) -> &'static str {
        match self {
            SupplierResponse::Confirm => "CONFIRM",
            SupplierResponse::Modify => "MODIFY",
            SupplierResponse::Deny => "DENY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestItemDraft {
    pub item_id: i64,
    pub quantity: i32,
    pub specifications: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub required_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub items: Vec<RequestItemDraft>,
}

/// Branch revision applied when resubmitting a `modified` request.
#[derive(Debug, Clone, Default)]
pub struct RequestRevision {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub required_date: Option<NaiveDate>,
    pub items: Option<Vec<RequestItemDraft>>,
}

#[derive(Debug, Clone, Default)]
pub struct ShipmentFields {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

pub struct WorkflowEngine<S> {
    store: S,
    listeners: Vec<Arc<dyn TransitionListener>>,
}

impl<S: WorkflowStore> WorkflowEngine<S> {
    pub fn new(store: S) -> Self {
        WorkflowEngine { store, listeners: Vec::new() }
    }

    pub fn with_listener(mut self, listener: Arc<dyn TransitionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    fn emit(
        &self,
        entity: EntityKind,
        entity_id: i64,
        from: Option<&'static str>,
        to: &'static str,
        actor: &Actor,
    ) {
        let event = TransitionEvent {
            entity,
            entity_id,
            from,
            to,
            actor_id: actor.user_id,
            actor_role: actor.role.as_str(),
            at: Utc::now(),
        };
        for listener in &self.listeners {
            listener.on_transition(&event);
        }
    }

    // ---- commands -------------------------------------------------------

    /// Create a new supply request in `pending` with its items.
    pub async fn submit_request(
        &self,
        actor: &Actor,
        draft: RequestDraft,
    ) -> Result<(SupplyRequest, Vec<RequestItem>), WorkflowError> {
        let branch_id = authz::submitting_branch(actor)?;

        if draft.title.trim().is_empty() {
            return Err(WorkflowError::validation("title must not be blank"));
        }
        let items = validate_items(&draft.items)?;
        for item in &items {
            if !self.store.item_exists(item.item_id).await? {
                return Err(WorkflowError::validation(format!(
                    "unknown catalog item {}",
                    item.item_id
                )));
            }
        }

        let requested_date = Utc::now().date_naive();
        if let Some(required) = draft.required_date {
            if required < requested_date {
                return Err(WorkflowError::validation(
                    "required_date must not be before requested_date",
                ));
            }
        }

        // The number suffix is clock-derived; a duplicate insert is detected
        // by the store and retried with a bumped suffix.
        for attempt in 0..numbers::MAX_ATTEMPTS {
            let request = NewRequest {
                request_number: numbers::candidate(numbers::REQUEST_PREFIX, Utc::now(), attempt),
                title: draft.title.clone(),
                description: draft.description.clone(),
                priority: draft.priority,
                branch_id,
                requested_by: actor.user_id,
                requested_date,
                required_date: draft.required_date,
                notes: draft.notes.clone(),
            };
            match self.store.create_request(request, items.clone()).await? {
                CreateOutcome::Created(created) => {
                    let created_items = self.store.read_request_items(created.id).await?;
                    self.emit(EntityKind::Request, created.id, None, "pending", actor);
                    return Ok((created, created_items));
                }
                CreateOutcome::DuplicateNumber => continue,
                CreateOutcome::PreconditionFailed | CreateOutcome::NotFound => {
                    return Err(WorkflowError::Storage(
                        "unexpected outcome creating request".into(),
                    ));
                }
            }
        }
        Err(WorkflowError::Storage(
            "could not allocate a unique request number".into(),
        ))
    }

    /// Admin decision on a `pending` request.
    pub async fn decide_request(
        &self,
        actor: &Actor,
        request_id: i64,
        decision: Decision,
        reason: Option<&str>,
    ) -> Result<SupplyRequest, WorkflowError> {
        authz::require_admin(actor)?;

        let request = self.read_request_or_404(request_id).await?;
        let (new_status, to) = match decision {
            Decision::Approve => (RequestStatus::Approved, "approved"),
            Decision::Reject => (RequestStatus::Rejected, "rejected"),
            Decision::Modify => (RequestStatus::Modified, "modified"),
        };
        if request.status != RequestStatus::Pending {
            return Err(WorkflowError::invalid_transition(
                REQUEST,
                request.status.as_str(),
                to,
            ));
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if matches!(decision, Decision::Reject | Decision::Modify) && reason.is_none() {
            return Err(WorkflowError::validation(format!(
                "a reason is required to {} a request",
                decision.note_prefix().to_lowercase()
            )));
        }

        let mut change = RequestChange {
            notes: reason.map(|r| append_note(request.notes.as_deref(), decision.note_prefix(), r)),
            ..RequestChange::default()
        };
        if decision == Decision::Approve {
            change.approved_by = Some(actor.user_id);
            change.approved_date = Some(Utc::now());
        }

        let updated = match self
            .store
            .write_request_transition(request_id, RequestStatus::Pending, new_status, change)
            .await?
        {
            WriteOutcome::Applied(updated) => updated,
            WriteOutcome::PreconditionFailed => {
                return Err(WorkflowError::ConcurrentModification { entity: REQUEST, id: request_id })
            }
            WriteOutcome::NotFound => {
                return Err(WorkflowError::NotFound { entity: REQUEST, id: request_id })
            }
        };
        self.emit(EntityKind::Request, request_id, Some("pending"), to, actor);
        Ok(updated)
    }

    /// Branch resubmission of a `modified` request: apply the revision and
    /// return the request to `pending` for a fresh decision.
    pub async fn resubmit_request(
        &self,
        actor: &Actor,
        request_id: i64,
        revision: RequestRevision,
    ) -> Result<SupplyRequest, WorkflowError> {
        let request = self.read_request_or_404(request_id).await?;
        authz::require_request_branch(actor, &request)?;

        if request.status != RequestStatus::Modified {
            return Err(WorkflowError::invalid_transition(
                REQUEST,
                request.status.as_str(),
                "pending",
            ));
        }
        if let Some(title) = &revision.title {
            if title.trim().is_empty() {
                return Err(WorkflowError::validation("title must not be blank"));
            }
        }
        if let Some(required) = revision.required_date {
            if required < request.requested_date {
                return Err(WorkflowError::validation(
                    "required_date must not be before requested_date",
                ));
            }
        }
        let items = match &revision.items {
            Some(drafts) => {
                let items = validate_items(drafts)?;
                for item in &items {
                    if !self.store.item_exists(item.item_id).await? {
                        return Err(WorkflowError::validation(format!(
                            "unknown catalog item {}",
                            item.item_id
                        )));
                    }
                }
                Some(items)
            }
            None => None,
        };

        let change = RequestChange {
            title: revision.title,
            description: revision.description,
            priority: revision.priority,
            required_date: revision.required_date,
            ..RequestChange::default()
        };
        let updated = match self.store.resubmit_request(request_id, change, items).await? {
            WriteOutcome::Applied(updated) => updated,
            WriteOutcome::PreconditionFailed => {
                return Err(WorkflowError::ConcurrentModification { entity: REQUEST, id: request_id })
            }
            WriteOutcome::NotFound => {
                return Err(WorkflowError::NotFound { entity: REQUEST, id: request_id })
            }
        };
        self.emit(EntityKind::Request, request_id, Some("modified"), "pending", actor);
        Ok(updated)
    }

    /// Supplier response to an `approved` request. `confirm` creates the
    /// order in the same store transaction as the status change, so a
    /// confirmed request always has exactly one order. A retried confirm
    /// returns the existing order instead of creating a second one.
    pub async fn supplier_respond(
        &self,
        actor: &Actor,
        request_id: i64,
        response: SupplierResponse,
        notes: Option<&str>,
    ) -> Result<(SupplyRequest, Option<Order>), WorkflowError> {
        let supplier_id = authz::acting_supplier(actor)?;
        let request = self.read_request_or_404(request_id).await?;
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        match response {
            SupplierResponse::Confirm => {
                if request.status == RequestStatus::Confirmed {
                    if let Some(order) = self.store.order_for_request(request_id).await? {
                        if order.supplier_id == supplier_id {
                            return Ok((request, Some(order)));
                        }
                    }
                }
                if request.status != RequestStatus::Approved {
                    return Err(WorkflowError::invalid_transition(
                        REQUEST,
                        request.status.as_str(),
                        "confirmed",
                    ));
                }
                let appended =
                    notes.map(|n| append_note(request.notes.as_deref(), "CONFIRM", n));
                let order = self
                    .confirm_with_order(actor, request_id, supplier_id, appended)
                    .await?;
                let request = self.read_request_or_404(request_id).await?;
                Ok((request, Some(order)))
            }
            SupplierResponse::Modify | SupplierResponse::Deny => {
                let (new_status, to) = match response {
                    SupplierResponse::Modify => (RequestStatus::Modified, "modified"),
                    _ => (RequestStatus::Denied, "denied"),
                };
                if request.status != RequestStatus::Approved {
                    return Err(WorkflowError::invalid_transition(
                        REQUEST,
                        request.status.as_str(),
                        to,
                    ));
                }
                let Some(reason) = notes else {
                    return Err(WorkflowError::validation(format!(
                        "a reason is required to {} a request",
                        response.note_prefix().to_lowercase()
                    )));
                };
                let change = RequestChange {
                    notes: Some(append_note(
                        request.notes.as_deref(),
                        response.note_prefix(),
                        reason,
                    )),
                    ..RequestChange::default()
                };
                let updated = match self
                    .store
                    .write_request_transition(request_id, RequestStatus::Approved, new_status, change)
                    .await?
                {
                    WriteOutcome::Applied(updated) => updated,
                    WriteOutcome::PreconditionFailed => {
                        return Err(WorkflowError::ConcurrentModification {
                            entity: REQUEST,
                            id: request_id,
                        })
                    }
                    WriteOutcome::NotFound => {
                        return Err(WorkflowError::NotFound { entity: REQUEST, id: request_id })
                    }
                };
                self.emit(EntityKind::Request, request_id, Some("approved"), to, actor);
                Ok((updated, None))
            }
        }
    }

    async fn confirm_with_order(
        &self,
        actor: &Actor,
        request_id: i64,
        supplier_id: i64,
        notes: Option<String>,
    ) -> Result<Order, WorkflowError> {
        for attempt in 0..numbers::MAX_ATTEMPTS {
            let order = NewOrder {
                order_number: numbers::candidate(numbers::ORDER_PREFIX, Utc::now(), attempt),
                request_id,
                supplier_id,
            };
            match self
                .store
                .confirm_request_and_create_order(request_id, notes.clone(), order)
                .await?
            {
                CreateOutcome::Created(order) => {
                    self.emit(EntityKind::Request, request_id, Some("approved"), "confirmed", actor);
                    self.emit(EntityKind::Order, order.id, None, "pending", actor);
                    return Ok(order);
                }
                CreateOutcome::DuplicateNumber => continue,
                CreateOutcome::PreconditionFailed => {
                    // Lost the race. If the winner was a duplicate confirm by
                    // the same supplier, treat it as a clean no-op.
                    if let Some(existing) = self.store.order_for_request(request_id).await? {
                        if existing.supplier_id == supplier_id {
                            return Ok(existing);
                        }
                    }
                    return Err(WorkflowError::ConcurrentModification {
                        entity: REQUEST,
                        id: request_id,
                    });
                }
                CreateOutcome::NotFound => {
                    return Err(WorkflowError::NotFound { entity: REQUEST, id: request_id })
                }
            }
        }
        Err(WorkflowError::Storage(
            "could not allocate a unique order number".into(),
        ))
    }

    /// Supplier confirms a pending order, which creates its shipment in
    /// `preparing` in the same store transaction. Idempotent under retry.
    pub async fn confirm_order(
        &self,
        actor: &Actor,
        order_id: i64,
    ) -> Result<(Order, Shipment), WorkflowError> {
        let order = self.read_order_or_404(order_id).await?;
        authz::require_supplier_identity(actor, order.supplier_id)?;

        if order.status == OrderStatus::Confirmed {
            if let Some(shipment) = self.store.shipment_for_order(order_id).await? {
                return Ok((order, shipment));
            }
        }
        if order.status != OrderStatus::Pending {
            return Err(WorkflowError::invalid_transition(
                ORDER,
                order.status.as_str(),
                "confirmed",
            ));
        }

        for attempt in 0..numbers::MAX_ATTEMPTS {
            let shipment = NewShipment {
                shipment_number: numbers::candidate(numbers::SHIPMENT_PREFIX, Utc::now(), attempt),
                order_id,
            };
            match self
                .store
                .confirm_order_and_create_shipment(order_id, shipment)
                .await?
            {
                CreateOutcome::Created(shipment) => {
                    self.emit(EntityKind::Order, order_id, Some("pending"), "confirmed", actor);
                    self.emit(EntityKind::Shipment, shipment.id, None, "preparing", actor);
                    let order = self.read_order_or_404(order_id).await?;
                    return Ok((order, shipment));
                }
                CreateOutcome::DuplicateNumber => continue,
                CreateOutcome::PreconditionFailed => {
                    if let Some(existing) = self.store.shipment_for_order(order_id).await? {
                        let order = self.read_order_or_404(order_id).await?;
                        if order.status == OrderStatus::Confirmed {
                            return Ok((order, existing));
                        }
                    }
                    return Err(WorkflowError::ConcurrentModification { entity: ORDER, id: order_id });
                }
                CreateOutcome::NotFound => {
                    return Err(WorkflowError::NotFound { entity: ORDER, id: order_id })
                }
            }
        }
        Err(WorkflowError::Storage(
            "could not allocate a unique shipment number".into(),
        ))
    }

    /// Supplier-side shipment progression. Forward-only; `cancelled` allowed
    /// from any non-terminal state. The owning order shadows the shipment.
    pub async fn advance_shipment(
        &self,
        actor: &Actor,
        shipment_id: i64,
        next: ShipmentStatus,
        fields: ShipmentFields,
    ) -> Result<Shipment, WorkflowError> {
        let shipment = self.read_shipment_or_404(shipment_id).await?;
        let order = self.read_order_or_404(shipment.order_id).await?;
        authz::require_supplier_identity(actor, order.supplier_id)?;

        self.apply_shipment_transition(actor, &shipment, &order, next, fields).await
    }

    /// Branch-side delivery confirmation: only the destination branch, only
    /// from `in_transit`.
    pub async fn confirm_delivery(
        &self,
        actor: &Actor,
        shipment_id: i64,
    ) -> Result<Shipment, WorkflowError> {
        let shipment = self.read_shipment_or_404(shipment_id).await?;
        let order = self.read_order_or_404(shipment.order_id).await?;
        let request = self.read_request_or_404(order.request_id).await?;
        authz::require_request_branch(actor, &request)?;

        if shipment.status != ShipmentStatus::InTransit {
            return Err(WorkflowError::invalid_transition(
                SHIPMENT,
                shipment.status.as_str(),
                "delivered",
            ));
        }
        self.apply_shipment_transition(
            actor,
            &shipment,
            &order,
            ShipmentStatus::Delivered,
            ShipmentFields::default(),
        )
        .await
    }

    async fn apply_shipment_transition(
        &self,
        actor: &Actor,
        shipment: &Shipment,
        order: &Order,
        next: ShipmentStatus,
        fields: ShipmentFields,
    ) -> Result<Shipment, WorkflowError> {
        if !shipment.status.can_advance_to(next) {
            return Err(WorkflowError::invalid_transition(
                SHIPMENT,
                shipment.status.as_str(),
                next.as_str(),
            ));
        }

        let now = Utc::now();
        let mut change = ShipmentChange {
            tracking_number: fields.tracking_number,
            carrier: fields.carrier,
            estimated_delivery: fields.estimated_delivery,
            notes: fields.notes,
            ..ShipmentChange::default()
        };
        if next == ShipmentStatus::Shipped && shipment.shipped_date.is_none() {
            change.shipped_date = Some(now);
        }
        if next == ShipmentStatus::Delivered {
            change.actual_delivery = Some(now);
        }

        // Order shadows the shipment. `in_transit` has no order counterpart.
        // The pair is one store transaction: both statuses move or neither.
        let shadow = match next {
            ShipmentStatus::Shipped => Some(OrderShadow {
                order_id: order.id,
                expected: OrderStatus::Confirmed,
                new_status: OrderStatus::Shipped,
            }),
            ShipmentStatus::Delivered => Some(OrderShadow {
                order_id: order.id,
                expected: OrderStatus::Shipped,
                new_status: OrderStatus::Delivered,
            }),
            ShipmentStatus::Cancelled if !order.status.is_terminal() => Some(OrderShadow {
                order_id: order.id,
                expected: order.status,
                new_status: OrderStatus::Cancelled,
            }),
            _ => None,
        };

        let from = shipment.status;
        let updated = match self
            .store
            .write_shipment_and_order_transition(shipment.id, from, next, change, shadow)
            .await?
        {
            ShipmentWriteOutcome::Applied(updated) => updated,
            ShipmentWriteOutcome::ShipmentPreconditionFailed => {
                return Err(WorkflowError::ConcurrentModification {
                    entity: SHIPMENT,
                    id: shipment.id,
                })
            }
            ShipmentWriteOutcome::ShipmentNotFound => {
                return Err(WorkflowError::NotFound { entity: SHIPMENT, id: shipment.id })
            }
            ShipmentWriteOutcome::OrderPreconditionFailed => {
                return Err(WorkflowError::ConcurrentModification { entity: ORDER, id: order.id })
            }
            ShipmentWriteOutcome::OrderNotFound => {
                return Err(WorkflowError::NotFound { entity: ORDER, id: order.id })
            }
        };
        self.emit(EntityKind::Shipment, shipment.id, Some(from.as_str()), next.as_str(), actor);
        if let Some(shadow) = shadow {
            self.emit(
                EntityKind::Order,
                shadow.order_id,
                Some(shadow.expected.as_str()),
                shadow.new_status.as_str(),
                actor,
            );
        }
        Ok(updated)
    }

    // ---- queries --------------------------------------------------------

    pub async fn list_requests(&self, actor: &Actor) -> Result<Vec<SupplyRequest>, WorkflowError> {
        Ok(self.store.list_requests(authz::read_scope(actor)).await?)
    }

    pub async fn get_request(
        &self,
        actor: &Actor,
        request_id: i64,
    ) -> Result<(SupplyRequest, Vec<RequestItem>), WorkflowError> {
        let request = self.read_request_or_404(request_id).await?;
        match actor.role {
            Role::Admin => {}
            Role::Branch { .. } => authz::require_request_branch(actor, &request)?,
            Role::Supplier { supplier_id } => {
                // Suppliers see requests awaiting their response, or ones
                // they hold the order for.
                let party = request.status == RequestStatus::Approved
                    || matches!(
                        self.store.order_for_request(request_id).await?,
                        Some(order) if order.supplier_id == supplier_id
                    );
                if !party {
                    return Err(WorkflowError::authorization(
                        "request is not visible to this supplier",
                    ));
                }
            }
        }
        let items = self.store.read_request_items(request_id).await?;
        Ok((request, items))
    }

    pub async fn list_orders(&self, actor: &Actor) -> Result<Vec<Order>, WorkflowError> {
        Ok(self.store.list_orders(authz::read_scope(actor)).await?)
    }

    pub async fn get_order(&self, actor: &Actor, order_id: i64) -> Result<Order, WorkflowError> {
        let order = self.read_order_or_404(order_id).await?;
        match actor.role {
            Role::Admin => {}
            Role::Supplier { .. } => {
                authz::require_supplier_identity(actor, order.supplier_id)?;
            }
            Role::Branch { .. } => {
                let request = self.read_request_or_404(order.request_id).await?;
                authz::require_request_branch(actor, &request)?;
            }
        }
        Ok(order)
    }

    pub async fn list_shipments(&self, actor: &Actor) -> Result<Vec<Shipment>, WorkflowError> {
        Ok(self.store.list_shipments(authz::read_scope(actor)).await?)
    }

    pub async fn get_shipment(
        &self,
        actor: &Actor,
        shipment_id: i64,
    ) -> Result<Shipment, WorkflowError> {
        let shipment = self.read_shipment_or_404(shipment_id).await?;
        match actor.role {
            Role::Admin => {}
            _ => {
                let order = self.read_order_or_404(shipment.order_id).await?;
                match actor.role {
                    Role::Supplier { .. } => {
                        authz::require_supplier_identity(actor, order.supplier_id)?
                    }
                    _ => {
                        let request = self.read_request_or_404(order.request_id).await?;
                        authz::require_request_branch(actor, &request)?;
                    }
                }
            }
        }
        Ok(shipment)
    }

    pub async fn list_items(&self) -> Result<Vec<CatalogItem>, WorkflowError> {
        Ok(self.store.list_items().await?)
    }

    // ---- helpers --------------------------------------------------------

    async fn read_request_or_404(&self, id: i64) -> Result<SupplyRequest, WorkflowError> {
        self.store
            .read_request(id)
            .await?
            .ok_or(WorkflowError::NotFound { entity: REQUEST, id })
    }

    async fn read_order_or_404(&self, id: i64) -> Result<Order, WorkflowError> {
        self.store
            .read_order(id)
            .await?
            .ok_or(WorkflowError::NotFound { entity: ORDER, id })
    }

    async fn read_shipment_or_404(&self, id: i64) -> Result<Shipment, WorkflowError> {
        self.store
            .read_shipment(id)
            .await?
            .ok_or(WorkflowError::NotFound { entity: SHIPMENT, id })
    }
}

fn validate_items(drafts: &[RequestItemDraft]) -> Result<Vec<NewRequestItem>, WorkflowError> {
    if drafts.is_empty() {
        return Err(WorkflowError::validation(
            "a request must have at least one item",
        ));
    }
    drafts
        .iter()
        .map(|d| {
            if d.item_id <= 0 {
                return Err(WorkflowError::validation(
                    "each item must reference a catalog item",
                ));
            }
            if d.quantity <= 0 {
                return Err(WorkflowError::validation(
                    "item quantity must be a positive integer",
                ));
            }
            Ok(NewRequestItem {
                item_id: d.item_id,
                quantity: d.quantity,
                specifications: d.specifications.clone(),
                notes: d.notes.clone(),
            })
        })
        .collect()
}

/// Append an `ACTION: reason` block to the notes log, never overwriting
/// earlier entries. Matches the established note format.
fn append_note(existing: Option<&str>, prefix: &str, reason: &str) -> String {
    match existing {
        Some(prior) if !prior.is_empty() => format!("{prior}\n\n{prefix}: {reason}"),
        _ => format!("{prefix}: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_append_never_overwrites() {
        let first = append_note(None, "REJECT", "insufficient budget");
        assert_eq!(first, "REJECT: insufficient budget");
        let second = append_note(Some(&first), "MODIFY", "halve the quantity");
        assert_eq!(
            second,
            "REJECT: insufficient budget\n\nMODIFY: halve the quantity"
        );
    }

    #[test]
    fn item_validation_rejects_bad_drafts() {
        assert!(validate_items(&[]).is_err());
        let zero_qty = vec![RequestItemDraft {
            item_id: 1,
            quantity: 0,
            specifications: None,
            notes: None,
        }];
        assert!(matches!(
            validate_items(&zero_qty),
            Err(WorkflowError::Validation(_))
        ));
        let no_item = vec![RequestItemDraft {
            item_id: 0,
            quantity: 2,
            specifications: None,
            notes: None,
        }];
        assert!(validate_items(&no_item).is_err());
    }
}
