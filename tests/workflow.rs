//! End-to-end workflow tests over the in-memory store: the same engine
//! the HTTP layer drives, exercised directly.

use chrono::{Duration, Utc};

use supplyflow_backend::models::{
    Actor, OrderStatus, Priority, RequestStatus, ShipmentStatus,
};
use supplyflow_backend::store::MemoryStore;
use supplyflow_backend::workflow::{
    Decision, RequestDraft, RequestItemDraft, ShipmentFields, SupplierResponse, WorkflowEngine,
    WorkflowError,
};

fn engine() -> (WorkflowEngine<MemoryStore>, MemoryStore, i64) {
    let store = MemoryStore::new();
    let item_id = store.seed_item("Copier paper A4", "box");
    (WorkflowEngine::new(store.clone()), store, item_id)
}

fn draft(item_id: i64) -> RequestDraft {
    RequestDraft {
        title: "Quarterly stationery restock".to_string(),
        description: Some("Front office supplies".to_string()),
        priority: Priority::Medium,
        required_date: Some(Utc::now().date_naive() + Duration::days(14)),
        notes: None,
        items: vec![RequestItemDraft {
            item_id,
            quantity: 10,
            specifications: None,
            notes: None,
        }],
    }
}

const BRANCH: i64 = 11;
const OTHER_BRANCH: i64 = 12;
const SUPPLIER: i64 = 21;

fn admin() -> Actor {
    Actor::admin(1)
}
fn branch() -> Actor {
    Actor::branch(2, BRANCH)
}
fn supplier() -> Actor {
    Actor::supplier(3, SUPPLIER)
}

#[tokio::test]
async fn full_happy_path_through_delivery() {
    let (engine, _store, item_id) = engine();

    let (request, items) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.request_number.starts_with("REQ-"));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 10);

    let approved = engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approved_by, Some(1));
    assert!(approved.approved_date.is_some());

    let (confirmed, order) = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, RequestStatus::Confirmed);
    let order = order.expect("confirm creates an order");
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.supplier_id, SUPPLIER);

    let (order, shipment) = engine.confirm_order(&supplier(), order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(shipment.status, ShipmentStatus::Preparing);
    assert!(shipment.shipment_number.starts_with("SHP-"));

    let shipment = engine
        .advance_shipment(
            &supplier(),
            shipment.id,
            ShipmentStatus::Shipped,
            ShipmentFields {
                tracking_number: Some("TRK-001".to_string()),
                carrier: Some("DHL".to_string()),
                estimated_delivery: Some(Utc::now() + Duration::days(3)),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(shipment.status, ShipmentStatus::Shipped);
    assert!(shipment.shipped_date.is_some());
    assert!(shipment.estimated_delivery.is_some());
    assert_eq!(shipment.tracking_number.as_deref(), Some("TRK-001"));

    let shipment = engine
        .advance_shipment(
            &supplier(),
            shipment.id,
            ShipmentStatus::InTransit,
            ShipmentFields::default(),
        )
        .await
        .unwrap();
    assert_eq!(shipment.status, ShipmentStatus::InTransit);

    // The destination branch closes the loop.
    let delivered = engine.confirm_delivery(&branch(), shipment.id).await.unwrap();
    assert_eq!(delivered.status, ShipmentStatus::Delivered);
    assert!(delivered.actual_delivery.is_some());

    let order = engine.get_order(&admin(), order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn reject_appends_reason_and_closes_the_request() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();

    let rejected = engine
        .decide_request(&admin(), request.id, Decision::Reject, Some("insufficient budget"))
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert!(rejected
        .notes
        .as_deref()
        .unwrap()
        .contains("REJECT: insufficient budget"));

    // A supplier cannot respond to a rejected request.
    let err = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();

    for reason in [None, Some(""), Some("   ")] {
        let err = engine
            .decide_request(&admin(), request.id, Decision::Reject, reason)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)), "reason {reason:?}");
    }

    // Still pending, untouched.
    let (request, _) = engine.get_request(&admin(), request.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
}

#[tokio::test]
async fn modify_reopens_for_branch_resubmission() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();

    let modified = engine
        .decide_request(&admin(), request.id, Decision::Modify, Some("halve the quantity"))
        .await
        .unwrap();
    assert_eq!(modified.status, RequestStatus::Modified);
    assert!(modified.notes.as_deref().unwrap().contains("MODIFY: halve the quantity"));

    // Another branch cannot resubmit it.
    let err = engine
        .resubmit_request(&Actor::branch(9, OTHER_BRANCH), request.id, Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Authorization(_)));

    let reopened = engine
        .resubmit_request(&branch(), request.id, Default::default())
        .await
        .unwrap();
    assert_eq!(reopened.status, RequestStatus::Pending);
}

#[tokio::test]
async fn role_gates_hold() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();

    // Suppliers and branches cannot decide.
    for actor in [supplier(), branch()] {
        let err = engine
            .decide_request(&actor, request.id, Decision::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Authorization(_)));
    }

    // Admins and branches cannot respond as a supplier.
    engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();
    for actor in [admin(), branch()] {
        let err = engine
            .supplier_respond(&actor, request.id, SupplierResponse::Confirm, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Authorization(_)));
    }

    // Admins cannot submit requests.
    let err = engine.submit_request(&admin(), draft(item_id)).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Authorization(_)));
}

#[tokio::test]
async fn supplier_confirm_is_idempotent() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();
    engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();

    let (_, first) = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap();
    let (_, second) = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap();

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(engine.list_orders(&admin()).await.unwrap().len(), 1);

    // A different supplier replaying the confirm is not the order holder.
    let err = engine
        .supplier_respond(&Actor::supplier(8, 99), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition { .. } | WorkflowError::ConcurrentModification { .. }
    ));
}

#[tokio::test]
async fn concurrent_decisions_have_one_winner() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();

    let approver = admin();
    let rejecter = Actor::admin(4);
    let approve = engine.decide_request(&approver, request.id, Decision::Approve, None);
    let reject = engine.decide_request(
        &rejecter,
        request.id,
        Decision::Reject,
        Some("duplicate request"),
    );
    let (a, r) = tokio::join!(approve, reject);

    assert_ne!(a.is_ok(), r.is_ok(), "exactly one decision must win");
    let loser = if a.is_ok() { r.unwrap_err() } else { a.unwrap_err() };
    assert!(matches!(
        loser,
        WorkflowError::ConcurrentModification { .. } | WorkflowError::InvalidTransition { .. }
    ));
}

#[tokio::test]
async fn shipments_move_forward_only() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();
    engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();
    let (_, order) = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap();
    let (_, shipment) = engine
        .confirm_order(&supplier(), order.unwrap().id)
        .await
        .unwrap();

    // Cannot skip to in_transit or delivered from preparing.
    for next in [ShipmentStatus::InTransit, ShipmentStatus::Delivered] {
        let err = engine
            .advance_shipment(&supplier(), shipment.id, next, ShipmentFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    let shipment = engine
        .advance_shipment(
            &supplier(),
            shipment.id,
            ShipmentStatus::Shipped,
            ShipmentFields::default(),
        )
        .await
        .unwrap();

    // No going back.
    let err = engine
        .advance_shipment(
            &supplier(),
            shipment.id,
            ShipmentStatus::Preparing,
            ShipmentFields::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

    // The branch cannot confirm delivery before the goods are in transit.
    let err = engine.confirm_delivery(&branch(), shipment.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
}

#[tokio::test]
async fn delivery_confirmation_is_reserved_for_the_destination_branch() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();
    engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();
    let (_, order) = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap();
    let (_, shipment) = engine
        .confirm_order(&supplier(), order.unwrap().id)
        .await
        .unwrap();
    let shipment = engine
        .advance_shipment(&supplier(), shipment.id, ShipmentStatus::Shipped, ShipmentFields::default())
        .await
        .unwrap();
    let shipment = engine
        .advance_shipment(&supplier(), shipment.id, ShipmentStatus::InTransit, ShipmentFields::default())
        .await
        .unwrap();

    for actor in [supplier(), Actor::branch(9, OTHER_BRANCH)] {
        let err = engine.confirm_delivery(&actor, shipment.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Authorization(_)));
    }

    engine.confirm_delivery(&branch(), shipment.id).await.unwrap();
}

#[tokio::test]
async fn read_scopes_limit_visibility() {
    let (engine, _store, item_id) = engine();
    let (mine, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();
    let (theirs, _) = engine
        .submit_request(&Actor::branch(9, OTHER_BRANCH), draft(item_id))
        .await
        .unwrap();

    // Branch sees only its own requests.
    let visible = engine.list_requests(&branch()).await.unwrap();
    assert_eq!(visible.iter().map(|r| r.id).collect::<Vec<_>>(), vec![mine.id]);
    let err = engine.get_request(&branch(), theirs.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Authorization(_)));

    // Supplier sees nothing until something is approved.
    assert!(engine.list_requests(&supplier()).await.unwrap().is_empty());
    engine
        .decide_request(&admin(), mine.id, Decision::Approve, None)
        .await
        .unwrap();
    let visible = engine.list_requests(&supplier()).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, mine.id);

    // Admin sees everything.
    assert_eq!(engine.list_requests(&admin()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn validation_rejects_bad_drafts() {
    let (engine, _store, item_id) = engine();

    let mut no_items = draft(item_id);
    no_items.items.clear();
    let err = engine.submit_request(&branch(), no_items).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let mut blank_title = draft(item_id);
    blank_title.title = "   ".to_string();
    let err = engine.submit_request(&branch(), blank_title).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let mut zero_qty = draft(item_id);
    zero_qty.items[0].quantity = 0;
    let err = engine.submit_request(&branch(), zero_qty).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let mut unknown_item = draft(item_id);
    unknown_item.items[0].item_id = item_id + 1000;
    let err = engine.submit_request(&branch(), unknown_item).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let mut past_date = draft(item_id);
    past_date.required_date = Some(Utc::now().date_naive() - Duration::days(1));
    let err = engine.submit_request(&branch(), past_date).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
}

#[tokio::test]
async fn store_outage_surfaces_as_collaborator_unavailable() {
    let (engine, store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();

    store.set_unavailable(true);
    let err = engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::CollaboratorUnavailable(_)));

    // Back online, nothing was half-applied.
    store.set_unavailable(false);
    let approved = engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
}

#[tokio::test]
async fn deny_closes_and_modify_reopens_supplier_side() {
    let (engine, _store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();
    engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();

    // Supplier modify sends the request back to the branch.
    let (modified, order) = engine
        .supplier_respond(
            &supplier(),
            request.id,
            SupplierResponse::Modify,
            Some("lead time is 6 weeks"),
        )
        .await
        .unwrap();
    assert_eq!(modified.status, RequestStatus::Modified);
    assert!(order.is_none());
    assert!(modified.notes.as_deref().unwrap().contains("MODIFY: lead time is 6 weeks"));

    // Branch resubmits, admin re-approves, supplier denies for good.
    engine
        .resubmit_request(&branch(), request.id, Default::default())
        .await
        .unwrap();
    engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();
    let (denied, order) = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Deny, Some("out of stock"))
        .await
        .unwrap();
    assert_eq!(denied.status, RequestStatus::Denied);
    assert!(order.is_none());

    // Deny without a reason is rejected up front.
    let err = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Deny, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(_) | WorkflowError::InvalidTransition { .. }
    ));
}

#[tokio::test]
async fn shipment_and_order_move_together_or_not_at_all() {
    let (engine, store, item_id) = engine();
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();
    engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();
    let (_, order) = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap();
    let order_id = order.unwrap().id;
    let (_, shipment) = engine.confirm_order(&supplier(), order_id).await.unwrap();
    let shipment = engine
        .advance_shipment(&supplier(), shipment.id, ShipmentStatus::Shipped, ShipmentFields::default())
        .await
        .unwrap();
    let shipment = engine
        .advance_shipment(&supplier(), shipment.id, ShipmentStatus::InTransit, ShipmentFields::default())
        .await
        .unwrap();

    // A concurrent writer knocks the order off `shipped` before the branch
    // confirms delivery.
    store.force_order_status(order_id, OrderStatus::Confirmed);
    let err = engine.confirm_delivery(&branch(), shipment.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::ConcurrentModification { .. }));

    // Neither entity moved: the shipment is still in transit, not stranded
    // at delivered with a stale order.
    let shipment = engine.get_shipment(&admin(), shipment.id).await.unwrap();
    assert_eq!(shipment.status, ShipmentStatus::InTransit);
    assert_eq!(
        engine.get_order(&admin(), order_id).await.unwrap().status,
        OrderStatus::Confirmed
    );

    // Once the order is back in step, the same call succeeds.
    store.force_order_status(order_id, OrderStatus::Shipped);
    let delivered = engine.confirm_delivery(&branch(), shipment.id).await.unwrap();
    assert_eq!(delivered.status, ShipmentStatus::Delivered);
    assert_eq!(
        engine.get_order(&admin(), order_id).await.unwrap().status,
        OrderStatus::Delivered
    );
}

#[tokio::test]
async fn duplicate_numbers_are_retried_until_a_fresh_one_lands() {
    let (engine, store, item_id) = engine();

    // Two collisions in a row: the submit still succeeds on a later attempt.
    store.fail_creates_with_duplicate(2);
    let (request, _) = engine.submit_request(&branch(), draft(item_id)).await.unwrap();
    assert!(request.request_number.starts_with("REQ-"));

    engine
        .decide_request(&admin(), request.id, Decision::Approve, None)
        .await
        .unwrap();

    // Same for the order created by the supplier's confirm; exactly one
    // order exists afterwards.
    store.fail_creates_with_duplicate(1);
    let (confirmed, order) = engine
        .supplier_respond(&supplier(), request.id, SupplierResponse::Confirm, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, RequestStatus::Confirmed);
    assert!(order.unwrap().order_number.starts_with("ORD-"));
    assert_eq!(engine.list_orders(&admin()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn number_allocation_gives_up_after_bounded_attempts() {
    let (engine, store, item_id) = engine();

    store.fail_creates_with_duplicate(supplyflow_backend::workflow::numbers::MAX_ATTEMPTS);
    let err = engine.submit_request(&branch(), draft(item_id)).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Storage(_)));

    // Nothing was created by the failed attempts.
    assert!(engine.list_requests(&admin()).await.unwrap().is_empty());

    // The next submit allocates cleanly.
    engine.submit_request(&branch(), draft(item_id)).await.unwrap();
}
