//! sqlx/Postgres implementation of the store contract.
//!
//! Conditional transition writes are `UPDATE ... WHERE id = $1 AND status = $2`;
//! zero rows affected is disambiguated into `PreconditionFailed` vs `NotFound`
//! with a follow-up existence check. Generated-number uniqueness rides on the
//! unique indexes over the number columns (error 23505).

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;

use crate::models::{
    CatalogItem, Order, OrderStatus, Priority, RequestItem, RequestStatus, Shipment,
    ShipmentStatus, SupplyRequest,
};

use super::{
    CreateOutcome, NewOrder, NewRequest, NewRequestItem, NewShipment, OrderShadow, ReadScope,
    RequestChange, ShipmentChange, ShipmentWriteOutcome, StoreError, StoreResult, WorkflowStore,
    WriteOutcome,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn map_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

fn parse<T: FromStr<Err = String>>(raw: String) -> StoreResult<T> {
    raw.parse().map_err(StoreError::Backend)
}

#[derive(FromRow)]
struct RequestRow {
    id: i64,
    request_number: String,
    title: String,
    description: Option<String>,
    priority: String,
    status: String,
    branch_id: i64,
    requested_by: i64,
    requested_date: NaiveDate,
    required_date: Option<NaiveDate>,
    approved_by: Option<i64>,
    approved_date: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl RequestRow {
    fn into_model(self) -> StoreResult<SupplyRequest> {
        Ok(SupplyRequest {
            id: self.id,
            request_number: self.request_number,
            title: self.title,
            description: self.description,
            priority: parse::<Priority>(self.priority)?,
            status: parse::<RequestStatus>(self.status)?,
            branch_id: self.branch_id,
            requested_by: self.requested_by,
            requested_date: self.requested_date,
            required_date: self.required_date,
            approved_by: self.approved_by,
            approved_date: self.approved_date,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct RequestItemRow {
    id: i64,
    request_id: i64,
    item_id: i64,
    quantity: i32,
    specifications: Option<String>,
    notes: Option<String>,
}

impl RequestItemRow {
    fn into_model(self) -> RequestItem {
        RequestItem {
            id: self.id,
            request_id: self.request_id,
            item_id: self.item_id,
            quantity: self.quantity,
            specifications: self.specifications,
            notes: self.notes,
        }
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    request_id: i64,
    supplier_id: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_model(self) -> StoreResult<Order> {
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            request_id: self.request_id,
            supplier_id: self.supplier_id,
            status: parse::<OrderStatus>(self.status)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ShipmentRow {
    id: i64,
    shipment_number: String,
    order_id: i64,
    status: String,
    tracking_number: Option<String>,
    carrier: Option<String>,
    shipped_date: Option<DateTime<Utc>>,
    estimated_delivery: Option<DateTime<Utc>>,
    actual_delivery: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl ShipmentRow {
    fn into_model(self) -> StoreResult<Shipment> {
        Ok(Shipment {
            id: self.id,
            shipment_number: self.shipment_number,
            order_id: self.order_id,
            status: parse::<ShipmentStatus>(self.status)?,
            tracking_number: self.tracking_number,
            carrier: self.carrier,
            shipped_date: self.shipped_date,
            estimated_delivery: self.estimated_delivery,
            actual_delivery: self.actual_delivery,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    unit: String,
    description: Option<String>,
}

const REQUEST_COLUMNS: &str = "id, request_number, title, description, priority, status, \
     branch_id, requested_by, requested_date, required_date, approved_by, approved_date, \
     notes, created_at";

const ORDER_COLUMNS: &str = "id, order_number, request_id, supplier_id, status, created_at";

const SHIPMENT_COLUMNS: &str = "id, shipment_number, order_id, status, tracking_number, \
     carrier, shipped_date, estimated_delivery, actual_delivery, notes, created_at";

impl PgStore {
    async fn request_exists(&self, id: i64) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM supply_requests WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn order_exists(&self, id: i64) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn shipment_exists(&self, id: i64) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM shipments WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn request_write_miss(&self, id: i64) -> StoreResult<WriteOutcome<SupplyRequest>> {
        Ok(if self.request_exists(id).await? {
            WriteOutcome::PreconditionFailed
        } else {
            WriteOutcome::NotFound
        })
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn read_request(&self, id: i64) -> StoreResult<Option<SupplyRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM supply_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(RequestRow::into_model).transpose()
    }

    async fn read_request_items(&self, request_id: i64) -> StoreResult<Vec<RequestItem>> {
        let rows = sqlx::query_as::<_, RequestItemRow>(
            "SELECT id, request_id, item_id, quantity, specifications, notes
             FROM request_items WHERE request_id = $1 ORDER BY id",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(RequestItemRow::into_model).collect())
    }

    async fn create_request(
        &self,
        request: NewRequest,
        items: Vec<NewRequestItem>,
    ) -> StoreResult<CreateOutcome<SupplyRequest>> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let inserted = sqlx::query_as::<_, RequestRow>(&format!(
            "INSERT INTO supply_requests
                (request_number, title, description, priority, status, branch_id,
                 requested_by, requested_date, required_date, notes)
             VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $9)
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(&request.request_number)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.priority.as_str())
        .bind(request.branch_id)
        .bind(request.requested_by)
        .bind(request.requested_date)
        .bind(request.required_date)
        .bind(&request.notes)
        .fetch_one(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => return Ok(CreateOutcome::DuplicateNumber),
            Err(e) => return Err(map_err(e)),
        };

        for item in &items {
            sqlx::query(
                "INSERT INTO request_items (request_id, item_id, quantity, specifications, notes)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(inserted.id)
            .bind(item.item_id)
            .bind(item.quantity)
            .bind(&item.specifications)
            .bind(&item.notes)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        tx.commit().await.map_err(map_err)?;
        Ok(CreateOutcome::Created(inserted.into_model()?))
    }

    async fn write_request_transition(
        &self,
        id: i64,
        expected: RequestStatus,
        new_status: RequestStatus,
        change: RequestChange,
    ) -> StoreResult<WriteOutcome<SupplyRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "UPDATE supply_requests SET
                status = $3,
                notes = COALESCE($4, notes),
                approved_by = COALESCE($5, approved_by),
                approved_date = COALESCE($6, approved_date),
                title = COALESCE($7, title),
                description = COALESCE($8, description),
                priority = COALESCE($9, priority),
                required_date = COALESCE($10, required_date)
             WHERE id = $1 AND status = $2
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(new_status.as_str())
        .bind(&change.notes)
        .bind(change.approved_by)
        .bind(change.approved_date)
        .bind(&change.title)
        .bind(&change.description)
        .bind(change.priority.map(|p| p.as_str()))
        .bind(change.required_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        match row {
            Some(row) => Ok(WriteOutcome::Applied(row.into_model()?)),
            None => self.request_write_miss(id).await,
        }
    }

    async fn resubmit_request(
        &self,
        id: i64,
        change: RequestChange,
        items: Option<Vec<NewRequestItem>>,
    ) -> StoreResult<WriteOutcome<SupplyRequest>> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "UPDATE supply_requests SET
                status = 'pending',
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                priority = COALESCE($4, priority),
                required_date = COALESCE($5, required_date)
             WHERE id = $1 AND status = 'modified'
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(id)
        .bind(&change.title)
        .bind(&change.description)
        .bind(change.priority.map(|p| p.as_str()))
        .bind(change.required_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;

        let Some(row) = row else {
            drop(tx);
            return self.request_write_miss(id).await;
        };

        if let Some(items) = items {
            sqlx::query("DELETE FROM request_items WHERE request_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;
            for item in &items {
                sqlx::query(
                    "INSERT INTO request_items (request_id, item_id, quantity, specifications, notes)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(id)
                .bind(item.item_id)
                .bind(item.quantity)
                .bind(&item.specifications)
                .bind(&item.notes)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;
            }
        }

        tx.commit().await.map_err(map_err)?;
        Ok(WriteOutcome::Applied(row.into_model()?))
    }

    async fn confirm_request_and_create_order(
        &self,
        request_id: i64,
        notes: Option<String>,
        order: NewOrder,
    ) -> StoreResult<CreateOutcome<Order>> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let updated = sqlx::query(
            "UPDATE supply_requests SET status = 'confirmed', notes = COALESCE($2, notes)
             WHERE id = $1 AND status = 'approved'",
        )
        .bind(request_id)
        .bind(&notes)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        if updated.rows_affected() == 0 {
            drop(tx);
            let exists = self.request_exists(request_id).await?;
            return Ok(if exists {
                CreateOutcome::PreconditionFailed
            } else {
                CreateOutcome::NotFound
            });
        }

        let inserted = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (order_number, request_id, supplier_id, status)
             VALUES ($1, $2, $3, 'pending')
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(&order.order_number)
        .bind(order.request_id)
        .bind(order.supplier_id)
        .fetch_one(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(row) => row,
            // Dropping the transaction rolls the status change back.
            Err(e) if is_unique_violation(&e) => return Ok(CreateOutcome::DuplicateNumber),
            Err(e) => return Err(map_err(e)),
        };

        tx.commit().await.map_err(map_err)?;
        Ok(CreateOutcome::Created(inserted.into_model()?))
    }

    async fn read_order(&self, id: i64) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(OrderRow::into_model).transpose()
    }

    async fn order_for_request(&self, request_id: i64) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE request_id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(OrderRow::into_model).transpose()
    }

    async fn confirm_order_and_create_shipment(
        &self,
        order_id: i64,
        shipment: NewShipment,
    ) -> StoreResult<CreateOutcome<Shipment>> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let updated = sqlx::query(
            "UPDATE orders SET status = 'confirmed' WHERE id = $1 AND status = 'pending'",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        if updated.rows_affected() == 0 {
            drop(tx);
            return Ok(if self.order_exists(order_id).await? {
                CreateOutcome::PreconditionFailed
            } else {
                CreateOutcome::NotFound
            });
        }

        let inserted = sqlx::query_as::<_, ShipmentRow>(&format!(
            "INSERT INTO shipments (shipment_number, order_id, status)
             VALUES ($1, $2, 'preparing')
             RETURNING {SHIPMENT_COLUMNS}"
        ))
        .bind(&shipment.shipment_number)
        .bind(shipment.order_id)
        .fetch_one(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => return Ok(CreateOutcome::DuplicateNumber),
            Err(e) => return Err(map_err(e)),
        };

        tx.commit().await.map_err(map_err)?;
        Ok(CreateOutcome::Created(inserted.into_model()?))
    }

    async fn read_shipment(&self, id: i64) -> StoreResult<Option<Shipment>> {
        let row = sqlx::query_as::<_, ShipmentRow>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(ShipmentRow::into_model).transpose()
    }

    async fn shipment_for_order(&self, order_id: i64) -> StoreResult<Option<Shipment>> {
        let row = sqlx::query_as::<_, ShipmentRow>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        row.map(ShipmentRow::into_model).transpose()
    }

    async fn write_shipment_and_order_transition(
        &self,
        id: i64,
        expected: ShipmentStatus,
        new_status: ShipmentStatus,
        change: ShipmentChange,
        shadow: Option<OrderShadow>,
    ) -> StoreResult<ShipmentWriteOutcome> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let row = sqlx::query_as::<_, ShipmentRow>(&format!(
            "UPDATE shipments SET
                status = $3,
                tracking_number = COALESCE($4, tracking_number),
                carrier = COALESCE($5, carrier),
                notes = COALESCE($6, notes),
                shipped_date = COALESCE($7, shipped_date),
                estimated_delivery = COALESCE($8, estimated_delivery),
                actual_delivery = COALESCE($9, actual_delivery)
             WHERE id = $1 AND status = $2
             RETURNING {SHIPMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(new_status.as_str())
        .bind(&change.tracking_number)
        .bind(&change.carrier)
        .bind(&change.notes)
        .bind(change.shipped_date)
        .bind(change.estimated_delivery)
        .bind(change.actual_delivery)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;

        let Some(row) = row else {
            drop(tx);
            return Ok(if self.shipment_exists(id).await? {
                ShipmentWriteOutcome::ShipmentPreconditionFailed
            } else {
                ShipmentWriteOutcome::ShipmentNotFound
            });
        };

        if let Some(shadow) = shadow {
            let updated =
                sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
                    .bind(shadow.order_id)
                    .bind(shadow.expected.as_str())
                    .bind(shadow.new_status.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(map_err)?;
            if updated.rows_affected() == 0 {
                // Dropping the transaction rolls the shipment write back.
                drop(tx);
                return Ok(if self.order_exists(shadow.order_id).await? {
                    ShipmentWriteOutcome::OrderPreconditionFailed
                } else {
                    ShipmentWriteOutcome::OrderNotFound
                });
            }
        }

        tx.commit().await.map_err(map_err)?;
        Ok(ShipmentWriteOutcome::Applied(row.into_model()?))
    }

    async fn list_requests(&self, scope: ReadScope) -> StoreResult<Vec<SupplyRequest>> {
        let rows = match scope {
            ReadScope::All => {
                sqlx::query_as::<_, RequestRow>(&format!(
                    "SELECT {REQUEST_COLUMNS} FROM supply_requests ORDER BY id DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
            ReadScope::Branch(branch_id) => {
                sqlx::query_as::<_, RequestRow>(&format!(
                    "SELECT {REQUEST_COLUMNS} FROM supply_requests
                     WHERE branch_id = $1 ORDER BY id DESC"
                ))
                .bind(branch_id)
                .fetch_all(&self.pool)
                .await
            }
            ReadScope::Supplier(supplier_id) => {
                sqlx::query_as::<_, RequestRow>(&format!(
                    "SELECT {REQUEST_COLUMNS} FROM supply_requests r
                     WHERE r.status = 'approved'
                        OR EXISTS (SELECT 1 FROM orders o
                                   WHERE o.request_id = r.id AND o.supplier_id = $1)
                     ORDER BY r.id DESC"
                ))
                .bind(supplier_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_err)?;
        rows.into_iter().map(RequestRow::into_model).collect()
    }

    async fn list_orders(&self, scope: ReadScope) -> StoreResult<Vec<Order>> {
        let rows = match scope {
            ReadScope::All => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
            ReadScope::Supplier(supplier_id) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE supplier_id = $1 ORDER BY id DESC"
                ))
                .bind(supplier_id)
                .fetch_all(&self.pool)
                .await
            }
            ReadScope::Branch(branch_id) => {
                sqlx::query_as::<_, OrderRow>(
                    "SELECT o.id, o.order_number, o.request_id, o.supplier_id, o.status, o.created_at
                     FROM orders o
                     JOIN supply_requests r ON r.id = o.request_id
                     WHERE r.branch_id = $1 ORDER BY o.id DESC",
                )
                .bind(branch_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_err)?;
        rows.into_iter().map(OrderRow::into_model).collect()
    }

    async fn list_shipments(&self, scope: ReadScope) -> StoreResult<Vec<Shipment>> {
        let select = "s.id, s.shipment_number, s.order_id, s.status, s.tracking_number, \
             s.carrier, s.shipped_date, s.estimated_delivery, s.actual_delivery, s.notes, \
             s.created_at";
        let rows = match scope {
            ReadScope::All => {
                sqlx::query_as::<_, ShipmentRow>(&format!(
                    "SELECT {select} FROM shipments s ORDER BY s.id DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
            ReadScope::Supplier(supplier_id) => {
                sqlx::query_as::<_, ShipmentRow>(&format!(
                    "SELECT {select} FROM shipments s
                     JOIN orders o ON o.id = s.order_id
                     WHERE o.supplier_id = $1 ORDER BY s.id DESC"
                ))
                .bind(supplier_id)
                .fetch_all(&self.pool)
                .await
            }
            ReadScope::Branch(branch_id) => {
                sqlx::query_as::<_, ShipmentRow>(&format!(
                    "SELECT {select} FROM shipments s
                     JOIN orders o ON o.id = s.order_id
                     JOIN supply_requests r ON r.id = o.request_id
                     WHERE r.branch_id = $1 ORDER BY s.id DESC"
                ))
                .bind(branch_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_err)?;
        rows.into_iter().map(ShipmentRow::into_model).collect()
    }

    async fn list_items(&self) -> StoreResult<Vec<CatalogItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, name, unit, description FROM items ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows
            .into_iter()
            .map(|r| CatalogItem {
                id: r.id,
                name: r.name,
                unit: r.unit,
                description: r.description,
            })
            .collect())
    }

    async fn item_exists(&self, item_id: i64) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM items WHERE id = $1)")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)
    }
}
