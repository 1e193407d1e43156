use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderStatus, StatusChange};
use crate::domain::party::{Owner, Role};
use crate::domain::ports::OrderRepository;
use crate::domain::ListResult;
use crate::schema::{order_lines, order_tracking, orders};

use super::models::{
    NewOrderLineRow, NewOrderRow, NewTrackingRow, OrderLineRow, OrderRow, OrderStatusChangeset,
    TrackingRow,
};
use super::page_window;

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn page(
        &self,
        filtered: impl Fn() -> orders::BoxedQuery<'static, Pg>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        let (limit, offset) = page_window(page, limit);

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered().count().get_result(conn)?;
            let rows = filtered()
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: assemble(conn, rows)?,
                total,
            })
        })
    }
}

/// Loads lines and tracking for every row and builds the aggregates,
/// preserving row order.
fn assemble(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    let lines = OrderLineRow::belonging_to(&rows)
        .select(OrderLineRow::as_select())
        .order(order_lines::position.asc())
        .load(conn)?
        .grouped_by(&rows);
    let tracking = TrackingRow::belonging_to(&rows)
        .select(TrackingRow::as_select())
        .order(order_tracking::id.asc())
        .load(conn)?
        .grouped_by(&rows);

    rows.into_iter()
        .zip(lines)
        .zip(tracking)
        .map(|((row, lines), tracking)| row.into_domain(lines, tracking))
        .collect()
}

fn load_order(conn: &mut PgConnection, id: Uuid) -> Result<Option<Order>, DomainError> {
    let row = orders::table
        .find(id)
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };
    Ok(assemble(conn, vec![row])?.pop())
}

fn with_status(
    query: orders::BoxedQuery<'static, Pg>,
    status: Option<OrderStatus>,
) -> orders::BoxedQuery<'static, Pg> {
    match status {
        Some(status) => query.filter(orders::status.eq(status.as_str())),
        None => query,
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order
            let order_id = Uuid::new_v4();
            let (retailer_id, wholesaler_id) = match order.counterparty {
                Owner::Retailer(id) => (Some(id), None),
                Owner::Wholesaler(id) => (None, Some(id)),
            };
            let delivery_address = order
                .delivery_address
                .as_ref()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|e| DomainError::Internal(e.to_string()))?;
            diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    buyer_id: order.buyer_id,
                    buyer_role: order.buyer_role.as_str().to_string(),
                    kind: order.kind.as_str().to_string(),
                    retailer_id,
                    wholesaler_id,
                    total_amount: order.total_amount.clone(),
                    discount_amount: order.discount_amount.clone(),
                    final_amount: order.final_amount.clone(),
                    payment_method: order.payment_method.as_str().to_string(),
                    payment_status: order.payment_status.as_str().to_string(),
                    coupon_code: order.coupon_code.clone(),
                    delivery_address,
                    scheduled_delivery_date: order.scheduled_delivery_date,
                    delivery_instructions: order.delivery_instructions.clone(),
                    status: OrderStatus::Placed.as_str().to_string(),
                })
                .execute(conn)?;

            // 2. Insert the frozen line snapshots
            let new_lines: Vec<NewOrderLineRow> = order
                .lines
                .iter()
                .enumerate()
                .map(|(position, l)| NewOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id,
                    position: position as i32,
                    product_id: l.product_id,
                    product_name: l.product_name.clone(),
                    product_image: l.product_image.clone(),
                    weight: l.weight.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price.clone(),
                })
                .collect();
            diesel::insert_into(order_lines::table)
                .values(&new_lines)
                .execute(conn)?;

            // 3. Initial tracking entry in the same transaction.
            diesel::insert_into(order_tracking::table)
                .values(&NewTrackingRow {
                    order_id,
                    status: OrderStatus::Placed.as_str().to_string(),
                    message: order.initial_message.clone(),
                    previous_status: None,
                    changed_by: None,
                })
                .execute(conn)?;

            load_order(conn, order_id)?.ok_or_else(|| {
                DomainError::Internal(format!("order {order_id} missing after insert"))
            })
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;
        load_order(&mut conn, id)
    }

    fn list_by_buyer(
        &self,
        buyer_id: Uuid,
        buyer_role: Role,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Order>, DomainError> {
        self.page(
            || {
                with_status(
                    orders::table
                        .filter(orders::buyer_id.eq(buyer_id))
                        .filter(orders::buyer_role.eq(buyer_role.as_str()))
                        .into_boxed(),
                    status,
                )
            },
            page,
            limit,
        )
    }

    fn list_by_counterparty(
        &self,
        counterparty: Owner,
        status: Option<OrderStatus>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Order>, DomainError> {
        self.page(
            || {
                let base = match counterparty {
                    Owner::Retailer(id) => orders::table.filter(orders::retailer_id.eq(id)).into_boxed(),
                    Owner::Wholesaler(id) => {
                        orders::table.filter(orders::wholesaler_id.eq(id)).into_boxed()
                    }
                };
                with_status(base, status)
            },
            page,
            limit,
        )
    }

    fn apply_status_change(&self, change: StatusChange) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Guarded on the status the caller validated against.
            let updated = diesel::update(
                orders::table
                    .filter(orders::id.eq(change.order_id))
                    .filter(orders::status.eq(change.from.as_str())),
            )
            .set(&OrderStatusChangeset {
                status: change.to.as_str().to_string(),
                tracking_number: change.tracking_number.clone(),
                delivered_at: change.delivered_at,
                updated_at: Utc::now(),
            })
            .execute(conn)?;
            if updated == 0 {
                return Ok(None);
            }

            diesel::insert_into(order_tracking::table)
                .values(&NewTrackingRow {
                    order_id: change.order_id,
                    status: change.to.as_str().to_string(),
                    message: change.message.clone(),
                    previous_status: Some(change.from.as_str().to_string()),
                    changed_by: Some(change.changed_by),
                })
                .execute(conn)?;

            load_order(conn, change.order_id)
        })
    }
}
