use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::commerce::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::schema::cart_items;

use super::models::{CartItemRow, NewCartItemRow};

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_cart(conn: &mut PgConnection, customer_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
    let rows = cart_items::table
        .filter(cart_items::customer_id.eq(customer_id))
        .select(CartItemRow::as_select())
        .order(cart_items::created_at.asc())
        .load(conn)?;
    Ok(rows.into_iter().map(CartLine::from).collect())
}

impl CartRepository for DieselCartRepository {
    fn get_cart(&self, customer_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;
        load_cart(&mut conn, customer_id)
    }

    fn add_item(&self, customer_id: Uuid, line: CartLine) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(cart_items::table)
                .values(&NewCartItemRow {
                    id: Uuid::new_v4(),
                    customer_id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .on_conflict((cart_items::customer_id, cart_items::product_id))
                .do_update()
                .set((
                    cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)),
                    cart_items::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            load_cart(conn, customer_id)
        })
    }

    fn set_quantity(
        &self,
        customer_id: Uuid,
        line: CartLine,
    ) -> Result<Option<Vec<CartLine>>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated = diesel::update(
                cart_items::table
                    .filter(cart_items::customer_id.eq(customer_id))
                    .filter(cart_items::product_id.eq(line.product_id)),
            )
            .set((
                cart_items::quantity.eq(line.quantity),
                cart_items::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
            if updated == 0 {
                return Ok(None);
            }
            load_cart(conn, customer_id).map(Some)
        })
    }

    fn remove_item(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Vec<CartLine>>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let deleted = diesel::delete(
                cart_items::table
                    .filter(cart_items::customer_id.eq(customer_id))
                    .filter(cart_items::product_id.eq(product_id)),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Ok(None);
            }
            load_cart(conn, customer_id).map(Some)
        })
    }

    fn clear(&self, customer_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(cart_items::table.filter(cart_items::customer_id.eq(customer_id)))
            .execute(&mut conn)?;
        Ok(())
    }
}
