use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::party::Owner;
use crate::domain::ports::{ProductRepository, StockRepository};
use crate::domain::product::{NewProduct, Product, ProductPatch, StockOperation};
use crate::domain::ListResult;
use crate::schema::products;

use super::models::{NewProductRow, ProductChangeset, ProductRow};
use super::page_window;

diesel::define_sql_function!(fn greatest(a: Integer, b: Integer) -> Integer);

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, DomainError> {
    rows.into_iter().map(Product::try_from).collect()
}

fn to_product(row: Option<ProductRow>) -> Result<Option<Product>, DomainError> {
    row.map(Product::try_from).transpose()
}

fn owned_by(owner: Owner) -> products::BoxedQuery<'static, Pg> {
    products::table
        .filter(products::owner_role.eq(owner.role().as_str()))
        .filter(products::owner_id.eq(owner.id()))
        .into_boxed()
}

fn active_in(category: Option<String>) -> products::BoxedQuery<'static, Pg> {
    let mut query = products::table
        .filter(products::is_active.eq(true))
        .into_boxed();
    if let Some(category) = category {
        query = query.filter(products::category.eq(category));
    }
    query
}

impl ProductRepository for DieselProductRepository {
    fn find_active(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .filter(products::id.eq_any(ids))
            .filter(products::is_active.eq(true))
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        to_products(rows)
    }

    fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .filter(products::id.eq_any(ids))
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        to_products(rows)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        to_product(row)
    }

    fn find_proxy(
        &self,
        retailer_id: Uuid,
        source_product_id: Uuid,
    ) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = owned_by(Owner::Retailer(retailer_id))
            .filter(products::source_product_id.eq(source_product_id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        to_product(row)
    }

    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow::from(product))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Product::try_from(row)
    }

    fn insert_proxy(&self, product: NewProduct) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        // Loses silently against uq_products_proxy.
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow::from(product))
            .on_conflict_do_nothing()
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        to_product(row)
    }

    fn update_details(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let changes = ProductChangeset {
            name: patch.name,
            description: patch.description,
            price: patch.price,
            category: patch.category,
            images: patch.images.map(serde_json::Value::from),
            weight: patch.weight,
            updated_at: Some(Utc::now()),
        };
        let row = diesel::update(products::table.find(id))
            .set(&changes)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        to_product(row)
    }

    fn deactivate(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set((
                products::is_active.eq(false),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        to_product(row)
    }

    fn list_active(
        &self,
        category: Option<String>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let (limit, offset) = page_window(page, limit);

        let total: i64 = active_in(category.clone()).count().get_result(&mut conn)?;
        let rows = active_in(category)
            .select(ProductRow::as_select())
            .order(products::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)?;

        Ok(ListResult {
            items: to_products(rows)?,
            total,
        })
    }

    fn list_by_owner(
        &self,
        owner: Owner,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let (limit, offset) = page_window(page, limit);

        let total: i64 = owned_by(owner).count().get_result(&mut conn)?;
        let rows = owned_by(owner)
            .select(ProductRow::as_select())
            .order(products::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)?;

        Ok(ListResult {
            items: to_products(rows)?,
            total,
        })
    }
}

impl StockRepository for DieselProductRepository {
    fn decrement_if_available(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        // Both SET expressions see the pre-update row.
        let row = diesel::update(
            products::table
                .filter(products::id.eq(id))
                .filter(products::quantity.ge(quantity)),
        )
        .set((
            products::quantity.eq(products::quantity - quantity),
            products::is_active.eq(products::is_active.and(products::quantity.ne(quantity))),
            products::updated_at.eq(Utc::now()),
        ))
        .returning(ProductRow::as_returning())
        .get_result(&mut conn)
        .optional()?;
        to_product(row)
    }

    fn increment(&self, id: Uuid, quantity: i32) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set((
                products::quantity.eq(products::quantity + quantity),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        to_product(row)
    }

    fn withdraw(&self, id: Uuid, quantity: i32) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set((
                products::quantity.eq(greatest(products::quantity - quantity, 0)),
                products::is_active.eq(products::is_active.and(products::quantity.gt(quantity))),
                products::updated_at.eq(Utc::now()),
            ))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        to_product(row)
    }

    fn adjust(
        &self,
        id: Uuid,
        operation: StockOperation,
        quantity: i32,
    ) -> Result<Option<Product>, DomainError> {
        operation.apply(0, quantity)?;
        let mut conn = self.pool.get()?;
        let target = products::table.find(id);
        let now = Utc::now();

        let row = match operation {
            StockOperation::Add => diesel::update(target)
                .set((
                    products::quantity.eq(products::quantity + quantity),
                    products::is_active.eq((products::quantity + quantity).gt(0)),
                    products::updated_at.eq(now),
                ))
                .returning(ProductRow::as_returning())
                .get_result(&mut conn)
                .optional()?,
            StockOperation::Subtract => diesel::update(target)
                .set((
                    products::quantity.eq(greatest(products::quantity - quantity, 0)),
                    products::is_active.eq(products::quantity.gt(quantity)),
                    products::updated_at.eq(now),
                ))
                .returning(ProductRow::as_returning())
                .get_result(&mut conn)
                .optional()?,
            StockOperation::Set => diesel::update(target)
                .set((
                    products::quantity.eq(quantity),
                    products::is_active.eq(quantity > 0),
                    products::updated_at.eq(now),
                ))
                .returning(ProductRow::as_returning())
                .get_result(&mut conn)
                .optional()?,
        };
        to_product(row)
    }
}
