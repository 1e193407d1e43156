//! Saved addresses and the notification inbox.

use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::commerce::{Notification, SavedAddress, StoredNotification};
use crate::domain::errors::DomainError;
use crate::domain::order::DeliveryAddress;
use crate::domain::ports::{AddressResolver, NotificationSink};
use crate::domain::ListResult;
use crate::schema::{addresses, notifications};

use super::models::{AddressRow, NewAddressRow, NewNotificationRow, NotificationRow};
use super::page_window;

pub struct DieselAddressRepository {
    pool: DbPool,
}

impl DieselAddressRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl AddressResolver for DieselAddressRepository {
    fn resolve(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<DeliveryAddress>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = addresses::table
            .filter(addresses::id.eq(address_id))
            .filter(addresses::user_id.eq(user_id))
            .select(AddressRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(|r| r.address()))
    }

    fn create(
        &self,
        user_id: Uuid,
        address: DeliveryAddress,
        is_default: bool,
    ) -> Result<SavedAddress, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            if is_default {
                diesel::update(addresses::table.filter(addresses::user_id.eq(user_id)))
                    .set(addresses::is_default.eq(false))
                    .execute(conn)?;
            }
            let row = diesel::insert_into(addresses::table)
                .values(&NewAddressRow::new(user_id, address, is_default))
                .returning(AddressRow::as_returning())
                .get_result(conn)?;
            Ok(SavedAddress::from(row))
        })
    }

    fn list(&self, user_id: Uuid) -> Result<Vec<SavedAddress>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = addresses::table
            .filter(addresses::user_id.eq(user_id))
            .select(AddressRow::as_select())
            .order((addresses::is_default.desc(), addresses::created_at.desc()))
            .load(&mut conn)?;
        Ok(rows.into_iter().map(SavedAddress::from).collect())
    }
}

pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl NotificationSink for DieselNotificationRepository {
    fn notify(&self, user_id: Uuid, notification: Notification) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(notifications::table)
            .values(&NewNotificationRow {
                id: Uuid::new_v4(),
                user_id,
                kind: notification.kind.as_str().to_string(),
                title: notification.title,
                message: notification.message,
                data: notification.data,
            })
            .execute(&mut conn)?;
        Ok(())
    }

    fn list(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<StoredNotification>, DomainError> {
        let mut conn = self.pool.get()?;
        let (limit, offset) = page_window(page, limit);

        let total: i64 = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)?;
        let rows = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .select(NotificationRow::as_select())
            .order(notifications::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)?;

        Ok(ListResult {
            items: rows.into_iter().map(StoredNotification::from).collect(),
            total,
        })
    }

    fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::id.eq(id))
                .filter(notifications::user_id.eq(user_id)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;
        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::commerce::NotificationKind;
    use crate::infrastructure::test_db::setup_db;

    fn address(label: &str) -> DeliveryAddress {
        DeliveryAddress {
            label: label.to_string(),
            line1: "3 Anna Salai".to_string(),
            line2: Some("Flat 4B".to_string()),
            city: "Chennai".to_string(),
            region: "TN".to_string(),
            pincode: "600002".to_string(),
            lat: Some(13.06),
            lng: Some(80.27),
        }
    }

    #[tokio::test]
    async fn addresses_resolve_only_for_their_owner() {
        let (_container, pool) = setup_db().await;
        let repo = DieselAddressRepository::new(pool);
        let user = Uuid::new_v4();

        let saved = repo.create(user, address("home"), true).expect("create failed");
        repo.create(user, address("work"), true).expect("create failed");

        assert_eq!(
            repo.resolve(user, saved.id).expect("resolve failed"),
            Some(address("home"))
        );
        assert!(repo
            .resolve(Uuid::new_v4(), saved.id)
            .expect("resolve failed")
            .is_none());

        let listed = repo.list(user).expect("list failed");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].address.label, "work");
        assert!(!listed[1].is_default);
    }

    #[tokio::test]
    async fn notifications_are_listed_and_marked_read() {
        let (_container, pool) = setup_db().await;
        let repo = DieselNotificationRepository::new(pool);
        let user = Uuid::new_v4();

        repo.notify(
            user,
            Notification {
                kind: NotificationKind::Order,
                title: "New Order".to_string(),
                message: "You have a new order #a1b2c3".to_string(),
                data: json!({ "orderId": Uuid::nil() }),
            },
        )
        .expect("notify failed");

        let inbox = repo.list(user, 1, 20).expect("list failed");
        assert_eq!(inbox.total, 1);
        assert_eq!(inbox.items[0].kind, "order");
        assert!(!inbox.items[0].is_read);

        assert!(!repo.mark_read(Uuid::new_v4(), inbox.items[0].id).expect("update failed"));
        assert!(repo.mark_read(user, inbox.items[0].id).expect("update failed"));
    }
}
