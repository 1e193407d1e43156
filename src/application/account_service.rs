use std::sync::Arc;

use uuid::Uuid;

use crate::domain::commerce::{validate_address, SavedAddress, StoredNotification};
use crate::domain::errors::DomainError;
use crate::domain::order::DeliveryAddress;
use crate::domain::party::Actor;
use crate::domain::ports::{AddressResolver, NotificationSink};
use crate::domain::ListResult;

/// Per-user records: saved delivery addresses and the notification inbox.
pub struct AccountService {
    addresses: Arc<dyn AddressResolver>,
    notifications: Arc<dyn NotificationSink>,
}

impl AccountService {
    pub fn new(addresses: Arc<dyn AddressResolver>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self {
            addresses,
            notifications,
        }
    }

    pub fn add_address(
        &self,
        actor: &Actor,
        address: DeliveryAddress,
        is_default: bool,
    ) -> Result<SavedAddress, DomainError> {
        validate_address(&address)?;
        self.addresses.create(actor.id, address, is_default)
    }

    pub fn list_addresses(&self, actor: &Actor) -> Result<Vec<SavedAddress>, DomainError> {
        self.addresses.list(actor.id)
    }

    pub fn list_notifications(
        &self,
        actor: &Actor,
        page: i64,
        limit: i64,
    ) -> Result<ListResult<StoredNotification>, DomainError> {
        self.notifications.list(actor.id, page, limit)
    }

    pub fn mark_read(&self, actor: &Actor, notification_id: Uuid) -> Result<(), DomainError> {
        if self.notifications.mark_read(actor.id, notification_id)? {
            Ok(())
        } else {
            Err(DomainError::not_found("Notification not found"))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::testing::MemoryStore;
    use crate::domain::commerce::{Notification, NotificationKind};

    fn service(store: &Arc<MemoryStore>) -> AccountService {
        AccountService::new(store.clone(), store.clone())
    }

    fn address(label: &str) -> DeliveryAddress {
        DeliveryAddress {
            label: label.to_string(),
            line1: "21 Park Street".to_string(),
            line2: None,
            city: "Kolkata".to_string(),
            region: "WB".to_string(),
            pincode: "700016".to_string(),
            lat: None,
            lng: None,
        }
    }

    #[test]
    fn new_default_address_replaces_old_default() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let actor = Actor::customer(Uuid::new_v4());

        svc.add_address(&actor, address("home"), true).unwrap();
        svc.add_address(&actor, address("work"), true).unwrap();

        let saved = svc.list_addresses(&actor).unwrap();
        let defaults: Vec<&str> = saved
            .iter()
            .filter(|a| a.is_default)
            .map(|a| a.address.label.as_str())
            .collect();
        assert_eq!(defaults, vec!["work"]);
    }

    #[test]
    fn incomplete_address_is_rejected() {
        let store = MemoryStore::new();
        let mut incomplete = address("home");
        incomplete.pincode = String::new();
        let err = service(&store)
            .add_address(&Actor::customer(Uuid::new_v4()), incomplete, false)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "pincode"));
    }

    #[test]
    fn only_the_recipient_can_mark_read() {
        let store = MemoryStore::new();
        let owner = Actor::retailer(Uuid::new_v4());
        store
            .notify(
                owner.id,
                Notification {
                    kind: NotificationKind::Order,
                    title: "New Order".to_string(),
                    message: "You have a new order".to_string(),
                    data: json!({}),
                },
            )
            .unwrap();
        let svc = service(&store);
        let id = svc.list_notifications(&owner, 1, 20).unwrap().items[0].id;

        assert!(matches!(
            svc.mark_read(&Actor::retailer(Uuid::new_v4()), id),
            Err(DomainError::NotFound(_))
        ));
        svc.mark_read(&owner, id).unwrap();
        assert!(svc.list_notifications(&owner, 1, 20).unwrap().items[0].is_read);
    }
}
