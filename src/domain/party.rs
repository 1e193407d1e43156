use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Retailer,
    Wholesaler,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Retailer => "retailer",
            Role::Wholesaler => "wholesaler",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "retailer" => Ok(Role::Retailer),
            "wholesaler" => Ok(Role::Wholesaler),
            other => Err(DomainError::validation(
                "role",
                format!("Role must be one of: customer, retailer, wholesaler (got '{other}')"),
            )),
        }
    }
}

pub fn can_manage_inventory(role: Role) -> bool {
    matches!(role, Role::Retailer | Role::Wholesaler)
}

pub fn can_place_retail_order(role: Role) -> bool {
    role == Role::Customer
}

pub fn can_place_wholesale_order(role: Role) -> bool {
    role == Role::Retailer
}

/// The party performing an operation. Passed explicitly into every
/// workflow call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn customer(id: Uuid) -> Self {
        Self::new(id, Role::Customer)
    }

    pub fn retailer(id: Uuid) -> Self {
        Self::new(id, Role::Retailer)
    }

    pub fn wholesaler(id: Uuid) -> Self {
        Self::new(id, Role::Wholesaler)
    }

    /// The catalog owner identity this actor would have, if any.
    pub fn as_owner(&self) -> Option<Owner> {
        match self.role {
            Role::Retailer => Some(Owner::Retailer(self.id)),
            Role::Wholesaler => Some(Owner::Wholesaler(self.id)),
            Role::Customer => None,
        }
    }

    pub fn require_inventory_manager(&self) -> Result<Owner, DomainError> {
        if !can_manage_inventory(self.role) {
            return Err(DomainError::forbidden(
                "Only retailers and wholesalers can manage inventory",
            ));
        }
        self.as_owner()
            .ok_or_else(|| DomainError::forbidden("Actor cannot own products"))
    }
}

/// Owning party of a product. Exactly one per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Owner {
    Retailer(Uuid),
    Wholesaler(Uuid),
}

impl Owner {
    pub fn id(&self) -> Uuid {
        match self {
            Owner::Retailer(id) | Owner::Wholesaler(id) => *id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Owner::Retailer(_) => Role::Retailer,
            Owner::Wholesaler(_) => Role::Wholesaler,
        }
    }

    pub fn from_parts(role: &str, id: Uuid) -> Result<Self, DomainError> {
        match role.parse::<Role>()? {
            Role::Retailer => Ok(Owner::Retailer(id)),
            Role::Wholesaler => Ok(Owner::Wholesaler(id)),
            Role::Customer => Err(DomainError::Internal(format!(
                "product owner {id} has customer role"
            ))),
        }
    }
}
