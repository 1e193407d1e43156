use std::sync::Arc;

use uuid::Uuid;

use crate::domain::commerce::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::party::{can_place_retail_order, Actor};
use crate::domain::ports::CartRepository;
use crate::domain::product::Product;

use super::catalog::CatalogStore;

pub struct CartService {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<CatalogStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, catalog: Arc<CatalogStore>) -> Self {
        Self { carts, catalog }
    }

    pub fn get_cart(&self, actor: &Actor) -> Result<Vec<CartLine>, DomainError> {
        require_customer(actor)?;
        self.carts.get_cart(actor.id)
    }

    /// Adding a product already in the cart increases its quantity. The
    /// merged quantity may not exceed the product's current stock.
    pub fn add_item(
        &self,
        actor: &Actor,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<CartLine>, DomainError> {
        require_customer(actor)?;
        require_quantity(quantity)?;
        let product = self.catalog.get_product(product_id)?;
        let in_cart = self
            .carts
            .get_cart(actor.id)?
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity);
        ensure_in_stock(&product, in_cart + quantity)?;

        self.carts.add_item(
            actor.id,
            CartLine {
                product_id,
                quantity,
            },
        )
    }

    /// Sets the quantity of a line already in the cart.
    pub fn update_item(
        &self,
        actor: &Actor,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<CartLine>, DomainError> {
        require_customer(actor)?;
        require_quantity(quantity)?;
        let product = self.catalog.get_product(product_id)?;
        ensure_in_stock(&product, quantity)?;

        self.carts
            .set_quantity(
                actor.id,
                CartLine {
                    product_id,
                    quantity,
                },
            )?
            .ok_or_else(|| DomainError::not_found("Cart item not found"))
    }

    pub fn remove_item(&self, actor: &Actor, product_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        require_customer(actor)?;
        self.carts
            .remove_item(actor.id, product_id)?
            .ok_or_else(|| DomainError::not_found("Cart item not found"))
    }

    pub fn clear(&self, actor: &Actor) -> Result<(), DomainError> {
        require_customer(actor)?;
        self.carts.clear(actor.id)
    }
}

fn require_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::validation("quantity", "Quantity must be at least 1"));
    }
    Ok(())
}

fn ensure_in_stock(product: &Product, wanted: i32) -> Result<(), DomainError> {
    if product.quantity == 0 {
        return Err(DomainError::validation("productId", "Product is out of stock"));
    }
    if product.quantity < wanted {
        return Err(DomainError::validation(
            "quantity",
            format!(
                "Insufficient stock. Available: {}, Requested: {}",
                product.quantity, wanted
            ),
        ));
    }
    Ok(())
}

fn require_customer(actor: &Actor) -> Result<(), DomainError> {
    if can_place_retail_order(actor.role) {
        Ok(())
    } else {
        Err(DomainError::forbidden("Only customers have a cart"))
    }
}
