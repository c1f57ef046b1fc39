use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        cart_item::{self, Entity as CartItemEntity},
        product::Entity as ProductEntity,
        product_variant::Entity as VariantEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveFromCartRequest {
    /// When absent, the whole cart is cleared
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
}

/// Shopping cart service: one row per (customer, product, variant)
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists the caller's cart with current catalog names and prices
    #[instrument(skip(self))]
    pub async fn get_cart(&self, customer_id: Uuid) -> Result<CartResponse, ServiceError> {
        let rows = CartItemEntity::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let line = match row.variant_id {
                Some(variant_id) => {
                    let variant = VariantEntity::find_by_id(variant_id)
                        .one(&*self.db)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Variant {} not found", variant_id))
                        })?;
                    CartLine {
                        product_id: row.product_id,
                        variant_id: row.variant_id,
                        name: variant.name,
                        sku: variant.sku,
                        unit_price: variant.price,
                        quantity: row.quantity,
                        line_total: variant.price * Decimal::from(row.quantity),
                        added_at: row.created_at,
                    }
                }
                None => {
                    let product = ProductEntity::find_by_id(row.product_id)
                        .one(&*self.db)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Product {} not found", row.product_id))
                        })?;
                    CartLine {
                        product_id: row.product_id,
                        variant_id: None,
                        name: product.name,
                        sku: product.sku,
                        unit_price: product.price,
                        quantity: row.quantity,
                        line_total: product.price * Decimal::from(row.quantity),
                        added_at: row.created_at,
                    }
                }
            };
            items.push(line);
        }

        let subtotal = items.iter().map(|line| line.line_total).sum();
        Ok(CartResponse { items, subtotal })
    }

    /// Adds an item, incrementing the quantity when the row already exists
    #[instrument(skip(self, request))]
    pub async fn add_item(
        &self,
        customer_id: Uuid,
        request: AddToCartRequest,
    ) -> Result<CartResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        // The referenced product (and variant, if any) must exist
        ProductEntity::find_by_id(request.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;
        if let Some(variant_id) = request.variant_id {
            VariantEntity::find_by_id(variant_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Variant {} not found", variant_id))
                })?;
        }

        let existing = CartItemEntity::find()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .filter(cart_item::Column::ProductId.eq(request.product_id))
            .filter(match request.variant_id {
                Some(variant_id) => cart_item::Column::VariantId.eq(variant_id),
                None => cart_item::Column::VariantId.is_null(),
            })
            .one(&*self.db)
            .await?;

        let now = Utc::now();
        match existing {
            Some(row) => {
                let quantity = row.quantity + request.quantity;
                let mut active: cart_item::ActiveModel = row.into();
                active.quantity = Set(quantity);
                active.updated_at = Set(Some(now));
                active.update(&*self.db).await?;
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    customer_id: Set(customer_id),
                    product_id: Set(request.product_id),
                    variant_id: Set(request.variant_id),
                    quantity: Set(request.quantity),
                    created_at: Set(now),
                    updated_at: Set(Some(now)),
                }
                .insert(&*self.db)
                .await?;
            }
        }

        info!(customer_id = %customer_id, product_id = %request.product_id, "cart item added");
        self.event_sender
            .send_or_log(Event::CartItemAdded {
                customer_id,
                product_id: request.product_id,
            })
            .await;

        self.get_cart(customer_id).await
    }

    /// Removes one row, or clears the cart when no product filter is given
    #[instrument(skip(self, request))]
    pub async fn remove_item(
        &self,
        customer_id: Uuid,
        request: RemoveFromCartRequest,
    ) -> Result<CartResponse, ServiceError> {
        match request.product_id {
            Some(product_id) => {
                CartItemEntity::delete_many()
                    .filter(cart_item::Column::CustomerId.eq(customer_id))
                    .filter(cart_item::Column::ProductId.eq(product_id))
                    .filter(match request.variant_id {
                        Some(variant_id) => cart_item::Column::VariantId.eq(variant_id),
                        None => cart_item::Column::VariantId.is_null(),
                    })
                    .exec(&*self.db)
                    .await?;
                self.event_sender
                    .send_or_log(Event::CartItemRemoved {
                        customer_id,
                        product_id,
                    })
                    .await;
            }
            None => {
                CartItemEntity::delete_many()
                    .filter(cart_item::Column::CustomerId.eq(customer_id))
                    .exec(&*self.db)
                    .await?;
                self.event_sender
                    .send_or_log(Event::CartCleared(customer_id))
                    .await;
            }
        }

        self.get_cart(customer_id).await
    }
}
