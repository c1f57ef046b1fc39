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

use crate::{
    entities::{
        product::Entity as ProductEntity,
        wishlist_item::{self, Entity as WishlistItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct WishlistMutationRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistEntry {
    pub product_id: Uuid,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Wishlist service
#[derive(Clone)]
pub struct WishlistService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl WishlistService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, customer_id: Uuid) -> Result<Vec<WishlistEntry>, ServiceError> {
        let rows = WishlistItemEntity::find()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .order_by_desc(wishlist_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let product = ProductEntity::find_by_id(row.product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", row.product_id))
                })?;
            entries.push(WishlistEntry {
                product_id: product.id,
                name: product.name,
                sku: product.sku,
                price: product.price,
                image_url: product.image_url,
                added_at: row.created_at,
            });
        }

        Ok(entries)
    }

    /// Adds a product; adding an already-listed product is a no-op
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<WishlistEntry>, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let existing = WishlistItemEntity::find()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;

        if existing.is_none() {
            wishlist_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                customer_id: Set(customer_id),
                product_id: Set(product_id),
                created_at: Set(Utc::now()),
            }
            .insert(&*self.db)
            .await?;

            info!(customer_id = %customer_id, product_id = %product_id, "wishlist item added");
            self.event_sender
                .send_or_log(Event::WishlistItemAdded {
                    customer_id,
                    product_id,
                })
                .await;
        }

        self.list(customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<WishlistEntry>, ServiceError> {
        WishlistItemEntity::delete_many()
            .filter(wishlist_item::Column::CustomerId.eq(customer_id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::WishlistItemRemoved {
                customer_id,
                product_id,
            })
            .await;

        self.list(customer_id).await
    }
}
