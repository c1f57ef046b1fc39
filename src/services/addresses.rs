//! Address book service.
//!
//! The list read is cache-aside with a per-customer key; every mutation
//! deletes exactly that key. There is no broader invalidation, so other
//! cached views may serve stale data until their TTL runs out.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::AppCache,
    entities::{
        customer_address::{self, Entity as AddressEntity, Model as AddressModel},
        CustomerAddressModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, max = 120, message = "Recipient name is required"))]
    pub recipient_name: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Address line 1 is required"))]
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 20, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 2, message = "Country code must be 2 letters"))]
    pub country_code: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateAddressRequest {
    pub recipient_name: Option<String>,
    pub phone: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressListResponse {
    pub addresses: Vec<CustomerAddressModel>,
    pub from_cache: bool,
}

/// Address CRUD with a per-customer cache on the list read
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    cache: AppCache,
    cache_ttl: Duration,
}

impl AddressService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        cache: AppCache,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            db,
            event_sender,
            cache,
            cache_ttl,
        }
    }

    fn cache_key(&self, customer_id: Uuid) -> String {
        self.cache
            .key(&["addresses", &customer_id.to_string()])
    }

    #[instrument(skip(self))]
    pub async fn list(&self, customer_id: Uuid) -> Result<AddressListResponse, ServiceError> {
        let key = self.cache_key(customer_id);

        if let Some(cached) = self.cache.get_json::<Vec<AddressModel>>(&key).await {
            return Ok(AddressListResponse {
                addresses: cached,
                from_cache: true,
            });
        }

        let addresses = AddressEntity::find()
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .order_by_desc(customer_address::Column::IsDefault)
            .order_by_desc(customer_address::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        self.cache.put_json(&key, &addresses, self.cache_ttl).await;

        Ok(AddressListResponse {
            addresses,
            from_cache: false,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        customer_id: Uuid,
        request: CreateAddressRequest,
    ) -> Result<AddressModel, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let now = Utc::now();
        let address = customer_address::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            recipient_name: Set(request.recipient_name),
            phone: Set(request.phone),
            address_line_1: Set(request.address_line_1),
            address_line_2: Set(request.address_line_2),
            city: Set(request.city),
            state: Set(request.state),
            postal_code: Set(request.postal_code),
            country_code: Set(request.country_code.to_ascii_uppercase()),
            is_default: Set(request.is_default),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        self.cache.invalidate(&self.cache_key(customer_id)).await;
        self.event_sender
            .send_or_log(Event::AddressChanged {
                customer_id,
                address_id: address.id,
            })
            .await;

        info!(address_id = %address.id, "address created");
        Ok(address)
    }

    #[instrument(skip(self, request), fields(address_id = %address_id))]
    pub async fn update(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
        request: UpdateAddressRequest,
    ) -> Result<AddressModel, ServiceError> {
        let address = AddressEntity::find_by_id(address_id)
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))?;

        let mut active: customer_address::ActiveModel = address.into();
        if let Some(recipient_name) = request.recipient_name {
            active.recipient_name = Set(recipient_name);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(line1) = request.address_line_1 {
            active.address_line_1 = Set(line1);
        }
        if let Some(line2) = request.address_line_2 {
            active.address_line_2 = Set(Some(line2));
        }
        if let Some(city) = request.city {
            active.city = Set(city);
        }
        if let Some(state) = request.state {
            active.state = Set(state);
        }
        if let Some(postal_code) = request.postal_code {
            active.postal_code = Set(postal_code);
        }
        if let Some(country_code) = request.country_code {
            active.country_code = Set(country_code.to_ascii_uppercase());
        }
        if let Some(is_default) = request.is_default {
            active.is_default = Set(is_default);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;

        self.cache.invalidate(&self.cache_key(customer_id)).await;
        self.event_sender
            .send_or_log(Event::AddressChanged {
                customer_id,
                address_id,
            })
            .await;

        Ok(updated)
    }

    #[instrument(skip(self), fields(address_id = %address_id))]
    pub async fn delete(&self, customer_id: Uuid, address_id: Uuid) -> Result<(), ServiceError> {
        let address = AddressEntity::find_by_id(address_id)
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))?;

        let active: customer_address::ActiveModel = address.into();
        active.delete(&*self.db).await?;

        self.cache.invalidate(&self.cache_key(customer_id)).await;
        self.event_sender
            .send_or_log(Event::AddressChanged {
                customer_id,
                address_id,
            })
            .await;

        info!(address_id = %address_id, "address deleted");
        Ok(())
    }
}
