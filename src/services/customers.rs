use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{
        customer::{self, Entity as CustomerEntity, Model as CustomerModel},
        order::{self, Entity as OrderEntity, OrderStatus},
        CustomerRole,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: CustomerRole,
    pub is_active: bool,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<CustomerModel> for CustomerSummary {
    fn from(model: CustomerModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_customers: u64,
    pub total_orders: u64,
    pub revenue: Decimal,
    pub orders_by_status: Vec<StatusCount>,
}

#[derive(FromQueryResult)]
struct RevenueRow {
    revenue: Option<Decimal>,
}

/// Customer accounts plus the admin-facing reporting reads
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<CustomerModel>, ServiceError> {
        Ok(CustomerEntity::find()
            .filter(customer::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }

    /// Creates an account; the password arrives pre-hashed
    #[instrument(skip(self, password_hash))]
    pub async fn register(
        &self,
        email: String,
        name: String,
        password_hash: String,
    ) -> Result<CustomerModel, ServiceError> {
        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "An account with email {} already exists",
                email
            )));
        }

        let now = Utc::now();
        let created = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            name: Set(name),
            password_hash: Set(password_hash),
            role: Set(CustomerRole::Customer),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        info!(customer_id = %created.id, "customer registered");
        self.event_sender
            .send_or_log(Event::CustomerRegistered(created.id))
            .await;

        Ok(created)
    }

    /// Admin listing, newest first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<CustomerListResponse, ServiceError> {
        let paginator = CustomerEntity::find()
            .order_by_desc(customer::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(CustomerListResponse {
            customers: customers.into_iter().map(CustomerSummary::from).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Renders every customer as CSV for the admin export download
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<String, ServiceError> {
        let customers = CustomerEntity::find()
            .order_by_asc(customer::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["id", "email", "name", "role", "active", "created_at"])
            .map_err(|e| ServiceError::InternalError(format!("csv header: {}", e)))?;

        for c in customers {
            let role = match c.role {
                CustomerRole::Admin => "admin",
                CustomerRole::Customer => "customer",
            };
            writer
                .write_record([
                    c.id.to_string(),
                    c.email,
                    c.name,
                    role.to_string(),
                    c.is_active.to_string(),
                    c.created_at.to_rfc3339(),
                ])
                .map_err(|e| ServiceError::InternalError(format!("csv row: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ServiceError::InternalError(format!("csv flush: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ServiceError::InternalError(format!("csv encoding: {}", e)))
    }

    /// Aggregate counts and revenue for the admin dashboard
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardSummary, ServiceError> {
        let total_customers = CustomerEntity::find().count(&*self.db).await?;
        let total_orders = OrderEntity::find().count(&*self.db).await?;

        let mut orders_by_status = Vec::new();
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::PaymentFailed,
        ] {
            let count = OrderEntity::find()
                .filter(order::Column::Status.eq(status))
                .count(&*self.db)
                .await?;
            if count > 0 {
                orders_by_status.push(StatusCount { status, count });
            }
        }

        // Revenue counts orders whose payment was confirmed or that have
        // progressed past confirmation
        let revenue_row = OrderEntity::find()
            .select_only()
            .column_as(order::Column::TotalAmount.sum(), "revenue")
            .filter(order::Column::Status.is_in([
                OrderStatus::Confirmed,
                OrderStatus::Processing,
                OrderStatus::Shipped,
                OrderStatus::OutForDelivery,
                OrderStatus::Delivered,
            ]))
            .into_model::<RevenueRow>()
            .one(&*self.db)
            .await?;

        Ok(DashboardSummary {
            total_customers,
            total_orders,
            revenue: revenue_row.and_then(|r| r.revenue).unwrap_or(Decimal::ZERO),
            orders_by_status,
        })
    }
}
