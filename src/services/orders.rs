use crate::{
    entities::{
        cart_item,
        customer_address,
        order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus},
        order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
        product::{self, Entity as ProductEntity},
        product_variant::{self, Entity as ProductVariantEntity},
        CustomerAddress,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One requested order line. `price` is the unit price the client
/// submitted; see [`order_total_from_submitted_prices`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLineInput>,
    pub address_id: Uuid,
    #[validate(length(min = 1, max = 50, message = "Payment method is required"))]
    pub payment_method: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub price: Decimal,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: i32,
    pub customer_id: Uuid,
    pub address_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// The order total is computed from the prices the client submitted,
/// not re-priced from the catalog. That trust is deliberate for parity
/// with the checkout flow this API serves; keeping the computation in
/// one named function keeps the fix a one-liner if that ever changes.
pub fn order_total_from_submitted_prices(items: &[OrderLineInput]) -> Decimal {
    items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum()
}

fn generate_order_number() -> i32 {
    // Five digits, derived from the clock; uniqueness is enforced by the
    // column constraint and the window is wide enough for this volume.
    (Utc::now().timestamp_millis() % 90_000 + 10_000) as i32
}

/// Service for creating and querying orders
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_currency: String,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_currency,
        }
    }

    /// Creates an order as one atomic unit: address and stock checks,
    /// order + item inserts, stock decrement, cart clear. Any failure
    /// rolls the whole thing back.
    #[instrument(skip(self, request), fields(customer_id = %customer_id))]
    pub async fn create_order(
        &self,
        customer_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        // Shipping address must exist and belong to the caller
        CustomerAddress::find_by_id(request.address_id)
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Address {} not found", request.address_id))
            })?;

        // Existence and stock validation, first failing item aborts
        for item in &request.items {
            self.check_line_availability(&txn, item).await?;
        }

        let total_amount = order_total_from_submitted_prices(&request.items);
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            customer_id: Set(customer_id),
            address_id: Set(request.address_id),
            status: Set(OrderStatus::Pending),
            total_amount: Set(total_amount),
            currency: Set(self.default_currency.clone()),
            payment_method: Set(request.payment_method.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        let mut item_models = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let inserted = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                variant_id: Set(item.variant_id),
                quantity: Set(item.quantity),
                price: Set(item.price),
                status: Set(OrderStatus::Pending),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            }
            .insert(&txn)
            .await?;
            item_models.push(inserted);
        }

        // Conditional decrement re-checks stock at write time, so two
        // concurrent checkouts cannot both take the last unit
        for item in &request.items {
            self.decrement_stock(&txn, item).await?;
        }

        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CustomerId.eq(customer_id))
            .exec(&txn)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, total = %total_amount, "Order created");
        self.event_sender.send_or_log(Event::OrderCreated(order_id)).await;

        Ok(Self::to_response(order_model, item_models))
    }

    async fn check_line_availability<C: ConnectionTrait>(
        &self,
        conn: &C,
        item: &OrderLineInput,
    ) -> Result<(), ServiceError> {
        if item.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "Quantity for product {} must be at least 1",
                item.product_id
            )));
        }
        if let Some(variant_id) = item.variant_id {
            let variant = ProductVariantEntity::find_by_id(variant_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product variant {} not found", variant_id))
                })?;
            if variant.product_id != item.product_id {
                return Err(ServiceError::ValidationError(format!(
                    "Variant {} does not belong to product {}",
                    variant_id, item.product_id
                )));
            }
            if variant.stock < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "variant {} has {} left, {} requested",
                    variant.sku, variant.stock, item.quantity
                )));
            }
        } else {
            let product = ProductEntity::find_by_id(item.product_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;
            if product.stock < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "product {} has {} left, {} requested",
                    product.sku, product.stock, item.quantity
                )));
            }
        }
        Ok(())
    }

    async fn decrement_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        item: &OrderLineInput,
    ) -> Result<(), ServiceError> {
        let affected = if let Some(variant_id) = item.variant_id {
            ProductVariantEntity::update_many()
                .col_expr(
                    product_variant::Column::Stock,
                    Expr::col(product_variant::Column::Stock).sub(item.quantity),
                )
                .filter(product_variant::Column::Id.eq(variant_id))
                .filter(product_variant::Column::Stock.gte(item.quantity))
                .exec(conn)
                .await?
                .rows_affected
        } else {
            ProductEntity::update_many()
                .col_expr(
                    product::Column::Stock,
                    Expr::col(product::Column::Stock).sub(item.quantity),
                )
                .filter(product::Column::Id.eq(item.product_id))
                .filter(product::Column::Stock.gte(item.quantity))
                .exec(conn)
                .await?
                .rows_affected
        };

        if affected == 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "stock changed while placing the order for product {}",
                item.product_id
            )));
        }
        Ok(())
    }

    /// Fetches one of the caller's orders, items included
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order_for_customer(
        &self,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderResponse, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;

        Ok(Self::to_response(order, items))
    }

    /// Lists the caller's orders, newest first, without item expansion
    #[instrument(skip(self))]
    pub async fn list_orders_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let orders = OrderEntity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(orders
            .into_iter()
            .map(|order| Self::to_response(order, Vec::new()))
            .collect())
    }

    /// Admin listing: paginated, optional status filter, newest first
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<OrderStatus>,
    ) -> Result<OrderListResponse, ServiceError> {
        let mut query = OrderEntity::find();
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(OrderListResponse {
            orders: orders
                .into_iter()
                .map(|order| Self::to_response(order, Vec::new()))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Looks up one of the caller's orders by its five-digit code
    #[instrument(skip(self))]
    pub async fn find_by_order_number(
        &self,
        customer_id: Uuid,
        order_number: i32,
    ) -> Result<Option<OrderResponse>, ServiceError> {
        let order = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .filter(order::Column::CustomerId.eq(customer_id))
            .one(&*self.db)
            .await?;

        Ok(order.map(|order| Self::to_response(order, Vec::new())))
    }

    fn to_response(order: OrderModel, items: Vec<OrderItemModel>) -> OrderResponse {
        OrderResponse {
            id: order.id,
            order_number: order.order_number,
            customer_id: order.customer_id,
            address_id: order.address_id,
            status: order.status,
            total_amount: order.total_amount,
            currency: order.currency,
            payment_method: order.payment_method,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    variant_id: item.variant_id,
                    quantity: item.quantity,
                    price: item.price,
                    status: item.status,
                })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i32, price: Decimal) -> OrderLineInput {
        OrderLineInput {
            product_id: Uuid::new_v4(),
            variant_id: None,
            quantity,
            price,
        }
    }

    #[test]
    fn total_is_sum_of_submitted_price_times_quantity() {
        let items = vec![line(2, dec!(19.99)), line(1, dec!(5.00)), line(3, dec!(0.50))];
        assert_eq!(order_total_from_submitted_prices(&items), dec!(46.48));
    }

    #[test]
    fn total_of_empty_list_is_zero() {
        assert_eq!(order_total_from_submitted_prices(&[]), Decimal::ZERO);
    }

    #[test]
    fn order_number_is_five_digits() {
        let n = generate_order_number();
        assert!((10_000..=99_999).contains(&n), "{n}");
    }

    #[test]
    fn empty_item_list_fails_validation() {
        let request = CreateOrderRequest {
            items: vec![],
            address_id: Uuid::new_v4(),
            payment_method: "razorpay".into(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_quantity_fails_line_validation() {
        assert!(line(0, dec!(10)).validate().is_err());
        assert!(line(1, dec!(10)).validate().is_ok());
    }
}
