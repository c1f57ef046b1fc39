pub mod cart_item;
pub mod customer;
pub mod customer_address;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;
pub mod product_variant;
pub mod wishlist_item;

// Re-export entities
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use customer::{CustomerRole, Entity as Customer, Model as CustomerModel};
pub use customer_address::{Entity as CustomerAddress, Model as CustomerAddressModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use payment::{Entity as Payment, Model as PaymentModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
pub use wishlist_item::{Entity as WishlistItem, Model as WishlistItemModel};
