pub mod addresses;
pub mod assistant;
pub mod cart;
pub mod catalog;
pub mod chatbot;
pub mod customers;
pub mod gateway;
pub mod orders;
pub mod payment_status;
pub mod payments;
pub mod wishlist;
