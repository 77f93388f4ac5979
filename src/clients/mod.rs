//! Caller-facing clients over the store actors.

pub mod order_repository;
pub mod product_client;

pub use order_repository::{ListOptions, OrderRepository};
pub use product_client::ProductClient;
