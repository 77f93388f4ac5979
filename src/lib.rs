//! # Order Repository
//!
//! CRUD access to orders that reference products, backed by an in-process
//! document store.
//!
//! - **Domain types** → [`Order`], [`OrderInput`], [`OrderChange`], [`PopulatedOrder`], [`Product`]
//! - **Store** → [`actor_framework::ResourceActor`] owns a collection in a tokio task and is
//!   reached through a cloneable [`actor_framework::ResourceClient`]
//! - **Schema** → [`schema::ORDER_SCHEMA`] is checked on every write and drives the secondary indexes
//! - **Repository** → [`OrderRepository`] with `list`, `get`, `create`, `edit`, `destroy`
//! - **System** → [`OrderSystem`] starts the stores; [`setup_tracing`] configures logging
//!
//! ```rust,no_run
//! use order_repository::{ListOptions, OrderInput, OrderSystem, ProductCreate};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let system = OrderSystem::new();
//! let keyboard = system.product_client.create_product(ProductCreate::new("Keyboard", 49.0, 10)).await?;
//! let order = system.orders.create(OrderInput::new("a@x.com", [keyboard.id])).await?;
//! let page = system.orders.list(ListOptions::new().limit(10)).await?;
//! system.orders.destroy(&order.id).await?;
//! system.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod order_actor;
pub mod product_actor;
pub mod query;
pub mod schema;

#[cfg(test)]
mod mock_framework;

pub use app_system::{setup_tracing, OrderSystem, RepositoryConfig};
pub use clients::{ListOptions, OrderRepository, ProductClient};
pub use domain::{
    Order, OrderChange, OrderInput, OrderStatus, PopulatedOrder, Product, ProductCreate, ProductRef,
    TransitionPolicy,
};
pub use order_actor::OrderError;
pub use product_actor::ProductError;
