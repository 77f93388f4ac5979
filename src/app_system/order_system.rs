use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, instrument};

use crate::actor_framework::ResourceActor;
use crate::app_system::RepositoryConfig;
use crate::clients::{OrderRepository, ProductClient};
use crate::domain::{Order, Product};

/// Starts the product and order stores and wires the repository to them.
pub struct OrderSystem {
    pub orders: OrderRepository,
    pub product_client: ProductClient,
    handles: Vec<JoinHandle<()>>,
}

impl Default for OrderSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-padded counter ids, so lexical order matches creation order.
fn sequential_ids(prefix: String) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = AtomicU64::new(1);
    move || format!("{}_{:08}", prefix, counter.fetch_add(1, Ordering::SeqCst))
}

impl OrderSystem {
    pub fn new() -> Self {
        Self::with_config(RepositoryConfig::default())
    }

    /// Must be called from within a tokio runtime.
    #[instrument(name = "order_system", skip(config))]
    pub fn with_config(config: RepositoryConfig) -> Self {
        info!("Starting order system");

        let (product_actor, products) = ResourceActor::<Product>::new(
            config.channel_buffer,
            sequential_ids(config.product_id_prefix.clone()),
        );
        let product_handle = tokio::spawn(product_actor.run());

        let (order_actor, orders) = ResourceActor::<Order>::new(
            config.channel_buffer,
            sequential_ids(config.order_id_prefix.clone()),
        );
        let order_handle = tokio::spawn(order_actor.run());

        let product_client = ProductClient::new(products.clone());
        let orders = OrderRepository::new(orders, products, config);

        info!("Order system started successfully");

        Self {
            orders,
            product_client,
            handles: vec![order_handle, product_handle],
        }
    }

    /// Drops this system's clients and waits for the stores to stop.
    ///
    /// Stores stop once every client is gone, so clones of the repository
    /// held elsewhere must be dropped first.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Shutting down order system");

        drop(self.orders);
        drop(self.product_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = ?e, "Store task failed");
                return Err(e);
            }
        }

        info!("Order system shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_sort_in_creation_order() {
        let next = sequential_ids("order".to_string());
        let ids: Vec<String> = (0..12).map(|_| next()).collect();
        assert_eq!(ids[0], "order_00000001");
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, ids);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_stores() {
        let system = OrderSystem::new();
        system.shutdown().await.unwrap();
    }
}
