use anyhow::Context;
use tracing::{error, info, Instrument};

use order_repository::{
    setup_tracing, ListOptions, OrderChange, OrderInput, OrderStatus, OrderSystem, ProductCreate,
    RepositoryConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = RepositoryConfig::from_env()?;
    info!(?config, "Starting order repository demo");

    let system = OrderSystem::with_config(config);

    let span = tracing::info_span!("product_seeding");
    let (keyboard, mouse) = async {
        let keyboard = system
            .product_client
            .create_product(ProductCreate::new("Keyboard", 49.0, 10))
            .await?;
        let mouse = system
            .product_client
            .create_product(ProductCreate::new("Mouse", 19.0, 25))
            .await?;
        let stored = system.product_client.get_product(mouse.id.clone()).await?;
        info!(found = stored.is_some(), product_id = %mouse.id, "Product lookup");
        anyhow::Ok((keyboard, mouse))
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("order_processing");
    let order = async {
        let order = system
            .orders
            .create(OrderInput::new("alice@example.com", [keyboard.id.clone(), mouse.id.clone()]))
            .await
            .context("failed to create order")?;
        let json = serde_json::to_string(&order)?;
        info!(order = %json, "Order created");

        let order = system
            .orders
            .edit(&order.id, OrderChange::new().status(OrderStatus::Pending))
            .await?;
        info!(order_id = %order.id, status = %order.status, "Order moved to pending");
        info!(limit = system.orders.config().effective_limit(None), "Listing with default page size");

        let pending = system
            .orders
            .list(ListOptions::new().status(OrderStatus::Pending).product_id(mouse.id.clone()))
            .await?;
        let json = serde_json::to_string(&pending)?;
        info!(pending = %json, "Pending orders containing the mouse");
        anyhow::Ok(order)
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("order_cleanup");
    async {
        system.orders.destroy(&order.id).await?;
        let gone = system.orders.get(&order.id).await?;
        info!(found = gone.is_some(), "Order destroyed");

        match system.orders.destroy(&order.id).await {
            Ok(()) => error!("Second destroy unexpectedly succeeded"),
            Err(e) => info!(error = %e, "Second destroy rejected"),
        }
        anyhow::Ok(())
    }
    .instrument(span)
    .await?;

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
