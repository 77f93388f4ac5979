use tracing::{debug, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::domain::{Product, ProductCreate};
use crate::product_actor::ProductError;

/// Client for the product store.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

impl ProductClient {
    pub fn new(inner: ResourceClient<Product>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, product), fields(product_name = %product.name))]
    pub async fn create_product(&self, product: ProductCreate) -> Result<Product, ProductError> {
        debug!("Sending request");
        let product = self.inner.insert(product).await?;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: String) -> Result<Option<Product>, ProductError> {
        debug!("Sending request");
        Ok(self.inner.find_by_id(id).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: String) -> Result<(), ProductError> {
        debug!("Sending request");
        let result = self.inner.delete_one(id.clone()).await?;
        if result.deleted_count == 0 {
            warn!("Product not found for delete");
            return Err(ProductError::NotFound(id));
        }
        info!("Product deleted");
        Ok(())
    }
}
