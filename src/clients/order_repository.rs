use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{Document, ResourceClient, StoreError};
use crate::app_system::RepositoryConfig;
use crate::domain::order::fields;
use crate::domain::{Order, OrderChange, OrderInput, OrderStatus, PopulatedOrder, Product};
use crate::order_actor::OrderError;
use crate::query::{Direction, Filter, Query};

/// Options for [`OrderRepository::list`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListOptions {
    pub offset: usize,
    /// Page size; `None` uses the configured default.
    pub limit: Option<usize>,
    pub product_id: Option<String>,
    pub status: Option<OrderStatus>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// AND of the requested dimensions. An empty product id is ignored.
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(product_id) = self.product_id.as_deref().filter(|id| !id.is_empty()) {
            filter = filter.contains(fields::PRODUCTS, product_id);
        }
        if let Some(status) = self.status {
            filter = filter.eq(fields::STATUS, status.as_str());
        }
        filter
    }
}

/// CRUD access to orders, with product references resolved on read.
///
/// `get` reports a missing order as `Ok(None)`, while `edit` and `destroy`
/// fail with [`OrderError::NotFound`].
#[derive(Clone)]
pub struct OrderRepository {
    orders: ResourceClient<Order>,
    products: ResourceClient<Product>,
    config: Arc<RepositoryConfig>,
}

impl OrderRepository {
    pub fn new(
        orders: ResourceClient<Order>,
        products: ResourceClient<Product>,
        config: RepositoryConfig,
    ) -> Self {
        Self {
            orders,
            products,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Orders matching `options`, ascending by id. Products stay as ids.
    #[instrument(skip(self, options), fields(offset = options.offset, product_id = ?options.product_id, status = ?options.status))]
    pub async fn list(&self, options: ListOptions) -> Result<Vec<Order>, OrderError> {
        let limit = self.config.effective_limit(options.limit);
        let query = Query::new(options.filter())
            .sort(fields::ID, Direction::Ascending)
            .skip(options.offset)
            .limit(limit);
        debug!(limit, "Sending request");
        let orders = self.orders.find(query).await?;
        debug!(order_count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// The order with `id`, products resolved, or `None` if there is none.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<PopulatedOrder>, OrderError> {
        debug!("Sending request");
        match self.orders.find_by_id(id.to_string()).await? {
            Some(order) => self.populate(order).await.map(Some),
            None => {
                debug!("Order not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, input), fields(buyer_email = %input.buyer_email, product_count = input.products.len()))]
    pub async fn create(&self, input: OrderInput) -> Result<PopulatedOrder, OrderError> {
        debug!("Processing create_order request");
        if self.config.enforce_product_references {
            self.ensure_products_exist(&input.product_ids()).await?;
        }
        let order = self.orders.insert(input).await.inspect_err(|e| {
            warn!(error = %e, "Order create rejected");
        })?;
        info!(order_id = %order.id, status = %order.status, "Order created");
        self.populate(order).await
    }

    /// Overwrites the fields present in `change`. Products are always stored as ids.
    #[instrument(skip(self, change))]
    pub async fn edit(&self, id: &str, change: OrderChange) -> Result<PopulatedOrder, OrderError> {
        debug!(?change, "Processing edit_order request");
        let Some(mut order) = self.orders.find_by_id(id.to_string()).await? else {
            warn!("Order not found for edit");
            return Err(OrderError::NotFound(id.to_string()));
        };
        if change.is_empty() {
            debug!("Empty change, nothing to save");
            return self.populate(order).await;
        }

        if let Some(to) = change.status {
            let from = order.status;
            if !self.config.transition_policy.allows(from, to) {
                warn!(%from, %to, "Status transition rejected");
                return Err(OrderError::InvalidTransition { from, to });
            }
        }

        let products_changed = change.products.is_some();
        order.apply(change);
        if products_changed && self.config.enforce_product_references {
            self.ensure_products_exist(&order.products).await?;
        }

        let order = match self.orders.replace(order).await {
            Ok(order) => order,
            Err(StoreError::NotFound(_)) => {
                warn!("Order deleted before edit was saved");
                return Err(OrderError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        info!(status = %order.status, "Order updated");
        self.populate(order).await
    }

    /// Hard-deletes the order.
    #[instrument(skip(self))]
    pub async fn destroy(&self, id: &str) -> Result<(), OrderError> {
        debug!("Sending request");
        let result = self.orders.delete_one(id.to_string()).await?;
        if result.deleted_count == 0 {
            warn!("Order not found for delete");
            return Err(OrderError::NotFound(id.to_string()));
        }
        info!("Order deleted");
        Ok(())
    }

    /// Fetches the products behind `ids` in one round trip, in the order of
    /// `ids`. Ids without a product are skipped.
    #[instrument(skip(self), fields(id_count = ids.len()))]
    pub async fn resolve_references(&self, ids: &[String]) -> Result<Vec<Product>, OrderError> {
        let found = self.fetch_products(ids).await?;
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            match found.get(id.as_str()) {
                Some(product) => resolved.push(product.clone()),
                None => warn!(product_id = %id, "Referenced product not found, skipping"),
            }
        }
        Ok(resolved)
    }

    async fn populate(&self, order: Order) -> Result<PopulatedOrder, OrderError> {
        let products = self.resolve_references(&order.products).await?;
        Ok(PopulatedOrder::new(order, products))
    }

    async fn fetch_products(&self, ids: &[String]) -> Result<HashMap<String, Product>, OrderError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let unique: Vec<String> = ids.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        let products = self.products.find_by_ids(unique).await?;
        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }

    /// Checks `ids` against the product store when the order schema declares a
    /// reference into it.
    async fn ensure_products_exist(&self, ids: &[String]) -> Result<(), OrderError> {
        let collection = Product::schema().collection;
        let Some(reference) = Order::schema().reference_into(collection) else {
            return Ok(());
        };
        let found = self.fetch_products(ids).await?;
        let missing: BTreeSet<&str> = ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.contains_key(*id))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        let missing: Vec<&str> = missing.into_iter().collect();
        warn!(missing = ?missing, "Order references unknown products");
        Err(OrderError::ValidationError(format!(
            "`{}` references unknown {}: {}",
            reference.name,
            collection,
            missing.join(", ")
        )))
    }
}
