use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::product::Product;

/// Stored field names for [`Order`] documents.
pub mod fields {
    pub const ID: &str = "id";
    pub const BUYER_EMAIL: &str = "buyerEmail";
    pub const PRODUCTS: &str = "products";
    pub const STATUS: &str = "status";
}

/// Lifecycle state of an order.
///
/// Variants are declared in workflow order, so `Ord` follows
/// `CREATED < PENDING < COMPLETED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
    Pending,
    Completed,
}

impl OrderStatus {
    pub const NAMES: [&'static str; 3] = ["CREATED", "PENDING", "COMPLETED"];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a valid order status")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "PENDING" => Ok(OrderStatus::Pending),
            "COMPLETED" => Ok(OrderStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Which status changes an edit may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionPolicy {
    /// Any status may follow any other.
    #[default]
    Permissive,
    /// Status may only stay put or move forward through the workflow.
    ForwardOnly,
}

impl TransitionPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::ForwardOnly => to >= from,
        }
    }
}

/// A customer order as stored. `products` only ever holds product ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub buyer_email: String,
    pub products: Vec<String>,
    pub status: OrderStatus,
}

impl Order {
    /// Overwrites every field present in `change`.
    pub fn apply(&mut self, change: OrderChange) {
        if let Some(buyer_email) = change.buyer_email {
            self.buyer_email = buyer_email;
        }
        if let Some(products) = change.products {
            self.products = products.into_iter().map(ProductRef::into_id).collect();
        }
        if let Some(status) = change.status {
            self.status = status;
        }
    }
}

/// A product reference as supplied by callers: a bare id, a previously
/// resolved product, or any object carrying an `id`. Always stored as the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(String),
    Resolved(Product),
    /// An object with an `id`; its other fields are ignored.
    Partial { id: String },
}

impl ProductRef {
    pub fn id(&self) -> &str {
        match self {
            ProductRef::Id(id) | ProductRef::Partial { id } => id,
            ProductRef::Resolved(product) => &product.id,
        }
    }

    pub fn into_id(self) -> String {
        match self {
            ProductRef::Id(id) | ProductRef::Partial { id } => id,
            ProductRef::Resolved(product) => product.id,
        }
    }
}

impl From<&str> for ProductRef {
    fn from(id: &str) -> Self {
        ProductRef::Id(id.to_string())
    }
}

impl From<String> for ProductRef {
    fn from(id: String) -> Self {
        ProductRef::Id(id)
    }
}

impl From<Product> for ProductRef {
    fn from(product: Product) -> Self {
        ProductRef::Resolved(product)
    }
}

/// Payload for creating a new order.
///
/// Missing fields deserialize to empty values so that the schema, not the
/// decoder, reports them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub buyer_email: String,
    #[serde(default)]
    pub products: Vec<ProductRef>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

impl OrderInput {
    pub fn new<P>(buyer_email: impl Into<String>, products: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<ProductRef>,
    {
        Self {
            id: None,
            buyer_email: buyer_email.into(),
            products: products.into_iter().map(Into::into).collect(),
            status: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn product_ids(&self) -> Vec<String> {
        self.products.iter().map(|p| p.id().to_string()).collect()
    }
}

/// Partial update for an existing order. `id` is not part of it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderChange {
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<ProductRef>>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

impl OrderChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buyer_email(mut self, buyer_email: impl Into<String>) -> Self {
        self.buyer_email = Some(buyer_email.into());
        self
    }

    pub fn products<P>(mut self, products: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<ProductRef>,
    {
        self.products = Some(products.into_iter().map(Into::into).collect());
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_email.is_none() && self.products.is_none() && self.status.is_none()
    }
}

/// An order with its product ids expanded into product documents.
/// Only ever built for responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedOrder {
    pub id: String,
    pub buyer_email: String,
    pub products: Vec<Product>,
    pub status: OrderStatus,
}

impl PopulatedOrder {
    pub fn new(order: Order, products: Vec<Product>) -> Self {
        Self {
            id: order.id,
            buyer_email: order.buyer_email,
            products,
            status: order.status,
        }
    }

    pub fn product_ids(&self) -> Vec<&str> {
        self.products.iter().map(|p| p.id.as_str()).collect()
    }
}
