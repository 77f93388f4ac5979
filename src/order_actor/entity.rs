use crate::actor_framework::Document;
use crate::domain::order::fields;
use crate::domain::{Order, OrderInput, OrderStatus, ProductRef};
use crate::query::{FieldValue, Fields};
use crate::schema::{Schema, ORDER_SCHEMA};

impl Fields for Order {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            fields::ID => Some(FieldValue::Str(self.id.clone())),
            fields::BUYER_EMAIL => Some(FieldValue::Str(self.buyer_email.clone())),
            fields::PRODUCTS => Some(FieldValue::List(self.products.clone())),
            fields::STATUS => Some(FieldValue::Str(self.status.as_str().to_string())),
            _ => None,
        }
    }
}

impl Document for Order {
    type Id = String;
    type CreatePayload = OrderInput;

    fn schema() -> &'static Schema {
        &ORDER_SCHEMA
    }

    fn id(&self) -> &String {
        &self.id
    }

    fn requested_id(payload: &OrderInput) -> Option<String> {
        payload.id.clone().filter(|id| !id.is_empty())
    }

    /// Builds the stored order. Resolved products are reduced to their ids and
    /// a missing status takes the schema default.
    fn from_create(id: String, payload: OrderInput) -> Self {
        Self {
            id,
            buyer_email: payload.buyer_email,
            products: payload.products.into_iter().map(ProductRef::into_id).collect(),
            status: payload.status.unwrap_or_else(default_status),
        }
    }
}

fn default_status() -> OrderStatus {
    ORDER_SCHEMA
        .default_for(fields::STATUS)
        .and_then(|name| name.parse().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;

    #[test]
    fn from_create_applies_defaults() {
        let input = OrderInput::new(
            "a@x.com",
            vec![ProductRef::from("p1"), ProductRef::from(Product::new("p2", "Mouse", 19.0, 3))],
        );
        assert_eq!(Order::requested_id(&input), None);

        let order = Order::from_create("order_1".to_string(), input);
        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.products, vec!["p1", "p2"]);
        assert!(order.validate().is_ok());
    }

    #[test]
    fn empty_requested_id_counts_as_absent() {
        let input = OrderInput::new("a@x.com", ["p1"]).with_id("");
        assert_eq!(Order::requested_id(&input), None);
        let input = OrderInput::new("a@x.com", ["p1"]).with_id("custom");
        assert_eq!(Order::requested_id(&input), Some("custom".to_string()));
    }

    #[test]
    fn status_field_reads_stored_name() {
        let order = Order::from_create(
            "order_1".to_string(),
            OrderInput::new("a@x.com", ["p1"]).with_status(OrderStatus::Pending),
        );
        assert_eq!(order.field(fields::STATUS), Some(FieldValue::Str("PENDING".to_string())));
        assert_eq!(order.field("total"), None);
    }
}
