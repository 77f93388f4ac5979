use crate::actor_framework::Document;
use crate::domain::product::fields;
use crate::domain::{Product, ProductCreate};
use crate::query::{FieldValue, Fields};
use crate::schema::{Schema, PRODUCT_SCHEMA};

impl Fields for Product {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            fields::ID => Some(FieldValue::Str(self.id.clone())),
            fields::NAME => Some(FieldValue::Str(self.name.clone())),
            fields::PRICE => Some(FieldValue::Number(self.price)),
            fields::QUANTITY => Some(FieldValue::Number(f64::from(self.quantity))),
            _ => None,
        }
    }
}

impl Document for Product {
    type Id = String;
    type CreatePayload = ProductCreate;

    fn schema() -> &'static Schema {
        &PRODUCT_SCHEMA
    }

    fn id(&self) -> &String {
        &self.id
    }

    fn requested_id(payload: &ProductCreate) -> Option<String> {
        payload.id.clone().filter(|id| !id.is_empty())
    }

    fn from_create(id: String, payload: ProductCreate) -> Self {
        Self {
            id,
            name: payload.name,
            price: payload.price,
            quantity: payload.quantity,
        }
    }
}
