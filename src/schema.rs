//! Declarative document shapes.
//!
//! A [`Schema`] is a `static` table built at compile time; the store consults
//! it on every write and when building secondary indexes.

use std::fmt;

use crate::domain::order::{self, OrderStatus};
use crate::domain::product;
use crate::query::{number_key, FieldValue, Fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    StringList,
    Number,
}

impl FieldType {
    fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldType::String, FieldValue::Str(_))
                | (FieldType::StringList, FieldValue::List(_))
                | (FieldType::Number, FieldValue::Number(_))
        )
    }
}

impl FieldType {
    /// The index key a query value is looked up under. A value that cannot
    /// be a number never hits a number index.
    pub fn lookup_key(&self, value: &str) -> Option<String> {
        match self {
            FieldType::Number => value.parse::<f64>().ok().map(number_key),
            FieldType::String | FieldType::StringList => Some(value.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::StringList => f.write_str("string list"),
            FieldType::Number => f.write_str("number"),
        }
    }
}

/// Constraints declared for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<&'static str>,
    /// Permitted string values; empty means unconstrained.
    pub allowed: &'static [&'static str],
    pub indexed: bool,
    /// Collection the field's values point into. The repository checks and
    /// resolves these.
    pub reference: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            default: None,
            allowed: &[],
            indexed: false,
            reference: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = values;
        self
    }

    pub const fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub const fn references(mut self, collection: &'static str) -> Self {
        self.reference = Some(collection);
        self
    }

    fn check(&self, value: Option<&FieldValue>, violations: &mut Vec<String>) {
        let value = match value {
            Some(value) if !value.is_empty() => value,
            _ => {
                if self.required {
                    violations.push(format!("`{}` is required", self.name));
                }
                return;
            }
        };

        if !self.field_type.accepts(value) {
            violations.push(format!("`{}` must be a {}", self.name, self.field_type));
            return;
        }

        if self.allowed.is_empty() {
            return;
        }
        for key in value.index_keys() {
            if !self.allowed.contains(&key.as_str()) {
                violations.push(format!("`{}` is not a valid value for `{}`", key, self.name));
            }
        }
    }
}

/// The shape of one collection.
#[derive(Debug)]
pub struct Schema {
    pub collection: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn indexed_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|spec| spec.indexed)
    }

    /// Declared default for `name`, applied when a document is created without it.
    pub fn default_for(&self, name: &str) -> Option<&'static str> {
        self.fields.iter().find(|spec| spec.name == name)?.default
    }

    /// The field whose values point into `collection`, if any.
    pub fn reference_into(&self, collection: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.reference == Some(collection))
    }

    /// Checks every declared field of `doc` and reports all violations at once.
    pub fn validate<D: Fields + ?Sized>(&self, doc: &D) -> Result<(), String> {
        let mut violations = Vec::new();
        for spec in self.fields {
            spec.check(doc.field(spec.name).as_ref(), &mut violations);
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(format!("{} validation failed: {}", self.collection, violations.join("; ")))
        }
    }
}

pub static ORDER_SCHEMA: Schema = Schema {
    collection: "orders",
    fields: &[
        FieldSpec::new(order::fields::ID, FieldType::String).required(),
        FieldSpec::new(order::fields::BUYER_EMAIL, FieldType::String).required(),
        FieldSpec::new(order::fields::PRODUCTS, FieldType::StringList)
            .required()
            .indexed()
            .references("products"),
        FieldSpec::new(order::fields::STATUS, FieldType::String)
            .default_value("CREATED")
            .one_of(&OrderStatus::NAMES)
            .indexed(),
    ],
};

pub static PRODUCT_SCHEMA: Schema = Schema {
    collection: "products",
    fields: &[
        FieldSpec::new(product::fields::ID, FieldType::String).required(),
        FieldSpec::new(product::fields::NAME, FieldType::String).required(),
        FieldSpec::new(product::fields::PRICE, FieldType::Number).required(),
        FieldSpec::new(product::fields::QUANTITY, FieldType::Number),
    ],
};
