pub mod product;
pub mod order;

pub use product::{Product, ProductCreate};
pub use order::{
    Order, OrderChange, OrderInput, OrderStatus, PopulatedOrder, ProductRef, TransitionPolicy,
    UnknownStatus,
};
