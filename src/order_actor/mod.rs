//! Order documents: storage mapping and repository errors.

pub mod entity;
pub mod error;

pub use error::*;
