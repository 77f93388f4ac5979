//! Product documents, the targets of order references.

pub mod entity;
pub mod error;

pub use error::*;
