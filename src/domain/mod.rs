//! Catalog domain model
pub mod aggregates;

pub use aggregates::{NewProduct, Product, ProductPatch};
