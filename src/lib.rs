//! Product Catalog
//!
//! A product list kept in memory and mirrored to a single JSON file.
//!
//! ## Features
//! - Sequential product ids, unique product codes
//! - Whole-file JSON persistence after every mutation
//! - Read-only HTTP API over the catalog

pub mod api;
pub mod config;
pub mod domain;
pub mod manager;

pub use domain::{NewProduct, Product, ProductPatch};
pub use manager::{LoadPolicy, ProductManager};

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("product with code {0} already exists")]
    DuplicateCode(String),

    #[error("product {0} not found")]
    NotFound(u64),

    #[error("product id space exhausted")]
    IdsExhausted,

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt catalog file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl CatalogError {
    /// True for failures of the backing file rather than of the request.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Corrupt(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
