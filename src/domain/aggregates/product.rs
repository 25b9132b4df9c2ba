//! Product Aggregate

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::CatalogError;

/// A catalog record as stored in the backing file.
///
/// Field order here is the field order of every record on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub thumbnail: String,
    pub code: String,
    pub stock: i64,
}

/// Client-supplied fields for a product that does not exist yet.
///
/// `price` and `stock` are optional so that "not provided" can be told apart
/// from a provided value.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub price: Option<f64>,
    #[validate(length(min = 1))]
    pub thumbnail: String,
    #[validate(length(min = 1))]
    pub code: String,
    pub stock: Option<i64>,
}

impl NewProduct {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        thumbnail: impl Into<String>,
        code: impl Into<String>,
        stock: i64,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            price: Some(price),
            thumbnail: thumbnail.into(),
            code: code.into(),
            stock: Some(stock),
        }
    }

    /// Presence check over every required field.
    ///
    /// Text fields and `price` must be non-empty / non-zero; `stock` only has to
    /// be present, so a stock of 0 is accepted. A price must also be finite,
    /// since JSON has no encoding for NaN or infinity.
    pub fn check_required(&self) -> Result<(), CatalogError> {
        let mut missing: Vec<&str> = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors.field_errors().keys().copied().collect(),
        };
        if !matches!(self.price, Some(p) if p != 0.0 && p.is_finite()) {
            missing.push("price");
        }
        if self.stock.is_none() {
            missing.push("stock");
        }
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        Err(CatalogError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }

    /// Builds the stored record. Callers run [`NewProduct::check_required`] first.
    pub(crate) fn into_product(self, id: u64) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            price: self.price.unwrap_or_default(),
            thumbnail: self.thumbnail,
            code: self.code,
            stock: self.stock.unwrap_or_default(),
        }
    }
}

/// Partial update merged field-by-field over a stored product.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub thumbnail: Option<String>,
    pub code: Option<String>,
    pub stock: Option<i64>,
}

impl ProductPatch {
    pub fn price(mut self, price: f64) -> Self { self.price = Some(price); self }
    pub fn stock(mut self, stock: i64) -> Self { self.stock = Some(stock); self }
    pub fn title(mut self, title: impl Into<String>) -> Self { self.title = Some(title.into()); self }
    pub fn description(mut self, description: impl Into<String>) -> Self { self.description = Some(description.into()); self }
    pub fn thumbnail(mut self, thumbnail: impl Into<String>) -> Self { self.thumbnail = Some(thumbnail.into()); self }
    pub fn code(mut self, code: impl Into<String>) -> Self { self.code = Some(code.into()); self }

    /// Overwrites the fields present in the patch. No re-validation happens here.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(title) = self.title { product.title = title; }
        if let Some(description) = self.description { product.description = description; }
        if let Some(price) = self.price { product.price = price; }
        if let Some(thumbnail) = self.thumbnail { product.thumbnail = thumbnail; }
        if let Some(code) = self.code { product.code = code; }
        if let Some(stock) = self.stock { product.stock = stock; }
    }
}
