//! Product manager: the in-memory catalog and its backing file.
//!
//! Every successful mutation rewrites the whole file. When that write fails the
//! error is returned but the in-memory change stays in place; callers must treat
//! a failed mutation as "changed in memory, not on disk".

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, error, info, warn};

use crate::domain::{NewProduct, Product, ProductPatch};
use crate::{CatalogError, Result};

/// What [`ProductManager::load`] does when the backing file exists but cannot be
/// read or parsed. A missing file is always a first run and loads empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Log the failure and continue with an empty catalog.
    #[default]
    StartEmpty,
    /// Return the failure and leave the catalog untouched.
    Propagate,
}

impl FromStr for LoadPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "start-empty" => Ok(Self::StartEmpty),
            "propagate" => Ok(Self::Propagate),
            other => Err(format!("expected `start-empty` or `propagate`, got `{other}`")),
        }
    }
}

impl fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartEmpty => write!(f, "start-empty"),
            Self::Propagate => write!(f, "propagate"),
        }
    }
}

#[derive(Debug)]
pub struct ProductManager {
    products: Vec<Product>,
    next_id: u64,
    path: PathBuf,
    policy: LoadPolicy,
}

impl ProductManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_policy(path, LoadPolicy::default())
    }

    pub fn with_policy(path: impl Into<PathBuf>, policy: LoadPolicy) -> Self {
        Self { products: Vec::new(), next_id: 1, path: path.into(), policy }
    }

    pub fn path(&self) -> &Path { &self.path }
    pub fn policy(&self) -> LoadPolicy { self.policy }
    pub fn next_id(&self) -> u64 { self.next_id }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }

    /// Replaces the catalog with the contents of the backing file and
    /// recomputes the next id as `max(id) + 1`.
    pub async fn load(&mut self) -> Result<()> {
        let loaded = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => serde_json::from_str::<Vec<Product>>(&data).map_err(CatalogError::from),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no catalog file, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(CatalogError::from(e)),
        };

        let loaded = loaded.and_then(|products| {
            let next_id = match products.iter().map(|p| p.id).max() {
                Some(max) => max.checked_add(1).ok_or(CatalogError::IdsExhausted)?,
                None => 1,
            };
            Ok((products, next_id))
        });

        match loaded {
            Ok((products, next_id)) => {
                self.next_id = next_id;
                self.products = products;
                info!(path = %self.path.display(), count = self.products.len(), "catalog loaded");
                Ok(())
            }
            Err(e) if self.policy == LoadPolicy::StartEmpty => {
                warn!(path = %self.path.display(), error = %e, "catalog unreadable, starting empty");
                self.products.clear();
                self.next_id = 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Validates and stores a new product under the next id.
    pub async fn add(&mut self, draft: NewProduct) -> Result<Product> {
        if let Err(e) = draft.check_required() {
            warn!(error = %e, "rejected product");
            return Err(e);
        }
        if self.products.iter().any(|p| p.code == draft.code) {
            warn!(code = %draft.code, "duplicate product code");
            return Err(CatalogError::DuplicateCode(draft.code));
        }

        let Some(following) = self.next_id.checked_add(1) else {
            warn!(code = %draft.code, "no product ids left");
            return Err(CatalogError::IdsExhausted);
        };

        let product = draft.into_product(self.next_id);
        self.next_id = following;
        self.products.push(product.clone());
        self.save().await?;
        info!(id = product.id, code = %product.code, "product added");
        Ok(product)
    }

    /// All products in insertion order.
    pub fn get_all(&self) -> &[Product] {
        &self.products
    }

    pub fn get_by_id(&self, id: u64) -> Option<&Product> {
        let found = self.products.iter().find(|p| p.id == id);
        if found.is_none() {
            debug!(id, "product not found");
        }
        found
    }

    /// Merges `patch` over the stored product. Code uniqueness and required
    /// fields are not checked again; a patched price must still be finite.
    pub async fn update(&mut self, id: u64, patch: ProductPatch) -> Result<Product> {
        let Some(product) = self.products.iter_mut().find(|p| p.id == id) else {
            warn!(id, "update of unknown product");
            return Err(CatalogError::NotFound(id));
        };
        if let Some(price) = patch.price.filter(|p| !p.is_finite()) {
            warn!(id, price, "rejected non-finite price");
            return Err(CatalogError::Validation(format!("price must be finite, got {price}")));
        }
        patch.apply_to(product);
        let updated = product.clone();
        self.save().await?;
        info!(id, "product updated");
        Ok(updated)
    }

    /// Removes the first product with `id` and returns it.
    pub async fn delete(&mut self, id: u64) -> Result<Product> {
        let Some(index) = self.products.iter().position(|p| p.id == id) else {
            warn!(id, "delete of unknown product");
            return Err(CatalogError::NotFound(id));
        };
        let removed = self.products.remove(index);
        self.save().await?;
        info!(id, "product deleted");
        Ok(removed)
    }

    /// Overwrites the backing file with the pretty-printed catalog.
    pub async fn save(&self) -> Result<()> {
        // serde_json writes NaN and infinity as null, which would not load back
        if let Some(bad) = self.products.iter().find(|p| !p.price.is_finite()) {
            error!(id = bad.id, "refusing to write non-finite price");
            return Err(CatalogError::Validation(format!("product {} has a non-finite price", bad.id)));
        }
        let json = serde_json::to_string_pretty(&self.products)?;
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            error!(path = %self.path.display(), error = %e, "failed to write catalog");
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(code: &str) -> NewProduct {
        NewProduct::new("Ibuprofeno", "Antiinflamatorio", 7.49, "ibuprofeno.jpg", code, 80)
    }

    fn manager_in(dir: &TempDir) -> ProductManager {
        ProductManager::new(dir.path().join("products.json"))
    }

    #[tokio::test]
    async fn test_add_assigns_sequential_ids() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        m.load().await.unwrap();

        assert_eq!(m.add(draft("A")).await.unwrap().id, 1);
        assert_eq!(m.add(draft("B")).await.unwrap().id, 2);
        assert_eq!(m.next_id(), 3);
        assert_eq!(m.get_by_id(2).unwrap().code, "B");
    }

    #[tokio::test]
    async fn test_duplicate_code_leaves_catalog_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        m.add(draft("FARM001")).await.unwrap();

        let err = m.add(draft("FARM001")).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateCode(ref c) if c == "FARM001"));
        assert_eq!(m.len(), 1);
        assert_eq!(m.next_id(), 2);
    }

    #[tokio::test]
    async fn test_invalid_draft_leaves_catalog_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);

        let err = m.add(NewProduct { title: String::new(), ..draft("X") }).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(m.is_empty());
        assert!(!m.path().exists());

        let zero_stock = m.add(NewProduct { stock: Some(0), ..draft("X") }).await.unwrap();
        assert_eq!(zero_stock.stock, 0);
        assert_eq!(zero_stock.id, 1);
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let m = manager_in(&dir);
        assert!(m.get_by_id(42).is_none());
    }

    #[tokio::test]
    async fn test_update_merges_present_fields() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        let original = m.add(draft("A")).await.unwrap();

        let updated = m.update(1, ProductPatch::default().price(899.99).stock(20)).await.unwrap();
        assert_eq!(updated.price, 899.99);
        assert_eq!(updated.stock, 20);
        assert_eq!(updated.title, original.title);
        assert_eq!(updated.description, original.description);
        assert_eq!(updated.thumbnail, original.thumbnail);
        assert_eq!(updated.code, original.code);
        assert_eq!(m.get_by_id(1), Some(&updated));
    }

    #[tokio::test]
    async fn test_update_does_not_recheck_code() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        m.add(draft("A")).await.unwrap();
        m.add(draft("B")).await.unwrap();

        m.update(2, ProductPatch::default().code("A")).await.unwrap();
        assert_eq!(m.get_all().iter().filter(|p| p.code == "A").count(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        assert!(matches!(
            m.update(9, ProductPatch::default().stock(1)).await,
            Err(CatalogError::NotFound(9))
        ));
        assert!(matches!(m.delete(9).await, Err(CatalogError::NotFound(9))));
    }

    #[tokio::test]
    async fn test_delete_removes_one_record() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        for code in ["A", "B", "C"] {
            m.add(draft(code)).await.unwrap();
        }

        let removed = m.delete(2).await.unwrap();
        assert_eq!(removed.code, "B");
        assert_eq!(m.len(), 2);
        assert!(m.get_by_id(2).is_none());
        // ids are never reused
        assert_eq!(m.add(draft("D")).await.unwrap().id, 4);
    }

    #[tokio::test]
    async fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        for code in ["A", "B", "C"] {
            m.add(draft(code)).await.unwrap();
        }
        m.delete(3).await.unwrap();

        let mut reloaded = manager_in(&dir);
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.get_all(), m.get_all());
        assert_eq!(reloaded.next_id(), 3);
    }

    #[tokio::test]
    async fn test_next_id_follows_max_loaded_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.json");
        let records = serde_json::json!([
            {"id": 7, "title": "t", "description": "d", "price": 1.5, "thumbnail": "x", "code": "A", "stock": 1},
            {"id": 3, "title": "t", "description": "d", "price": 2, "thumbnail": "x", "code": "B", "stock": 0}
        ]);
        std::fs::write(&path, records.to_string()).unwrap();

        let mut m = ProductManager::new(&path);
        m.load().await.unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get_all()[0].id, 7);
        assert_eq!(m.next_id(), 8);
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let mut missing = manager_in(&dir);
        missing.load().await.unwrap();
        assert!(missing.is_empty());
        assert_eq!(missing.next_id(), 1);

        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut corrupt = ProductManager::new(&path);
        corrupt.load().await.unwrap();
        assert!(corrupt.is_empty());
        assert_eq!(corrupt.next_id(), 1);
    }

    #[tokio::test]
    async fn test_propagate_policy_surfaces_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "[{\"id\": 1}]").unwrap();

        let mut m = ProductManager::with_policy(&path, LoadPolicy::Propagate);
        let err = m.load().await.unwrap_err();
        assert!(matches!(err, CatalogError::Corrupt(_)));
        assert!(err.is_storage());

        let mut first_run = ProductManager::with_policy(dir.path().join("new.json"), LoadPolicy::Propagate);
        first_run.load().await.unwrap();
        assert!(first_run.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_in_memory_change() {
        let dir = TempDir::new().unwrap();
        let mut m = ProductManager::new(dir.path().join("no-such-dir").join("products.json"));

        let err = m.add(draft("A")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
        assert_eq!(m.len(), 1);
        assert_eq!(m.next_id(), 2);

        let err = m.update(1, ProductPatch::default().stock(5)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
        assert_eq!(m.get_by_id(1).unwrap().stock, 5);

        let err = m.delete(1).await.unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
        assert!(m.is_empty());
    }

    #[tokio::test]
    async fn test_non_finite_price_never_reaches_the_file() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        m.add(draft("A")).await.unwrap();

        let err = m.add(NewProduct { price: Some(f64::INFINITY), ..draft("B") }).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let err = m.update(1, ProductPatch::default().price(f64::NAN)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(m.get_by_id(1).unwrap().price, 7.49);

        m.products[0].price = f64::INFINITY;
        assert!(matches!(m.save().await, Err(CatalogError::Validation(_))));

        let mut reloaded = manager_in(&dir);
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get_all()[0].price, 7.49);
    }

    #[tokio::test]
    async fn test_max_id_on_disk_exhausts_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.json");
        let records = serde_json::json!([
            {"id": u64::MAX, "title": "t", "description": "d", "price": 1.5, "thumbnail": "x", "code": "A", "stock": 1}
        ]);
        std::fs::write(&path, records.to_string()).unwrap();

        let mut strict = ProductManager::with_policy(&path, LoadPolicy::Propagate);
        assert!(matches!(strict.load().await, Err(CatalogError::IdsExhausted)));
        assert!(strict.is_empty());

        let mut lenient = ProductManager::new(&path);
        lenient.load().await.unwrap();
        assert!(lenient.is_empty());
        assert_eq!(lenient.next_id(), 1);
    }

    #[tokio::test]
    async fn test_add_fails_when_ids_run_out() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        m.next_id = u64::MAX;

        assert!(matches!(m.add(draft("A")).await, Err(CatalogError::IdsExhausted)));
        assert!(m.is_empty());
        assert_eq!(m.next_id(), u64::MAX);
        assert!(!m.path().exists());
    }

    #[tokio::test]
    async fn test_save_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let mut m = manager_in(&dir);
        m.add(draft("A")).await.unwrap();

        let raw = std::fs::read_to_string(m.path()).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"id\": 1,\n    \"title\""));
    }

    #[test]
    fn test_load_policy_from_str() {
        assert_eq!("start-empty".parse::<LoadPolicy>(), Ok(LoadPolicy::StartEmpty));
        assert_eq!("propagate".parse::<LoadPolicy>(), Ok(LoadPolicy::Propagate));
        assert!("ignore".parse::<LoadPolicy>().is_err());
        assert_eq!(LoadPolicy::Propagate.to_string(), "propagate");
    }
}
