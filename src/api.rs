//! Read-only HTTP API over the catalog.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{CatalogError, Product, ProductManager};

/// Shared handle to the single manager instance. Writers take the lock
/// exclusively, so mutations through this handle never interleave.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RwLock<ProductManager>>,
}

impl AppState {
    pub fn new(manager: ProductManager) -> Self {
        Self { catalog: Arc::new(RwLock::new(manager)) }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found() -> Self {
        Self { status: StatusCode::NOT_FOUND, message: "product not found".to_string() }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(_) => Self::not_found(),
            CatalogError::Validation(_) => Self { status: StatusCode::BAD_REQUEST, message: e.to_string() },
            CatalogError::DuplicateCode(_) => Self { status: StatusCode::CONFLICT, message: e.to_string() },
            e => {
                tracing::error!(error = %e, storage = e.is_storage(), "catalog operation failed");
                Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: "catalog unavailable".to_string() }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "product-catalog"})) }))
        .route("/products", get(list_products))
        .route("/products/:pid", get(get_product))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
}
#[derive(Debug, Serialize)] pub struct ProductList { pub products: Vec<Product> }
#[derive(Debug, Serialize)] pub struct ProductEnvelope { pub product: Product }

/// `?limit=` with no value means no limit.
fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
    match Option::<String>::deserialize(d)?.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Json<ProductList> {
    let catalog = s.catalog.read().await;
    let all = catalog.get_all();
    let shown = match p.limit {
        Some(limit) => &all[..limit.min(all.len())],
        None => all,
    };
    Json(ProductList { products: shown.to_vec() })
}

async fn get_product(State(s): State<AppState>, Path(pid): Path<String>) -> Result<Json<ProductEnvelope>, ApiError> {
    let id = pid.parse::<u64>().map_err(|_| ApiError::not_found())?;
    let product = s.catalog.read().await.get_by_id(id).cloned().ok_or(CatalogError::NotFound(id))?;
    Ok(Json(ProductEnvelope { product }))
}
