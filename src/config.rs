//! Service configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::LoadPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub products_path: PathBuf,
    pub load_policy: LoadPolicy,
    pub log_level: String,
}

/// Load configuration from the environment, reading `.env` first when present.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an unparseable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };
    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let bind_addr = match lookup("CATALOG_BIND_ADDR") {
        Ok(raw) => raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("CATALOG_BIND_ADDR", e.to_string()))?,
        Err(_) => {
            let port = or_default("PORT", "8080")
                .parse::<u16>()
                .map_err(|e| invalid("PORT", e.to_string()))?;
            SocketAddr::from(([0, 0, 0, 0], port))
        }
    };

    let products_path = PathBuf::from(or_default("CATALOG_PRODUCTS_PATH", "./products.json"));
    let load_policy = or_default("CATALOG_ON_LOAD_ERROR", "start-empty")
        .parse::<LoadPolicy>()
        .map_err(|reason| invalid("CATALOG_ON_LOAD_ERROR", reason))?;
    let log_level = or_default("CATALOG_LOG_LEVEL", "info");

    Ok(AppConfig {
        bind_addr,
        products_path,
        load_policy,
        log_level,
    })
}
