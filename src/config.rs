use std::env;

use log::warn;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const PACKAGES_DATABASE: &str = "Packages";
const CATALOG_DATABASE: &str = "Catalog";
const ROOM_PRICE_TTL_SECS: u64 = 15 * 60;

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Without a URI the service keeps packages in memory.
    pub mongodb_uri: Option<String>,
    pub packages_database: String,
    pub catalog_database: String,
    /// How long fetched room rates are served from cache.
    pub room_price_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| HOST.to_string());
        let port = match env::var("PORT") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                warn!("Invalid PORT '{}', using {}", value, PORT);
                PORT
            }),
            Err(_) => PORT,
        };
        let mongodb_uri = env::var("MONGODB_URI")
            .ok()
            .filter(|uri| !uri.trim().is_empty());
        let room_price_ttl_secs = match env::var("ROOM_PRICE_TTL_SECS") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                warn!("Invalid ROOM_PRICE_TTL_SECS '{}', using {}", value, ROOM_PRICE_TTL_SECS);
                ROOM_PRICE_TTL_SECS
            }),
            Err(_) => ROOM_PRICE_TTL_SECS,
        };

        Self {
            host,
            port,
            mongodb_uri,
            packages_database: env::var("PACKAGES_DATABASE")
                .unwrap_or_else(|_| PACKAGES_DATABASE.to_string()),
            catalog_database: env::var("CATALOG_DATABASE")
                .unwrap_or_else(|_| CATALOG_DATABASE.to_string()),
            room_price_ttl_secs,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            mongodb_uri: None,
            packages_database: PACKAGES_DATABASE.to_string(),
            catalog_database: CATALOG_DATABASE.to_string(),
            room_price_ttl_secs: ROOM_PRICE_TTL_SECS,
        }
    }
}
