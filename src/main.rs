use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};

use package_variants_api::config::AppConfig;
use package_variants_api::db::catalog::MongoCatalog;
use package_variants_api::db::mongo::create_mongo_client;
use package_variants_api::db::variant_repository::{
    InMemoryVariantRepository, MongoVariantRepository, VariantRepository,
};
use package_variants_api::routes::{self, AppState};
use package_variants_api::services::catalog_service::{CatalogLookup, StaticCatalog};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    info!("Application starting...");

    let config = AppConfig::from_env();

    let (repository, catalog): (Arc<dyn VariantRepository>, Arc<dyn CatalogLookup>) =
        match &config.mongodb_uri {
            Some(uri) => {
                let client = create_mongo_client(uri, &config.packages_database)
                    .await
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
                (
                    Arc::new(MongoVariantRepository::new(client.clone(), &config.packages_database)),
                    Arc::new(MongoCatalog::new(client, &config.catalog_database)),
                )
            }
            None => {
                warn!("MONGODB_URI not set, packages are kept in memory and the catalog is empty");
                (
                    Arc::new(InMemoryVariantRepository::new()),
                    Arc::new(StaticCatalog::default()),
                )
            }
        };

    let state = web::Data::new(
        AppState::new(repository, catalog)
            .with_room_price_ttl(Duration::from_secs(config.room_price_ttl_secs)),
    );

    info!("Starting HTTP server on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::config)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
