use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpResponse};
use log::error;
use serde_json::json;
use tokio::sync::Mutex;

use crate::db::variant_repository::{load_variants, VariantRepository};
use crate::error::{RepositoryError, VariantError};
use crate::models::variant::Variant;
use crate::services::catalog_service::{CatalogLookup, RoomPriceCache, DEFAULT_ROOM_PRICE_CAPACITY};
use crate::services::variant_service::PackageVariants;

pub mod comparison;
pub mod health;
pub mod hotels;
pub mod pricing;
pub mod variant;

pub struct AppState {
    pub repository: Arc<dyn VariantRepository>,
    pub catalog: Arc<dyn CatalogLookup>,
    pub room_prices: Mutex<RoomPriceCache>,
}

impl AppState {
    pub fn new(repository: Arc<dyn VariantRepository>, catalog: Arc<dyn CatalogLookup>) -> Self {
        Self {
            repository,
            catalog,
            room_prices: Mutex::new(RoomPriceCache::new()),
        }
    }

    pub fn with_room_price_ttl(mut self, ttl: Duration) -> Self {
        self.room_prices = Mutex::new(RoomPriceCache::with_limits(ttl, DEFAULT_ROOM_PRICE_CAPACITY));
        self
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api/packages/{package_id}")
                .route("/variants", web::get().to(variant::list))
                .route("/variants", web::post().to(variant::create))
                .route("/variants/{variant_id}", web::put().to(variant::update))
                .route("/variants/{variant_id}", web::delete().to(variant::delete))
                .route("/variants/{variant_id}/default", web::post().to(variant::make_default))
                .route("/variants/{variant_id}/hotels", web::put().to(hotels::assign))
                .route("/variants/{variant_id}/hotels/copy", web::post().to(hotels::copy))
                .route("/variants/{variant_id}/hotels/apply", web::post().to(hotels::apply))
                .route("/variants/{variant_id}/pricing", web::get().to(pricing::list))
                .route("/variants/{variant_id}/pricing", web::post().to(pricing::create))
                .route("/pricing/{period_id}", web::put().to(pricing::update))
                .route("/pricing/{period_id}", web::delete().to(pricing::delete))
                .route("/comparison", web::post().to(comparison::compare))
                .route("/room-prices", web::post().to(comparison::room_prices)),
        );
}

pub(crate) fn error_body(message: impl std::fmt::Display) -> serde_json::Value {
    json!({ "error": message.to_string() })
}

pub(crate) fn variant_error_response(err: &VariantError) -> HttpResponse {
    match err {
        VariantError::Validation { .. } | VariantError::DayCountMismatch { .. } => {
            HttpResponse::BadRequest().json(error_body(err))
        }
        VariantError::VariantNotFound(_) | VariantError::PeriodNotFound(_) => {
            HttpResponse::NotFound().json(error_body(err))
        }
        VariantError::VariantNotPersisted | VariantError::LastVariant => {
            HttpResponse::Conflict().json(error_body(err))
        }
    }
}

pub(crate) fn repository_error_response(err: &RepositoryError) -> HttpResponse {
    match err {
        RepositoryError::NotFound(_) => HttpResponse::NotFound().json(error_body(err)),
        _ => {
            error!("Repository failure: {}", err);
            HttpResponse::InternalServerError().json(error_body("Failed to access package storage"))
        }
    }
}

pub(crate) fn parse_object_id(value: &str, field: &str) -> Result<mongodb::bson::oid::ObjectId, HttpResponse> {
    mongodb::bson::oid::ObjectId::parse_str(value.trim())
        .map_err(|_| variant_error_response(&VariantError::validation(field, "not a valid id")))
}

/// Stored variants of a package, periods attached.
pub(crate) async fn load_package(state: &AppState, package_id: &str) -> Result<Vec<Variant>, HttpResponse> {
    load_variants(state.repository.as_ref(), package_id)
        .await
        .map_err(|err| repository_error_response(&err))
}

/// Stored variants of a package as an editable list; 404 when it has none.
pub(crate) async fn load_editor(
    state: &AppState,
    package_id: &str,
) -> Result<(Vec<Variant>, PackageVariants), HttpResponse> {
    let stored = load_package(state, package_id).await?;
    let editor = PackageVariants::from_variants(stored.clone())
        .map_err(|err| variant_error_response(&err))?;
    Ok((stored, editor))
}

/// Write back every stored variant whose fields changed during an edit.
pub(crate) async fn persist_changes(
    state: &AppState,
    package_id: &str,
    before: &[Variant],
    after: &PackageVariants,
) -> Result<(), HttpResponse> {
    for variant in after.iter() {
        let Some(id) = variant.id else {
            continue;
        };
        let unchanged = before
            .iter()
            .any(|old| old.id == Some(id) && same_record(old, variant));
        if unchanged {
            continue;
        }
        state
            .repository
            .update_variant(package_id, variant)
            .await
            .map_err(|err| repository_error_response(&err))?;
    }
    Ok(())
}

// Periods are stored separately and are not part of the variant record.
fn same_record(a: &Variant, b: &Variant) -> bool {
    a.name == b.name
        && a.description == b.description
        && a.is_default == b.is_default
        && a.sort_order == b.sort_order
        && a.price_modifier == b.price_modifier
        && a.hotel_mappings == b.hotel_mappings
}
