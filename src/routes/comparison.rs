use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::error::VariantError;
use crate::models::comparison::FallbackPricing;
use crate::models::variant::{ItineraryDay, Variant};
use crate::routes::{error_body, load_editor, parse_object_id, variant_error_response, AppState};
use crate::services::catalog_service::{resolve_room_prices, room_breakdown, room_price_keys, Catalog};
use crate::services::comparison_service::{snapshot_variant, ComparisonService};
use crate::services::variant_service::PackageVariants;

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub days: Vec<ItineraryDay>,
    /// Columns to compare, in order. Empty compares every variant.
    #[serde(default, alias = "variantIds")]
    pub variant_ids: Vec<String>,
    /// Legacy pricing by variant id (or name, for unsaved variants).
    #[serde(default, alias = "fallbackPricing")]
    pub fallback_pricing: HashMap<String, FallbackPricing>,
}

#[derive(Debug, Deserialize)]
pub struct RoomPricesRequest {
    #[serde(default)]
    pub days: Vec<ItineraryDay>,
}

fn select_columns(editor: &PackageVariants, variant_ids: &[String]) -> Result<Vec<Variant>, HttpResponse> {
    if variant_ids.is_empty() {
        return Ok(editor.as_slice().to_vec());
    }
    variant_ids
        .iter()
        .map(|id| {
            let id = parse_object_id(id, "variant_ids")?;
            let index = editor
                .position_of(&id)
                .map_err(|err| variant_error_response(&err))?;
            editor
                .get(index)
                .cloned()
                .ok_or_else(|| variant_error_response(&VariantError::VariantNotFound(id.to_hex())))
        })
        .collect()
}

/*
    POST /api/packages/{package_id}/comparison
*/
pub async fn compare(
    path: web::Path<String>,
    state: web::Data<AppState>,
    input: web::Json<CompareRequest>,
) -> impl Responder {
    let package_id = path.into_inner();
    let request = input.into_inner();

    let (_, editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };
    let mut columns = match select_columns(&editor, &request.variant_ids) {
        Ok(columns) => columns,
        Err(response) => return response,
    };

    let catalog = Catalog::load(state.catalog.as_ref()).await;
    let snapshots: Vec<_> = columns
        .iter_mut()
        .map(|variant| {
            variant.hotel_mappings.rekey_legacy(&request.days);
            snapshot_variant(variant, &request.days, &catalog.value)
        })
        .collect();

    match ComparisonService::compare(&snapshots, &request.fallback_pricing) {
        Ok(result) => HttpResponse::Ok().json(json!({
            "comparison": result,
            "warnings": catalog.warning.into_iter().collect::<Vec<_>>(),
        })),
        Err(err) => HttpResponse::BadRequest().json(error_body(err)),
    }
}

/*
    POST /api/packages/{package_id}/room-prices
*/
pub async fn room_prices(
    path: web::Path<String>,
    state: web::Data<AppState>,
    input: web::Json<RoomPricesRequest>,
) -> impl Responder {
    let package_id = path.into_inner();

    let (_, editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let catalog = Catalog::load(state.catalog.as_ref()).await;
    let keys = room_price_keys(&editor, &input.days);

    let resolved = resolve_room_prices(state.catalog.as_ref(), &state.room_prices, &keys).await;
    let breakdown = room_breakdown(&editor, &catalog.value, &resolved, &keys);
    let mut warnings: Vec<String> = catalog.warning.into_iter().collect();
    warnings.extend(resolved.warnings);

    HttpResponse::Ok().json(json!({
        "rooms": breakdown,
        "warnings": warnings,
    }))
}
