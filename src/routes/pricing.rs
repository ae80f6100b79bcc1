use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::error::VariantError;
use crate::models::pricing::PeriodDraft;
use crate::models::raw::RawDate;
use crate::routes::{
    load_editor, parse_object_id, repository_error_response, variant_error_response, AppState,
};
use crate::services::catalog_service::Catalog;
use crate::services::normalizer;
use crate::services::pricing_service::{PeriodSummary, PricingService};
use crate::services::seasonal_pricing_service::SeasonalPricingService;

#[derive(Debug, Deserialize)]
pub struct PricingListQuery {
    /// Travel date to resolve the applicable period for.
    pub date: Option<String>,
}

/*
    GET /api/packages/{package_id}/variants/{variant_id}/pricing?date=YYYY-MM-DD
*/
pub async fn list(
    path: web::Path<(String, String)>,
    query: web::Query<PricingListQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (package_id, variant_id) = path.into_inner();
    let variant_id = match parse_object_id(&variant_id, "variant_id") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let travel_date = match query.date.as_deref() {
        Some(date) => match normalizer::try_date(&RawDate::from(date)) {
            Ok(date) => Some(date),
            Err(_) => {
                return variant_error_response(&VariantError::validation(
                    "date",
                    "not a recognizable date",
                ))
            }
        },
        None => None,
    };

    let (_, editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };
    let variant = match editor.position_of(&variant_id) {
        Ok(index) => &editor.as_slice()[index],
        Err(err) => return variant_error_response(&err),
    };

    let catalog = Catalog::load(state.catalog.as_ref()).await;
    let periods = SeasonalPricingService::list(variant);
    let summaries: Vec<PeriodSummary> = periods
        .iter()
        .map(|period| PricingService::summarize(variant, period, &catalog.value))
        .collect();
    let overlaps: Vec<[String; 2]> = SeasonalPricingService::overlaps(variant)
        .into_iter()
        .map(|(a, b)| [a.to_hex(), b.to_hex()])
        .collect();
    let active_period_id = travel_date
        .and_then(|date| SeasonalPricingService::period_for_date(variant, date))
        .and_then(|period| period.id)
        .map(|id| id.to_hex());

    HttpResponse::Ok().json(json!({
        "periods": periods,
        "summaries": summaries,
        "overlaps": overlaps,
        "active_period_id": active_period_id,
        "warnings": catalog.warning.into_iter().collect::<Vec<_>>(),
    }))
}

/*
    POST /api/packages/{package_id}/variants/{variant_id}/pricing
*/
pub async fn create(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
    input: web::Json<PeriodDraft>,
) -> impl Responder {
    let (package_id, variant_id) = path.into_inner();
    let variant_id = match parse_object_id(&variant_id, "variant_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (_, mut editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };
    let created = editor
        .position_of(&variant_id)
        .and_then(|index| editor.create_period(index, &input));
    let period = match created {
        Ok(period) => period,
        Err(err) => return variant_error_response(&err),
    };

    match state.repository.insert_period(&package_id, &period).await {
        Ok(()) => HttpResponse::Created().json(period),
        Err(err) => repository_error_response(&err),
    }
}

/*
    PUT /api/packages/{package_id}/pricing/{period_id}
*/
pub async fn update(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
    input: web::Json<PeriodDraft>,
) -> impl Responder {
    let (package_id, period_id) = path.into_inner();
    let period_id = match parse_object_id(&period_id, "period_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (_, mut editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };
    let period = match editor.update_period(&period_id, &input) {
        Ok(period) => period,
        Err(err) => return variant_error_response(&err),
    };

    match state.repository.update_period(&package_id, &period).await {
        Ok(()) => HttpResponse::Ok().json(period),
        Err(err) => repository_error_response(&err),
    }
}

/*
    DELETE /api/packages/{package_id}/pricing/{period_id}
*/
pub async fn delete(path: web::Path<(String, String)>, state: web::Data<AppState>) -> impl Responder {
    let (package_id, period_id) = path.into_inner();
    let period_id = match parse_object_id(&period_id, "period_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (_, mut editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };
    if let Err(err) = editor.delete_period(&period_id) {
        return variant_error_response(&err);
    }

    match state.repository.delete_period(&package_id, &period_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => repository_error_response(&err),
    }
}
