use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::error::VariantError;
use crate::models::variant::{DayKey, ItineraryDay, SourceDay};
use crate::routes::{load_editor, parse_object_id, persist_changes, variant_error_response, AppState};
use crate::services::hotel_mapping_service::HotelMappingService;

#[derive(Debug, Deserialize)]
pub struct DayAssignment {
    #[serde(alias = "dayKey")]
    pub day_key: String,
    /// `null` clears the day.
    #[serde(default, alias = "hotelId")]
    pub hotel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignHotelsRequest {
    /// Current itinerary days; used to move entries stored under bare day numbers.
    #[serde(default)]
    pub days: Vec<ItineraryDay>,
    pub assignments: Vec<DayAssignment>,
}

#[derive(Debug, Deserialize)]
pub struct CopyHotelsRequest {
    #[serde(alias = "sourceVariantId")]
    pub source_variant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyHotelsRequest {
    pub days: Vec<ItineraryDay>,
    #[serde(alias = "sourceDays")]
    pub source_days: Vec<SourceDay>,
}

/*
    PUT /api/packages/{package_id}/variants/{variant_id}/hotels
*/
pub async fn assign(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
    input: web::Json<AssignHotelsRequest>,
) -> impl Responder {
    let (package_id, variant_id) = path.into_inner();
    let request = input.into_inner();
    let variant_id = match parse_object_id(&variant_id, "variant_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    if let Some(blank) = request
        .assignments
        .iter()
        .position(|assignment| assignment.day_key.trim().is_empty())
    {
        return variant_error_response(&VariantError::validation(
            format!("assignments[{}].day_key", blank),
            "is required",
        ));
    }

    let (stored, mut editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };
    let variant = match editor
        .position_of(&variant_id)
        .and_then(|index| editor.get_mut(index))
    {
        Ok(variant) => variant,
        Err(err) => return variant_error_response(&err),
    };

    variant.hotel_mappings.rekey_legacy(&request.days);
    for assignment in request.assignments {
        let day_key = DayKey::from(assignment.day_key.trim());
        match assignment.hotel_id.filter(|hotel| !hotel.trim().is_empty()) {
            Some(hotel_id) => HotelMappingService::set_mapping(variant, day_key, hotel_id),
            None => {
                HotelMappingService::clear_mapping(variant, &day_key);
            }
        }
    }
    let mappings = variant.hotel_mappings.clone();

    if let Err(response) = persist_changes(&state, &package_id, &stored, &editor).await {
        return response;
    }
    HttpResponse::Ok().json(mappings)
}

/*
    POST /api/packages/{package_id}/variants/{variant_id}/hotels/copy
*/
pub async fn copy(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
    input: web::Json<CopyHotelsRequest>,
) -> impl Responder {
    let (package_id, variant_id) = path.into_inner();
    let target_id = match parse_object_id(&variant_id, "variant_id") {
        Ok(id) => id,
        Err(response) => return response,
    };
    let source_id = match parse_object_id(&input.source_variant_id, "source_variant_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (stored, mut editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let copied = editor.position_of(&source_id).and_then(|from| {
        let to = editor.position_of(&target_id)?;
        editor.copy_hotel_mappings(from, to)?;
        Ok(to)
    });
    let index = match copied {
        Ok(index) => index,
        Err(err) => return variant_error_response(&err),
    };

    if let Err(response) = persist_changes(&state, &package_id, &stored, &editor).await {
        return response;
    }
    match editor.get(index) {
        Some(variant) => HttpResponse::Ok().json(&variant.hotel_mappings),
        None => variant_error_response(&VariantError::VariantNotFound(target_id.to_hex())),
    }
}

/*
    POST /api/packages/{package_id}/variants/{variant_id}/hotels/apply
*/
pub async fn apply(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
    input: web::Json<ApplyHotelsRequest>,
) -> impl Responder {
    let (package_id, variant_id) = path.into_inner();
    let request = input.into_inner();
    let variant_id = match parse_object_id(&variant_id, "variant_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (stored, mut editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let applied = editor
        .position_of(&variant_id)
        .and_then(|index| editor.get_mut(index))
        .and_then(|variant| {
            HotelMappingService::apply_from_external_day_set(variant, &request.days, &request.source_days)
                .map(|report| (report, variant.hotel_mappings.clone()))
        });
    let (report, mappings) = match applied {
        Ok(applied) => applied,
        Err(err) => return variant_error_response(&err),
    };

    if let Err(response) = persist_changes(&state, &package_id, &stored, &editor).await {
        return response;
    }
    HttpResponse::Ok().json(json!({
        "applied": report.applied,
        "unmapped_days": report.unmapped_days,
        "hotel_mappings": mappings,
    }))
}
