use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde::Deserialize;

use crate::error::VariantError;
use crate::models::variant::{HotelMappings, Variant};
use crate::routes::{
    load_editor, load_package, parse_object_id, persist_changes, repository_error_response,
    variant_error_response, AppState,
};
use crate::services::variant_service::PackageVariants;

#[derive(Debug, Deserialize)]
pub struct CreateVariantRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "isDefault")]
    pub is_default: bool,
    #[serde(default, alias = "priceModifier")]
    pub price_modifier: Option<f64>,
    #[serde(default, alias = "hotelMappings")]
    pub hotel_mappings: Option<HotelMappings>,
    /// Start from an existing variant's hotels and price modifier.
    #[serde(default, alias = "templateId")]
    pub template_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateVariantRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "priceModifier")]
    pub price_modifier: Option<f64>,
    /// New position in the package's variant list.
    #[serde(default)]
    pub position: Option<usize>,
}

fn validate_name(name: &str) -> Result<String, VariantError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(VariantError::validation("name", "is required"));
    }
    Ok(name.to_string())
}

fn validate_modifier(modifier: Option<f64>) -> Result<Option<f64>, VariantError> {
    match modifier {
        Some(value) if !value.is_finite() => {
            Err(VariantError::validation("price_modifier", "must be a finite number"))
        }
        other => Ok(other),
    }
}

/*
    GET /api/packages/{package_id}/variants
*/
pub async fn list(path: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    let package_id = path.into_inner();
    match load_package(&state, &package_id).await {
        Ok(variants) => HttpResponse::Ok().json(variants),
        Err(response) => response,
    }
}

/*
    POST /api/packages/{package_id}/variants
*/
pub async fn create(
    path: web::Path<String>,
    state: web::Data<AppState>,
    input: web::Json<CreateVariantRequest>,
) -> impl Responder {
    let package_id = path.into_inner();
    let request = input.into_inner();

    let name = match validate_name(&request.name) {
        Ok(name) => name,
        Err(err) => return variant_error_response(&err),
    };
    let price_modifier = match validate_modifier(request.price_modifier) {
        Ok(modifier) => modifier,
        Err(err) => return variant_error_response(&err),
    };

    let stored = match load_package(&state, &package_id).await {
        Ok(stored) => stored,
        Err(response) => return response,
    };

    let mut variant = Variant::new(name.clone());
    variant.description = request.description.clone();
    variant.is_default = request.is_default;
    if let Some(mappings) = request.hotel_mappings.clone() {
        variant.hotel_mappings = mappings;
    }
    if let Some(modifier) = price_modifier {
        variant.price_modifier = modifier;
    }

    // An empty package has no variant to copy from
    if let Some(template_id) = request.template_id.as_deref().filter(|_| stored.is_empty()) {
        return match parse_object_id(template_id, "template_id") {
            Ok(id) => variant_error_response(&VariantError::VariantNotFound(id.to_hex())),
            Err(response) => response,
        };
    }

    let (mut editor, index) = if stored.is_empty() {
        // First variant of a package is its default
        variant.is_default = true;
        (PackageVariants::new(variant), 0)
    } else {
        let mut editor = match PackageVariants::from_variants(stored.clone()) {
            Ok(editor) => editor,
            Err(err) => return variant_error_response(&err),
        };
        let index = match &request.template_id {
            Some(template_id) => {
                let template_id = match parse_object_id(template_id, "template_id") {
                    Ok(id) => id,
                    Err(response) => return response,
                };
                let added = editor
                    .position_of(&template_id)
                    .and_then(|template| editor.add_from_template(template, name));
                let index = match added {
                    Ok(index) => index,
                    Err(err) => return variant_error_response(&err),
                };
                if let Ok(created) = editor.get_mut(index) {
                    if request.description.is_some() {
                        created.description = request.description.clone();
                    }
                    if let Some(mappings) = request.hotel_mappings.clone() {
                        created.hotel_mappings = mappings;
                    }
                    if let Some(modifier) = price_modifier {
                        created.price_modifier = modifier;
                    }
                }
                if request.is_default {
                    if let Err(err) = editor.set_default(index) {
                        return variant_error_response(&err);
                    }
                }
                index
            }
            None => editor.add(variant),
        };
        (editor, index)
    };

    let Some(new_variant) = editor.get(index).cloned() else {
        return variant_error_response(&VariantError::VariantNotFound(format!("index {}", index)));
    };
    let id = match state.repository.insert_variant(&package_id, &new_variant).await {
        Ok(id) => id,
        Err(err) => return repository_error_response(&err),
    };
    if let Err(err) = editor.assign_id(index, id) {
        return variant_error_response(&err);
    }
    if let Err(response) = persist_changes(&state, &package_id, &stored, &editor).await {
        return response;
    }

    info!("Created variant {} '{}' in package {}", id, new_variant.name, package_id);
    match editor.get(index) {
        Some(created) => HttpResponse::Created().json(created),
        None => variant_error_response(&VariantError::VariantNotFound(id.to_hex())),
    }
}

/*
    PUT /api/packages/{package_id}/variants/{variant_id}
*/
pub async fn update(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
    input: web::Json<UpdateVariantRequest>,
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

    let edited = (|| -> Result<usize, VariantError> {
        let mut index = editor.position_of(&variant_id)?;
        let name = request.name.as_deref().map(validate_name).transpose()?;
        let price_modifier = validate_modifier(request.price_modifier)?;

        if let Some(position) = request.position {
            if position >= editor.len() {
                return Err(VariantError::validation(
                    "position",
                    format!("must be below {}", editor.len()),
                ));
            }
            editor.move_variant(index, position)?;
            index = position;
        }

        let variant = editor.get_mut(index)?;
        if let Some(name) = name {
            variant.name = name;
        }
        if request.description.is_some() {
            variant.description = request.description.clone();
        }
        if let Some(modifier) = price_modifier {
            variant.price_modifier = modifier;
        }
        Ok(index)
    })();

    let index = match edited {
        Ok(index) => index,
        Err(err) => return variant_error_response(&err),
    };
    if let Err(response) = persist_changes(&state, &package_id, &stored, &editor).await {
        return response;
    }

    match editor.get(index) {
        Some(variant) => HttpResponse::Ok().json(variant),
        None => variant_error_response(&VariantError::VariantNotFound(variant_id.to_hex())),
    }
}

/*
    DELETE /api/packages/{package_id}/variants/{variant_id}
*/
pub async fn delete(path: web::Path<(String, String)>, state: web::Data<AppState>) -> impl Responder {
    let (package_id, variant_id) = path.into_inner();
    let variant_id = match parse_object_id(&variant_id, "variant_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (stored, mut editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let removed = editor
        .position_of(&variant_id)
        .and_then(|index| editor.remove(index));
    if let Err(err) = removed {
        return variant_error_response(&err);
    }

    if let Err(err) = state.repository.delete_variant(&package_id, &variant_id).await {
        return repository_error_response(&err);
    }
    if let Err(response) = persist_changes(&state, &package_id, &stored, &editor).await {
        return response;
    }

    HttpResponse::Ok().json(editor.as_slice())
}

/*
    POST /api/packages/{package_id}/variants/{variant_id}/default
*/
pub async fn make_default(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (package_id, variant_id) = path.into_inner();
    let variant_id = match parse_object_id(&variant_id, "variant_id") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let (stored, mut editor) = match load_editor(&state, &package_id).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let changed = editor
        .position_of(&variant_id)
        .and_then(|index| editor.set_default(index));
    if let Err(err) = changed {
        return variant_error_response(&err);
    }
    if let Err(response) = persist_changes(&state, &package_id, &stored, &editor).await {
        return response;
    }

    HttpResponse::Ok().json(editor.as_slice())
}
