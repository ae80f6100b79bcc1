//! Seasonal pricing store
//!
//! Validated create/update/delete of a variant's pricing periods. The
//! owning variant has to be saved first, and a draft is checked field by
//! field before anything is written.

use chrono::{DateTime, Utc};
use log::{info, warn};
use mongodb::bson::oid::ObjectId;

use crate::error::VariantError;
use crate::models::pricing::{PeriodDraft, PricingComponent, SeasonalPricingPeriod};
use crate::models::variant::Variant;
use crate::services::normalizer;

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPeriod {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub meal_plan_id: String,
    pub number_of_rooms: u32,
    pub vehicle_type_id: Option<String>,
    pub is_group_pricing: bool,
    pub description: Option<String>,
    pub pricing_components: Vec<PricingComponent>,
    pub location_seasonal_period_id: Option<String>,
    pub total_price: Option<f64>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required_date(value: &Option<String>, field: &str) -> Result<DateTime<Utc>, VariantError> {
    let text = non_blank(value).ok_or_else(|| VariantError::validation(field, "is required"))?;
    normalizer::parse_date_str(&text)
        .ok_or_else(|| VariantError::validation(field, format!("'{}' is not a valid date", text)))
}

fn non_negative_amount(value: f64, field: &str) -> Result<f64, VariantError> {
    if !value.is_finite() {
        return Err(VariantError::validation(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(VariantError::validation(field, "must not be negative"));
    }
    Ok(value)
}

/// Check a draft, stopping at the first offending field.
pub fn validate(draft: &PeriodDraft) -> Result<ValidatedPeriod, VariantError> {
    let start_date = required_date(&draft.start_date, "start_date")?;
    let end_date = required_date(&draft.end_date, "end_date")?;
    if end_date < start_date {
        return Err(VariantError::validation(
            "end_date",
            "must not be before start_date",
        ));
    }

    let meal_plan_id = non_blank(&draft.meal_plan_id)
        .ok_or_else(|| VariantError::validation("meal_plan_id", "is required"))?;

    let number_of_rooms = match draft.number_of_rooms {
        Some(rooms) if rooms.is_finite() && rooms.fract() == 0.0 && rooms >= 1.0 => {
            if rooms > f64::from(u32::MAX) {
                return Err(VariantError::validation("number_of_rooms", "is too large"));
            }
            rooms as u32
        }
        Some(_) => {
            return Err(VariantError::validation(
                "number_of_rooms",
                "must be a whole number of at least 1",
            ))
        }
        None => return Err(VariantError::validation("number_of_rooms", "is required")),
    };

    if draft.pricing_components.is_empty() {
        return Err(VariantError::validation(
            "pricing_components",
            "at least one component is required",
        ));
    }

    let mut pricing_components = Vec::with_capacity(draft.pricing_components.len());
    for (index, component) in draft.pricing_components.iter().enumerate() {
        let attribute_id = non_blank(&component.attribute_id).ok_or_else(|| {
            VariantError::validation(
                format!("pricing_components[{}].attribute_id", index),
                "an attribute must be selected",
            )
        })?;

        let price_field = format!("pricing_components[{}].price", index);
        let price = match component.price {
            Some(price) => non_negative_amount(price, &price_field)?,
            None => return Err(VariantError::validation(price_field, "is required")),
        };

        let purchase_price = match component.purchase_price {
            Some(purchase) => Some(non_negative_amount(
                purchase,
                &format!("pricing_components[{}].purchase_price", index),
            )?),
            None => None,
        };

        pricing_components.push(PricingComponent {
            id: Some(ObjectId::new()),
            attribute_id,
            price,
            purchase_price,
            description: non_blank(&component.description),
        });
    }

    let total_price = match draft.total_price {
        Some(total) => Some(non_negative_amount(total, "total_price")?),
        None => None,
    };

    Ok(ValidatedPeriod {
        start_date,
        end_date,
        meal_plan_id,
        number_of_rooms,
        vehicle_type_id: non_blank(&draft.vehicle_type_id),
        is_group_pricing: draft.is_group_pricing,
        description: non_blank(&draft.description),
        pricing_components,
        location_seasonal_period_id: non_blank(&draft.location_seasonal_period_id),
        total_price,
    })
}

fn build_period(
    id: ObjectId,
    variant_id: ObjectId,
    validated: ValidatedPeriod,
) -> SeasonalPricingPeriod {
    let total_component_price = normalizer::total_component_price(&validated.pricing_components);
    SeasonalPricingPeriod {
        id: Some(id),
        variant_id: Some(variant_id),
        start_date: validated.start_date,
        end_date: validated.end_date,
        meal_plan_id: validated.meal_plan_id,
        number_of_rooms: validated.number_of_rooms,
        vehicle_type_id: validated.vehicle_type_id,
        is_group_pricing: validated.is_group_pricing,
        description: validated.description,
        pricing_components: validated.pricing_components,
        location_seasonal_period_id: validated.location_seasonal_period_id,
        total_price: validated.total_price,
        total_component_price,
    }
}

fn warn_on_overlap(variant: &Variant, period_id: ObjectId) {
    let overlapping = SeasonalPricingService::overlaps(variant)
        .into_iter()
        .filter(|(a, b)| *a == period_id || *b == period_id)
        .count();
    if overlapping > 0 {
        warn!(
            "Variant '{}': period {} overlaps {} other period(s)",
            variant.name, period_id, overlapping
        );
    }
}

pub struct SeasonalPricingService;

impl SeasonalPricingService {
    pub fn create(
        variant: &mut Variant,
        draft: &PeriodDraft,
    ) -> Result<SeasonalPricingPeriod, VariantError> {
        let variant_id = variant.persisted_id()?;
        let validated = validate(draft)?;

        let period = build_period(ObjectId::new(), variant_id, validated);
        variant.seasonal_pricings.push(period.clone());
        normalizer::sort_by_start_date(&mut variant.seasonal_pricings);

        if let Some(id) = period.id {
            info!("Created pricing period {} for variant {}", id, variant_id);
            warn_on_overlap(variant, id);
        }
        Ok(period)
    }

    pub fn update(
        variant: &mut Variant,
        period_id: &ObjectId,
        draft: &PeriodDraft,
    ) -> Result<SeasonalPricingPeriod, VariantError> {
        let variant_id = variant.persisted_id()?;
        let index = Self::position(variant, period_id)?;
        let validated = validate(draft)?;

        let period = build_period(*period_id, variant_id, validated);
        variant.seasonal_pricings[index] = period.clone();
        normalizer::sort_by_start_date(&mut variant.seasonal_pricings);

        info!("Updated pricing period {} for variant {}", period_id, variant_id);
        warn_on_overlap(variant, *period_id);
        Ok(period)
    }

    pub fn delete(
        variant: &mut Variant,
        period_id: &ObjectId,
    ) -> Result<SeasonalPricingPeriod, VariantError> {
        let variant_id = variant.persisted_id()?;
        let index = Self::position(variant, period_id)?;
        let removed = variant.seasonal_pricings.remove(index);
        info!("Deleted pricing period {} from variant {}", period_id, variant_id);
        Ok(removed)
    }

    pub fn list(variant: &Variant) -> Vec<SeasonalPricingPeriod> {
        let mut periods = variant.seasonal_pricings.clone();
        normalizer::sort_by_start_date(&mut periods);
        periods
    }

    /// Period that applies on `date`; with overlapping periods the one that
    /// starts first wins.
    pub fn period_for_date(variant: &Variant, date: DateTime<Utc>) -> Option<SeasonalPricingPeriod> {
        Self::list(variant)
            .into_iter()
            .find(|period| period.contains(date))
    }

    /// Pairs of period ids whose date ranges intersect.
    pub fn overlaps(variant: &Variant) -> Vec<(ObjectId, ObjectId)> {
        let periods = Self::list(variant);
        let mut pairs = Vec::new();
        for (i, a) in periods.iter().enumerate() {
            for b in &periods[i + 1..] {
                if let (Some(a_id), Some(b_id)) = (a.id, b.id) {
                    if a.overlaps(b) {
                        pairs.push((a_id, b_id));
                    }
                }
            }
        }
        pairs
    }

    fn position(variant: &Variant, period_id: &ObjectId) -> Result<usize, VariantError> {
        variant
            .seasonal_pricings
            .iter()
            .position(|period| period.id.as_ref() == Some(period_id))
            .ok_or_else(|| VariantError::PeriodNotFound(period_id.to_hex()))
    }
}
