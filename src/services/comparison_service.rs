//! Comparison aggregator
//!
//! Builds the side-by-side view of two or more variants: which hotel each
//! variant uses on each day, what each pricing component costs, the total
//! per variant and which variants are the best value. Gaps in the input are
//! never errors; they show up as explicit sentinels in the result.

use std::collections::{BTreeSet, HashMap};

use log::{debug, warn};

use crate::error::ComparisonError;
use crate::models::comparison::{
    ComparedVariant, ComparisonResult, ComponentPrice, DayHotelSnapshot, FallbackPricing,
    HotelCell, HotelEntry, HotelRow, PriceCell, PriceRow, PricingSnapshot, VariantSnapshot,
    VariantTotal,
};
use crate::models::variant::{ItineraryDay, Variant};
use crate::services::catalog_service::Catalog;
use crate::services::hotel_mapping_service::HotelMappingService;
use crate::services::normalizer;

pub struct ComparisonService;

impl ComparisonService {
    /// Compare `variants` in the given column order.
    pub fn compare(
        variants: &[VariantSnapshot],
        fallback: &HashMap<String, FallbackPricing>,
    ) -> Result<ComparisonResult, ComparisonError> {
        if variants.len() < 2 {
            return Err(ComparisonError::TooFewVariants(variants.len()));
        }
        Ok(Self::build(variants, fallback))
    }

    pub fn build(
        variants: &[VariantSnapshot],
        fallback: &HashMap<String, FallbackPricing>,
    ) -> ComparisonResult {
        let day_axis = day_axis(variants);
        let hotel_matrix = hotel_matrix(variants, &day_axis);
        let component_axis = component_axis(variants, fallback);
        let price_matrix = price_matrix(variants, fallback, &component_axis);
        let variant_totals: Vec<VariantTotal> = variants
            .iter()
            .map(|variant| variant_total(variant, fallback.get(&variant.source_id)))
            .collect();
        let best_value = best_value(variants, &variant_totals);
        let has_unknown_totals = variant_totals
            .iter()
            .any(|total| *total == VariantTotal::Unknown);

        debug!(
            "Compared {} variants: {} days, {} components, best value {:?}",
            variants.len(),
            day_axis.len(),
            component_axis.len(),
            best_value
        );

        ComparisonResult {
            variants: variants
                .iter()
                .map(|variant| ComparedVariant {
                    source_id: variant.source_id.clone(),
                    name: variant.name.clone(),
                })
                .collect(),
            day_axis,
            hotel_matrix,
            component_axis,
            price_matrix,
            variant_totals,
            best_value,
            has_unknown_totals,
        }
    }
}

fn day_axis(variants: &[VariantSnapshot]) -> Vec<u32> {
    variants
        .iter()
        .flat_map(|variant| variant.hotels.iter().map(|day| day.day_number))
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect()
}

fn hotel_matrix(variants: &[VariantSnapshot], day_axis: &[u32]) -> Vec<HotelRow> {
    day_axis
        .iter()
        .map(|&day_number| HotelRow {
            day_number,
            cells: variants
                .iter()
                .map(|variant| {
                    variant
                        .hotels
                        .iter()
                        .find(|day| day.day_number == day_number)
                        .map(|day| HotelCell::Assigned(day.hotel.clone()))
                        .unwrap_or(HotelCell::NotSpecified)
                })
                .collect(),
        })
        .collect()
}

fn first_period(variant: &VariantSnapshot) -> Option<&PricingSnapshot> {
    variant.pricing.first()
}

fn push_unique(axis: &mut Vec<String>, name: &str) {
    if !axis.iter().any(|existing| existing == name) {
        axis.push(name.to_string());
    }
}

fn component_axis(
    variants: &[VariantSnapshot],
    fallback: &HashMap<String, FallbackPricing>,
) -> Vec<String> {
    let mut axis = Vec::new();

    for variant in variants {
        if let Some(period) = first_period(variant) {
            for component in &period.components {
                push_unique(&mut axis, &component.name);
            }
        }
    }

    for variant in variants {
        if let Some(override_pricing) = fallback.get(&variant.source_id) {
            for component in &override_pricing.components {
                push_unique(&mut axis, &component.name);
            }
        }
    }

    axis
}

fn price_cell(
    variant: &VariantSnapshot,
    fallback: Option<&FallbackPricing>,
    component: &str,
) -> PriceCell {
    if let Some(price) = fallback.and_then(|pricing| {
        pricing
            .components
            .iter()
            .find(|c| c.name == component)
            .and_then(|c| normalizer::try_number(&c.price).ok())
    }) {
        return PriceCell::Amount(price);
    }

    first_period(variant)
        .and_then(|period| period.components.iter().find(|c| c.name == component))
        .map(|c| PriceCell::Amount(c.price))
        .unwrap_or(PriceCell::Absent)
}

fn price_matrix(
    variants: &[VariantSnapshot],
    fallback: &HashMap<String, FallbackPricing>,
    component_axis: &[String],
) -> Vec<PriceRow> {
    component_axis
        .iter()
        .map(|component| PriceRow {
            component: component.clone(),
            cells: variants
                .iter()
                .map(|variant| price_cell(variant, fallback.get(&variant.source_id), component))
                .collect(),
        })
        .collect()
}

/// Fallback total first, then the stored period total. Anything not
/// strictly positive is unknown.
fn variant_total(variant: &VariantSnapshot, fallback: Option<&FallbackPricing>) -> VariantTotal {
    let fallback_total = fallback
        .and_then(|pricing| pricing.total_cost.as_ref())
        .map(normalizer::to_canonical_number)
        .filter(|total| *total > 0.0);
    if let Some(total) = fallback_total {
        return VariantTotal::Known(total);
    }

    first_period(variant)
        .and_then(|period| period.total_price)
        .filter(|total| total.is_finite() && *total > 0.0)
        .map(VariantTotal::Known)
        .unwrap_or(VariantTotal::Unknown)
}

fn best_value(variants: &[VariantSnapshot], totals: &[VariantTotal]) -> Vec<String> {
    let minimum = totals
        .iter()
        .filter_map(VariantTotal::amount)
        .fold(None, |min: Option<f64>, total| match min {
            Some(current) if current <= total => Some(current),
            _ => Some(total),
        });

    match minimum {
        Some(minimum) => variants
            .iter()
            .zip(totals)
            .filter(|(_, total)| total.amount() == Some(minimum))
            .map(|(variant, _)| variant.source_id.clone())
            .collect(),
        None => Vec::new(),
    }
}

/// Resolve a variant's hotel mappings and pricing periods against the catalog.
///
/// Hotels missing from the catalog are left out so they render as not
/// specified. Component names come from pricing attributes, falling back to
/// the raw attribute id. Totals are the stored period totals; the variant's
/// price modifier is reported by the pricing listing, not here.
pub fn snapshot_variant(variant: &Variant, days: &[ItineraryDay], catalog: &Catalog) -> VariantSnapshot {
    let mut hotels = Vec::new();
    for day in days {
        let Some(hotel_id) = HotelMappingService::get_mapping(variant, day) else {
            continue;
        };
        match catalog.hotel(hotel_id) {
            Some(hotel) => hotels.push(DayHotelSnapshot {
                day_number: day.day_number(),
                hotel: HotelEntry {
                    name: hotel.name.clone(),
                    location: hotel.location.clone(),
                    room_category: hotel.category.clone(),
                    image_url: hotel.images.as_ref().and_then(|images| images.first().cloned()),
                },
            }),
            None => warn!(
                "Variant '{}': hotel {} on day {} is not in the catalog",
                variant.name,
                hotel_id,
                day.day_number()
            ),
        }
    }

    let mut periods = variant.seasonal_pricings.clone();
    normalizer::sort_by_start_date(&mut periods);
    let pricing = periods
        .iter()
        .map(|period| PricingSnapshot {
            components: period
                .pricing_components
                .iter()
                .map(|component| ComponentPrice {
                    name: catalog.attribute_name(&component.attribute_id).to_string(),
                    price: component.price,
                })
                .collect(),
            total_price: period.total_price.filter(|total| total.is_finite() && *total > 0.0),
        })
        .collect();

    VariantSnapshot {
        source_id: variant.source_id(),
        name: variant.name.clone(),
        hotels,
        pricing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::comparison::{FallbackComponent, NOT_SPECIFIED};
    use crate::models::raw::RawNumber;

    fn hotel(name: &str) -> HotelEntry {
        HotelEntry {
            name: name.to_string(),
            location: "Nairobi".to_string(),
            room_category: None,
            image_url: None,
        }
    }

    fn snapshot(id: &str, days: &[(u32, &str)], pricing: Vec<PricingSnapshot>) -> VariantSnapshot {
        VariantSnapshot {
            source_id: id.to_string(),
            name: id.to_string(),
            hotels: days
                .iter()
                .map(|(day_number, name)| DayHotelSnapshot {
                    day_number: *day_number,
                    hotel: hotel(name),
                })
                .collect(),
            pricing,
        }
    }

    fn priced(components: &[(&str, f64)], total: Option<f64>) -> PricingSnapshot {
        PricingSnapshot {
            components: components
                .iter()
                .map(|(name, price)| ComponentPrice {
                    name: name.to_string(),
                    price: *price,
                })
                .collect(),
            total_price: total,
        }
    }

    #[test]
    fn test_hotel_matrix_uses_not_specified_sentinel() {
        let a = snapshot("A", &[(1, "hotelX")], vec![]);
        let b = snapshot("B", &[(1, "hotelY"), (2, "hotelZ")], vec![]);

        let result = ComparisonService::compare(&[a, b], &HashMap::new()).unwrap();

        assert_eq!(result.day_axis, vec![1, 2]);
        assert_eq!(result.hotel_matrix.len(), result.day_axis.len());
        assert_eq!(
            result.hotel_cell(1, "A"),
            Some(&HotelCell::Assigned(hotel("hotelX")))
        );
        assert_eq!(
            result.hotel_cell(1, "B"),
            Some(&HotelCell::Assigned(hotel("hotelY")))
        );
        assert_eq!(result.hotel_cell(2, "A"), Some(&HotelCell::NotSpecified));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["hotel_matrix"][1]["cells"][0], NOT_SPECIFIED);
    }

    #[test]
    fn test_day_axis_is_sorted_union() {
        let a = snapshot("A", &[(3, "h"), (1, "h")], vec![]);
        let b = snapshot("B", &[(2, "h"), (3, "h")], vec![]);
        let c = snapshot("C", &[], vec![]);

        let result = ComparisonService::compare(&[a, b, c], &HashMap::new()).unwrap();
        assert_eq!(result.day_axis, vec![1, 2, 3]);
        for row in &result.hotel_matrix {
            assert_eq!(row.cells.len(), 3);
            assert_eq!(row.cells[2], HotelCell::NotSpecified);
        }
    }

    #[test]
    fn test_fallback_components_and_unknown_total() {
        let a = snapshot("A", &[(1, "h")], vec![priced(&[("Stay", 5000.0)], None)]);
        let b = snapshot("B", &[(1, "h")], vec![]);
        let mut fallback = HashMap::new();
        fallback.insert(
            "B".to_string(),
            FallbackPricing {
                components: vec![
                    FallbackComponent {
                        name: "Stay".to_string(),
                        price: RawNumber::Number(4500.0),
                    },
                    FallbackComponent {
                        name: "Transfer".to_string(),
                        price: RawNumber::from("1000"),
                    },
                ],
                total_cost: None,
            },
        );

        let result = ComparisonService::compare(&[a, b], &fallback).unwrap();

        assert_eq!(result.component_axis, vec!["Stay", "Transfer"]);
        assert_eq!(result.price_cell("Stay", "A"), Some(PriceCell::Amount(5000.0)));
        assert_eq!(result.price_cell("Stay", "B"), Some(PriceCell::Amount(4500.0)));
        assert_eq!(result.price_cell("Transfer", "A"), Some(PriceCell::Absent));
        assert_eq!(result.price_cell("Transfer", "B"), Some(PriceCell::Amount(1000.0)));
        assert_eq!(result.total("B"), Some(VariantTotal::Unknown));
        assert!(result.has_unknown_totals);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["price_matrix"][1]["cells"][0], "—");
        assert_eq!(json["variant_totals"][1], "unknown");
    }

    #[test]
    fn test_fallback_price_wins_over_structured() {
        let a = snapshot("A", &[], vec![priced(&[("Stay", 5000.0)], Some(7000.0))]);
        let b = snapshot("B", &[], vec![priced(&[("Stay", 6000.0)], Some(8000.0))]);
        let mut fallback = HashMap::new();
        fallback.insert(
            "A".to_string(),
            FallbackPricing {
                components: vec![FallbackComponent {
                    name: "Stay".to_string(),
                    price: RawNumber::Number(5200.0),
                }],
                total_cost: Some(RawNumber::from("9000")),
            },
        );

        let result = ComparisonService::compare(&[a, b], &fallback).unwrap();
        assert_eq!(result.component_axis, vec!["Stay"]);
        assert_eq!(result.price_cell("Stay", "A"), Some(PriceCell::Amount(5200.0)));
        assert_eq!(result.total("A"), Some(VariantTotal::Known(9000.0)));
        assert_eq!(result.total("B"), Some(VariantTotal::Known(8000.0)));
        assert_eq!(result.best_value, vec!["B"]);
    }

    #[test]
    fn test_zero_and_unparseable_totals_are_unknown() {
        let a = snapshot("A", &[], vec![priced(&[("Stay", 100.0)], Some(0.0))]);
        let b = snapshot("B", &[], vec![priced(&[("Stay", 100.0)], None)]);
        let mut fallback = HashMap::new();
        fallback.insert(
            "B".to_string(),
            FallbackPricing {
                components: vec![],
                total_cost: Some(RawNumber::from("TBD")),
            },
        );

        let result = ComparisonService::compare(&[a, b], &fallback).unwrap();
        assert_eq!(result.variant_totals, vec![VariantTotal::Unknown, VariantTotal::Unknown]);
        assert!(result.best_value.is_empty());
    }

    #[test]
    fn test_best_value_includes_ties() {
        let a = snapshot("A", &[], vec![priced(&[], Some(12000.0))]);
        let b = snapshot("B", &[], vec![priced(&[], Some(9500.0))]);
        let c = snapshot("C", &[], vec![priced(&[], Some(9500.0))]);

        let result = ComparisonService::compare(&[a, b, c], &HashMap::new()).unwrap();
        assert_eq!(result.best_value, vec!["B", "C"]);
        assert!(!result.is_best_value("A"));
        assert!(!result.has_unknown_totals);
    }

    #[test]
    fn test_variant_without_pricing_keeps_hotel_column() {
        let a = snapshot("A", &[(1, "h1"), (2, "h2")], vec![]);
        let b = snapshot("B", &[(1, "h3")], vec![]);

        let result = ComparisonService::compare(&[a, b], &HashMap::new()).unwrap();
        assert_eq!(result.hotel_matrix.len(), 2);
        assert!(result.component_axis.is_empty());
        assert!(result.price_matrix.is_empty());
    }

    #[test]
    fn test_only_first_period_feeds_the_axis() {
        let a = snapshot(
            "A",
            &[],
            vec![
                priced(&[("Stay", 100.0)], Some(100.0)),
                priced(&[("Safari", 50.0)], Some(150.0)),
            ],
        );
        let b = snapshot("B", &[], vec![priced(&[("Meals", 20.0), ("Stay", 90.0)], Some(110.0))]);

        let result = ComparisonService::compare(&[a, b], &HashMap::new()).unwrap();
        assert_eq!(result.component_axis, vec!["Stay", "Meals"]);
        assert_eq!(result.total("A"), Some(VariantTotal::Known(100.0)));
    }

    #[test]
    fn test_unparseable_fallback_price_is_absent() {
        let a = snapshot("A", &[], vec![priced(&[("Stay", 5000.0)], Some(5000.0))]);
        let b = snapshot("B", &[], vec![]);
        let mut fallback = HashMap::new();
        fallback.insert(
            "A".to_string(),
            FallbackPricing {
                components: vec![
                    FallbackComponent {
                        name: "Stay".to_string(),
                        price: RawNumber::from("TBD"),
                    },
                    FallbackComponent {
                        name: "Guide".to_string(),
                        price: RawNumber::from("TBD"),
                    },
                ],
                total_cost: None,
            },
        );

        let result = ComparisonService::compare(&[a, b], &fallback).unwrap();
        assert_eq!(result.component_axis, vec!["Stay", "Guide"]);
        // The structured price still shows when the legacy one cannot be read
        assert_eq!(result.price_cell("Stay", "A"), Some(PriceCell::Amount(5000.0)));
        assert_eq!(result.price_cell("Guide", "A"), Some(PriceCell::Absent));
        assert_eq!(result.price_cell("Guide", "B"), Some(PriceCell::Absent));
    }

    #[test]
    fn test_snapshot_total_ignores_price_modifier() {
        use crate::models::pricing::{PricingComponent, SeasonalPricingPeriod};
        use chrono::{TimeZone, Utc};

        let mut variant = Variant::new("Luxury");
        variant.price_modifier = 20.0;
        variant.seasonal_pricings.push(SeasonalPricingPeriod {
            id: None,
            variant_id: None,
            start_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap(),
            meal_plan_id: "MAP".to_string(),
            number_of_rooms: 2,
            vehicle_type_id: None,
            is_group_pricing: false,
            description: None,
            pricing_components: vec![PricingComponent {
                id: None,
                attribute_id: "stay".to_string(),
                price: 10000.0,
                purchase_price: None,
                description: None,
            }],
            location_seasonal_period_id: None,
            total_price: Some(10000.0),
            total_component_price: 10000.0,
        });

        let luxury = snapshot_variant(&variant, &[], &Catalog::default());
        assert_eq!(luxury.pricing[0].total_price, Some(10000.0));
        assert_eq!(luxury.pricing[0].components[0].name, "stay");

        let standard = snapshot("Standard", &[], vec![priced(&[("stay", 9500.0)], Some(9500.0))]);
        let result = ComparisonService::compare(&[standard, luxury], &HashMap::new()).unwrap();
        assert_eq!(
            result.variant_totals,
            vec![VariantTotal::Known(9500.0), VariantTotal::Known(10000.0)]
        );
        assert_eq!(result.best_value, vec!["Standard"]);
    }

    #[test]
    fn test_requires_two_variants() {
        let a = snapshot("A", &[(1, "h")], vec![]);
        assert_eq!(
            ComparisonService::compare(&[a], &HashMap::new()),
            Err(ComparisonError::TooFewVariants(1))
        );
    }
}
