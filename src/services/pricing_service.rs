use serde::Serialize;

use crate::models::catalog::RoomPrice;
use crate::models::pricing::SeasonalPricingPeriod;
use crate::models::variant::Variant;
use crate::services::catalog_service::Catalog;

pub struct PricingService;

/// Per-period figures shown next to the period list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period_id: Option<String>,
    pub meal_plan: String,
    pub vehicle_type: Option<String>,
    pub adjusted_total: Option<f64>,
    pub purchase_cost: f64,
    pub margin: Option<f64>,
}

impl PricingService {
    /// Apply a signed percentage modifier (15.0 = +15%), never going below zero
    pub fn apply_price_modifier(amount: f64, modifier_pct: f64) -> f64 {
        if !modifier_pct.is_finite() {
            return amount.max(0.0);
        }
        (amount * (1.0 + modifier_pct / 100.0)).max(0.0)
    }

    /// Stored period total with the variant's modifier applied.
    /// `None` when the period has no positive stored total.
    pub fn adjusted_total(variant: &Variant, period: &SeasonalPricingPeriod) -> Option<f64> {
        period
            .total_price
            .filter(|total| total.is_finite() && *total > 0.0)
            .map(|total| Self::apply_price_modifier(total, variant.price_modifier))
    }

    /// Internal cost of a period (components without a purchase price count as 0)
    pub fn calculate_purchase_cost(period: &SeasonalPricingPeriod) -> f64 {
        period
            .pricing_components
            .iter()
            .filter_map(|component| component.purchase_price)
            .sum()
    }

    /// Customer price minus internal cost, only when every component has a purchase price
    pub fn calculate_margin(period: &SeasonalPricingPeriod) -> Option<f64> {
        let fully_costed = period
            .pricing_components
            .iter()
            .all(|component| component.purchase_price.is_some());
        if !fully_costed || period.pricing_components.is_empty() {
            return None;
        }
        Some(period.total_component_price - Self::calculate_purchase_cost(period))
    }

    /// Room-level cost for the breakdown view: the cheapest room entry
    /// multiplied by the number of rooms
    pub fn calculate_room_cost(prices: &[RoomPrice], number_of_rooms: u32) -> Option<f64> {
        prices
            .iter()
            .map(|price| price.price)
            .filter(|price| price.is_finite() && *price >= 0.0)
            .fold(None, |min: Option<f64>, price| match min {
                Some(current) if current <= price => Some(current),
                _ => Some(price),
            })
            .map(|cheapest| cheapest * f64::from(number_of_rooms))
    }

    /// Catalog names fall back to the stored ids when the catalog does not know them.
    pub fn summarize(variant: &Variant, period: &SeasonalPricingPeriod, catalog: &Catalog) -> PeriodSummary {
        let meal_plan = catalog
            .meal_plan(&period.meal_plan_id)
            .map(|plan| plan.name.clone())
            .unwrap_or_else(|| period.meal_plan_id.clone());
        let vehicle_type = period.vehicle_type_id.as_ref().map(|id| {
            catalog
                .vehicle_type(id)
                .map(|vehicle| vehicle.name.clone())
                .unwrap_or_else(|| id.clone())
        });

        PeriodSummary {
            period_id: period.id.map(|id| id.to_hex()),
            meal_plan,
            vehicle_type,
            adjusted_total: Self::adjusted_total(variant, period),
            purchase_cost: Self::calculate_purchase_cost(period),
            margin: Self::calculate_margin(period),
        }
    }
}
