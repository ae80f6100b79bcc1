//! Snapshot normalizer
//!
//! The single place where persisted pricing records are turned into the
//! canonical `SeasonalPricingPeriod` shape. Numbers become finite `f64`
//! values and dates become millisecond-precision UTC timestamps; anything
//! that cannot be read falls back to `0` or the current time.
//!
//! Normalizing an already canonical list yields the same list again.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use log::debug;

use crate::error::ParseFailure;
use crate::models::pricing::{PricingComponent, SeasonalPricingPeriod};
use crate::models::raw::{
    ExtendedDate, RawDate, RawNumber, RawPricingComponent, RawPricingPeriod,
};

pub fn try_number(raw: &RawNumber) -> Result<f64, ParseFailure> {
    let parsed = match raw {
        RawNumber::Number(n) => Some(*n),
        RawNumber::Text(text) => text.trim().parse::<f64>().ok(),
        RawNumber::Wrapped(wrapped) => wrapped.value.trim().parse::<f64>().ok(),
        RawNumber::Decimal(decimal) => decimal.to_string().parse::<f64>().ok(),
        RawNumber::Other(serde_json::Value::Number(n)) => n.as_f64(),
        RawNumber::Other(_) => None,
    };

    parsed.filter(|n| n.is_finite()).ok_or_else(|| ParseFailure {
        kind: "number",
        input: format!("{:?}", raw),
    })
}

/// Finite number for any representation, `0.0` when it cannot be read.
pub fn to_canonical_number(raw: &RawNumber) -> f64 {
    try_number(raw).unwrap_or_else(|failure| {
        debug!("{}; using 0", failure);
        0.0
    })
}

pub fn parse_date_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn try_date(raw: &RawDate) -> Result<DateTime<Utc>, ParseFailure> {
    let parsed = match raw {
        RawDate::Millis(millis) => DateTime::from_timestamp_millis(*millis),
        RawDate::Text(text) => parse_date_str(text),
        RawDate::Extended { date } => match date {
            ExtendedDate::Millis(millis) => DateTime::from_timestamp_millis(*millis),
            ExtendedDate::Text(text) => parse_date_str(text),
            ExtendedDate::Long { value } => value
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis),
        },
        RawDate::Other(_) => None,
    };

    parsed
        .map(|date| date.trunc_subsecs(3))
        .ok_or_else(|| ParseFailure {
            kind: "date",
            input: format!("{:?}", raw),
        })
}

/// Canonical timestamp for any representation, "now" when it cannot be read.
pub fn to_canonical_date(raw: &RawDate) -> DateTime<Utc> {
    try_date(raw).unwrap_or_else(|failure| {
        debug!("{}; using current time", failure);
        Utc::now().trunc_subsecs(3)
    })
}

pub fn to_iso_string(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Customer-facing sum of component prices. Purchase prices are ignored.
pub fn total_component_price(components: &[PricingComponent]) -> f64 {
    components.iter().map(|component| component.price).sum()
}

pub fn sort_by_start_date(periods: &mut [SeasonalPricingPeriod]) {
    periods.sort_by(|a, b| a.start_date.cmp(&b.start_date));
}

fn normalize_component(raw: RawPricingComponent) -> PricingComponent {
    PricingComponent {
        id: raw.id.as_ref().and_then(|id| id.to_object_id()),
        attribute_id: raw.attribute_id.unwrap_or_default(),
        price: raw.price.as_ref().map(to_canonical_number).unwrap_or(0.0),
        purchase_price: raw.purchase_price.as_ref().map(to_canonical_number),
        description: raw.description,
    }
}

pub fn normalize_period(raw: RawPricingPeriod) -> SeasonalPricingPeriod {
    let start_date = match &raw.start_date {
        Some(date) => to_canonical_date(date),
        None => to_canonical_date(&RawDate::Other(serde_json::Value::Null)),
    };
    let end_date = match &raw.end_date {
        Some(date) => to_canonical_date(date),
        None => start_date,
    };

    let number_of_rooms = raw
        .number_of_rooms
        .as_ref()
        .map(to_canonical_number)
        .unwrap_or(1.0)
        .round()
        .max(1.0) as u32;

    let pricing_components: Vec<PricingComponent> = raw
        .pricing_components
        .into_iter()
        .map(normalize_component)
        .collect();
    let total_component_price = total_component_price(&pricing_components);

    SeasonalPricingPeriod {
        id: raw.id.as_ref().and_then(|id| id.to_object_id()),
        variant_id: raw.variant_id.as_ref().and_then(|id| id.to_object_id()),
        start_date,
        end_date,
        meal_plan_id: raw.meal_plan_id.unwrap_or_default(),
        number_of_rooms,
        vehicle_type_id: raw.vehicle_type_id,
        is_group_pricing: raw.is_group_pricing.unwrap_or(false),
        description: raw.description,
        pricing_components,
        location_seasonal_period_id: raw.location_seasonal_period_id,
        total_price: raw.total_price.as_ref().map(to_canonical_number),
        total_component_price,
    }
}

/// Canonical periods, ordered by start date (stable for equal starts).
pub fn normalize(periods: Vec<RawPricingPeriod>) -> Vec<SeasonalPricingPeriod> {
    let mut normalized: Vec<SeasonalPricingPeriod> =
        periods.into_iter().map(normalize_period).collect();
    sort_by_start_date(&mut normalized);
    normalized
}
