//! Persisted record shapes as they arrive from storage.
//!
//! Numbers may be native, textual or wrapped in an extended-JSON decimal;
//! dates may be ISO strings, epoch millis or `{"$date": ...}` documents.
//! Only `services::normalizer` looks inside these types.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::Decimal128;
use serde::{Deserialize, Serialize};

use super::pricing::{PricingComponent, SeasonalPricingPeriod};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
    Wrapped(WrappedNumber),
    /// Native BSON decimal, as read straight from a collection.
    Decimal(Decimal128),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedNumber {
    #[serde(
        rename = "$numberDecimal",
        alias = "$numberDouble",
        alias = "$numberLong",
        alias = "$numberInt"
    )]
    pub value: String,
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Number(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Millis(i64),
    Text(String),
    Extended {
        #[serde(rename = "$date")]
        date: ExtendedDate,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtendedDate {
    Millis(i64),
    Text(String),
    Long {
        #[serde(rename = "$numberLong")]
        value: String,
    },
}

impl From<&str> for RawDate {
    fn from(value: &str) -> Self {
        RawDate::Text(value.to_string())
    }
}

/// Identifier stored either as a native ObjectId or as its hex string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Oid(ObjectId),
    Text(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl RawId {
    pub fn to_object_id(&self) -> Option<ObjectId> {
        match self {
            RawId::Oid(oid) => Some(*oid),
            RawId::Text(text) | RawId::Extended { oid: text } => {
                ObjectId::parse_str(text.trim()).ok()
            }
        }
    }

    pub fn to_id_string(&self) -> String {
        match self {
            RawId::Oid(oid) => oid.to_hex(),
            RawId::Text(text) | RawId::Extended { oid: text } => text.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPricingComponent {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawId>,
    #[serde(alias = "attributeId", default)]
    pub attribute_id: Option<String>,
    #[serde(default)]
    pub price: Option<RawNumber>,
    #[serde(alias = "purchasePrice", default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<RawNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPricingPeriod {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawId>,
    #[serde(
        alias = "variantId",
        alias = "packageVariantId",
        alias = "package_variant_id",
        default
    )]
    pub variant_id: Option<RawId>,
    #[serde(alias = "startDate", default)]
    pub start_date: Option<RawDate>,
    #[serde(alias = "endDate", default)]
    pub end_date: Option<RawDate>,
    #[serde(alias = "mealPlanId", default)]
    pub meal_plan_id: Option<String>,
    #[serde(alias = "numberOfRooms", default)]
    pub number_of_rooms: Option<RawNumber>,
    #[serde(alias = "vehicleTypeId", default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type_id: Option<String>,
    #[serde(alias = "isGroupPricing", default)]
    pub is_group_pricing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "pricingComponents", default)]
    pub pricing_components: Vec<RawPricingComponent>,
    #[serde(
        alias = "locationSeasonalPeriodId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub location_seasonal_period_id: Option<String>,
    #[serde(alias = "totalPrice", default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<RawNumber>,
}

impl From<&PricingComponent> for RawPricingComponent {
    fn from(component: &PricingComponent) -> Self {
        Self {
            id: component.id.map(RawId::Oid),
            attribute_id: Some(component.attribute_id.clone()),
            price: Some(RawNumber::Number(component.price)),
            purchase_price: component.purchase_price.map(RawNumber::Number),
            description: component.description.clone(),
        }
    }
}

impl From<&SeasonalPricingPeriod> for RawPricingPeriod {
    fn from(period: &SeasonalPricingPeriod) -> Self {
        Self {
            id: period.id.map(RawId::Oid),
            variant_id: period.variant_id.map(RawId::Oid),
            start_date: Some(RawDate::Text(period.start_date_iso())),
            end_date: Some(RawDate::Text(period.end_date_iso())),
            meal_plan_id: Some(period.meal_plan_id.clone()),
            number_of_rooms: Some(RawNumber::Number(f64::from(period.number_of_rooms))),
            vehicle_type_id: period.vehicle_type_id.clone(),
            is_group_pricing: Some(period.is_group_pricing),
            description: period.description.clone(),
            pricing_components: period
                .pricing_components
                .iter()
                .map(RawPricingComponent::from)
                .collect(),
            location_seasonal_period_id: period.location_seasonal_period_id.clone(),
            total_price: period.total_price.map(RawNumber::Number),
        }
    }
}
