use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingComponent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub attribute_id: String,
    pub price: f64,
    /// Internal cost. Never part of customer-facing totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A date-bounded pricing configuration belonging to one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPricingPeriod {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub variant_id: Option<ObjectId>,
    #[serde(with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_date: DateTime<Utc>,
    pub meal_plan_id: String,
    pub number_of_rooms: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type_id: Option<String>,
    #[serde(default)]
    pub is_group_pricing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pricing_components: Vec<PricingComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_seasonal_period_id: Option<String>,
    /// Externally stored total, used as the comparison total when positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    /// Sum of component prices, recomputed on every normalization.
    #[serde(default)]
    pub total_component_price: f64,
}

impl SeasonalPricingPeriod {
    pub fn start_date_iso(&self) -> String {
        self.start_date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_date_iso(&self) -> String {
        self.end_date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, other: &SeasonalPricingPeriod) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }
}

/// Editable form of a period. Every field is optional so validation can
/// name the first one that is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodDraft {
    #[serde(alias = "startDate", default)]
    pub start_date: Option<String>,
    #[serde(alias = "endDate", default)]
    pub end_date: Option<String>,
    #[serde(alias = "mealPlanId", default)]
    pub meal_plan_id: Option<String>,
    #[serde(alias = "numberOfRooms", default)]
    pub number_of_rooms: Option<f64>,
    #[serde(alias = "vehicleTypeId", default)]
    pub vehicle_type_id: Option<String>,
    #[serde(alias = "isGroupPricing", default)]
    pub is_group_pricing: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "pricingComponents", default)]
    pub pricing_components: Vec<ComponentDraft>,
    #[serde(alias = "locationSeasonalPeriodId", default)]
    pub location_seasonal_period_id: Option<String>,
    #[serde(alias = "totalPrice", default)]
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentDraft {
    #[serde(alias = "attributeId", default)]
    pub attribute_id: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(alias = "purchasePrice", default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|date| date.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
