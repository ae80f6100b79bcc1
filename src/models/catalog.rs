use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::raw::RawId;

// Catalog records may be keyed by ObjectId or by a plain string.
fn deserialize_id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(|id| id.to_id_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    #[serde(rename = "_id", alias = "id", deserialize_with = "deserialize_id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    #[serde(rename = "_id", alias = "id", deserialize_with = "deserialize_id_string")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleType {
    #[serde(rename = "_id", alias = "id", deserialize_with = "deserialize_id_string")]
    pub id: String,
    pub name: String,
}

/// Kind of charge a pricing component represents, e.g. "Accommodation".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingAttribute {
    #[serde(rename = "_id", alias = "id", deserialize_with = "deserialize_id_string")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomPrice {
    pub room_type: String,
    pub occupancy_type: String,
    pub meal_plan: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
