use std::collections::BTreeMap;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::pricing::SeasonalPricingPeriod;
use crate::error::VariantError;

/// Stable identity of an itinerary day, assigned once when the day is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(String);

impl DayKey {
    /// The day's own id when it has one, otherwise a key derived from its number.
    pub fn for_day(id: Option<&str>, day_number: u32) -> Self {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => DayKey(id.to_string()),
            None => DayKey(format!("day-{}", day_number)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DayKey {
    fn from(value: &str) -> Self {
        DayKey(value.to_string())
    }
}

impl From<String> for DayKey {
    fn from(value: String) -> Self {
        DayKey(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ItineraryDayRecord", into = "ItineraryDayRecord")]
pub struct ItineraryDay {
    id: Option<String>,
    day_number: u32,
    title: String,
    key: DayKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItineraryDayRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(alias = "dayNumber")]
    day_number: u32,
    #[serde(default)]
    title: String,
}

impl From<ItineraryDayRecord> for ItineraryDay {
    fn from(record: ItineraryDayRecord) -> Self {
        ItineraryDay::new(record.id, record.day_number, record.title)
    }
}

impl From<ItineraryDay> for ItineraryDayRecord {
    fn from(day: ItineraryDay) -> Self {
        ItineraryDayRecord {
            id: day.id,
            day_number: day.day_number,
            title: day.title,
        }
    }
}

impl ItineraryDay {
    pub fn new(id: Option<String>, day_number: u32, title: impl Into<String>) -> Self {
        let key = DayKey::for_day(id.as_deref(), day_number);
        Self {
            id,
            day_number,
            title: title.into(),
            key,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn day_number(&self) -> u32 {
        self.day_number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn key(&self) -> &DayKey {
        &self.key
    }
}

/// A day of another itinerary used as the source of a bulk hotel apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDay {
    #[serde(alias = "dayNumber")]
    pub day_number: u32,
    #[serde(alias = "hotelId", default)]
    pub hotel_id: Option<String>,
}

/// Day → hotel assignments of one variant. A missing entry means the day
/// has no hotel yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotelMappings(BTreeMap<DayKey, String>);

impl HotelMappings {
    pub fn get(&self, key: &DayKey) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: DayKey, hotel_id: String) -> Option<String> {
        self.0.insert(key, hotel_id)
    }

    pub fn remove(&mut self, key: &DayKey) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DayKey, &str)> {
        self.0.iter().map(|(key, hotel)| (key, hotel.as_str()))
    }

    /// Moves entries stored under a bare day number (`"3"`) onto the day's
    /// stable key. Entries already under the stable key win.
    pub fn rekey_legacy(&mut self, days: &[ItineraryDay]) -> usize {
        let mut moved = 0;
        for day in days {
            let legacy = DayKey(day.day_number().to_string());
            if &legacy == day.key() {
                continue;
            }
            if let Some(hotel_id) = self.0.remove(&legacy) {
                if !self.0.contains_key(day.key()) {
                    self.0.insert(day.key().clone(), hotel_id);
                    moved += 1;
                }
            }
        }
        moved
    }
}

impl FromIterator<(DayKey, String)> for HotelMappings {
    fn from_iter<T: IntoIterator<Item = (DayKey, String)>>(iter: T) -> Self {
        HotelMappings(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub sort_order: i32,
    /// Signed percentage applied to period totals, e.g. `15.0` for +15%.
    #[serde(default)]
    pub price_modifier: f64,
    #[serde(default)]
    pub hotel_mappings: HotelMappings,
    #[serde(default)]
    pub seasonal_pricings: Vec<SeasonalPricingPeriod>,
}

impl Variant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            is_default: false,
            sort_order: 0,
            price_modifier: 0.0,
            hotel_mappings: HotelMappings::default(),
            seasonal_pricings: Vec::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn persisted_id(&self) -> Result<ObjectId, VariantError> {
        self.id.ok_or(VariantError::VariantNotPersisted)
    }

    /// Hex id used to key comparison inputs; unsaved variants fall back to their name.
    pub fn source_id(&self) -> String {
        self.id
            .map(|id| id.to_hex())
            .unwrap_or_else(|| self.name.clone())
    }
}
