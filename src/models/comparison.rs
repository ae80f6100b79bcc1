use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::raw::RawNumber;

pub const NOT_SPECIFIED: &str = "not specified";
pub const ABSENT_PRICE: &str = "—";
pub const UNKNOWN_TOTAL: &str = "unknown";

/// What a comparison knows about one variant, resolved from catalog data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub source_id: String,
    pub name: String,
    #[serde(default)]
    pub hotels: Vec<DayHotelSnapshot>,
    #[serde(default)]
    pub pricing: Vec<PricingSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHotelSnapshot {
    pub day_number: u32,
    pub hotel: HotelEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelEntry {
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub components: Vec<ComponentPrice>,
    #[serde(default)]
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentPrice {
    pub name: String,
    pub price: f64,
}

/// Coarse pricing kept outside the structured periods, keyed by variant source id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackPricing {
    #[serde(default)]
    pub components: Vec<FallbackComponent>,
    #[serde(alias = "totalCost", default)]
    pub total_cost: Option<RawNumber>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackComponent {
    #[serde(alias = "componentName")]
    pub name: String,
    pub price: RawNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HotelCell {
    Assigned(HotelEntry),
    NotSpecified,
}

impl Serialize for HotelCell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            HotelCell::Assigned(entry) => entry.serialize(serializer),
            HotelCell::NotSpecified => serializer.serialize_str(NOT_SPECIFIED),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceCell {
    Amount(f64),
    Absent,
}

impl Serialize for PriceCell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PriceCell::Amount(amount) => serializer.serialize_f64(*amount),
            PriceCell::Absent => serializer.serialize_str(ABSENT_PRICE),
        }
    }
}

/// A comparison total. Zero and unparseable totals are `Unknown`, never `Known(0.0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariantTotal {
    Known(f64),
    Unknown,
}

impl VariantTotal {
    pub fn amount(&self) -> Option<f64> {
        match self {
            VariantTotal::Known(amount) => Some(*amount),
            VariantTotal::Unknown => None,
        }
    }
}

impl Serialize for VariantTotal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            VariantTotal::Known(amount) => serializer.serialize_f64(*amount),
            VariantTotal::Unknown => serializer.serialize_str(UNKNOWN_TOTAL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparedVariant {
    pub source_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelRow {
    pub day_number: u32,
    pub cells: Vec<HotelCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub component: String,
    pub cells: Vec<PriceCell>,
}

/// Render-ready side-by-side comparison. Columns of every matrix follow `variants`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub variants: Vec<ComparedVariant>,
    pub day_axis: Vec<u32>,
    pub hotel_matrix: Vec<HotelRow>,
    pub component_axis: Vec<String>,
    pub price_matrix: Vec<PriceRow>,
    pub variant_totals: Vec<VariantTotal>,
    pub best_value: Vec<String>,
    /// Set when at least one total is unknown, so the best-value badge
    /// only reflects part of the compared variants.
    pub has_unknown_totals: bool,
}

impl ComparisonResult {
    pub fn column_of(&self, source_id: &str) -> Option<usize> {
        self.variants.iter().position(|v| v.source_id == source_id)
    }

    pub fn hotel_cell(&self, day_number: u32, source_id: &str) -> Option<&HotelCell> {
        let column = self.column_of(source_id)?;
        self.hotel_matrix
            .iter()
            .find(|row| row.day_number == day_number)
            .and_then(|row| row.cells.get(column))
    }

    pub fn price_cell(&self, component: &str, source_id: &str) -> Option<PriceCell> {
        let column = self.column_of(source_id)?;
        self.price_matrix
            .iter()
            .find(|row| row.component == component)
            .and_then(|row| row.cells.get(column).copied())
    }

    pub fn total(&self, source_id: &str) -> Option<VariantTotal> {
        let column = self.column_of(source_id)?;
        self.variant_totals.get(column).copied()
    }

    pub fn is_best_value(&self, source_id: &str) -> bool {
        self.best_value.iter().any(|id| id == source_id)
    }
}
