use log::{debug, info};
use serde::Serialize;

use crate::error::VariantError;
use crate::models::variant::{DayKey, HotelMappings, ItineraryDay, SourceDay, Variant};

/// Outcome of a bulk apply. Unmapped days are a warning for the editor, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyReport {
    pub applied: usize,
    pub unmapped_days: Vec<u32>,
}

pub struct HotelMappingService;

impl HotelMappingService {
    /// Assign a hotel to a day, replacing any previous assignment.
    /// Whether the hotel exists is a catalog concern and is not checked here.
    pub fn set_mapping(variant: &mut Variant, day_key: DayKey, hotel_id: impl Into<String>) {
        let hotel_id = hotel_id.into();
        debug!(
            "Variant '{}': day {} -> hotel {}",
            variant.name,
            day_key.as_str(),
            hotel_id
        );
        variant.hotel_mappings.set(day_key, hotel_id);
    }

    pub fn clear_mapping(variant: &mut Variant, day_key: &DayKey) -> Option<String> {
        variant.hotel_mappings.remove(day_key)
    }

    pub fn get_mapping<'a>(variant: &'a Variant, day: &ItineraryDay) -> Option<&'a str> {
        variant.hotel_mappings.get(day.key())
    }

    /// Replace the target's whole map with a copy of the source's.
    pub fn copy_mappings(source: &Variant, target: &mut Variant) {
        Self::replace_mappings(target, source.hotel_mappings.clone());
        info!(
            "Copied {} hotel mappings from '{}' to '{}'",
            target.hotel_mappings.len(),
            source.name,
            target.name
        );
    }

    pub fn replace_mappings(target: &mut Variant, mappings: HotelMappings) {
        target.hotel_mappings = mappings;
    }

    /// Take hotels from another itinerary, pairing days by position.
    ///
    /// Both day lists must have the same length; on mismatch nothing is
    /// changed. The variant's map is rebuilt from the pairing, so a source
    /// day without a hotel leaves the matching day unassigned and is listed
    /// in the report.
    pub fn apply_from_external_day_set(
        variant: &mut Variant,
        current_days: &[ItineraryDay],
        external_days: &[SourceDay],
    ) -> Result<ApplyReport, VariantError> {
        if current_days.len() != external_days.len() {
            return Err(VariantError::DayCountMismatch {
                current: current_days.len(),
                external: external_days.len(),
            });
        }

        let mut mappings = HotelMappings::default();
        let mut unmapped_days = Vec::new();

        for (current, external) in current_days.iter().zip(external_days) {
            match external
                .hotel_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
            {
                Some(hotel_id) => {
                    mappings.set(current.key().clone(), hotel_id.to_string());
                }
                None => unmapped_days.push(current.day_number()),
            }
        }

        let report = ApplyReport {
            applied: mappings.len(),
            unmapped_days,
        };
        variant.hotel_mappings = mappings;

        if !report.unmapped_days.is_empty() {
            info!(
                "Variant '{}': no hotel in source itinerary for days {:?}",
                variant.name, report.unmapped_days
            );
        }

        Ok(report)
    }
}
