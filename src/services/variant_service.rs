use log::info;
use mongodb::bson::oid::ObjectId;

use crate::error::VariantError;
use crate::models::pricing::{PeriodDraft, SeasonalPricingPeriod};
use crate::models::variant::Variant;
use crate::services::hotel_mapping_service::HotelMappingService;
use crate::services::seasonal_pricing_service::SeasonalPricingService;

/// The variants of one package while it is being edited.
///
/// Never empty, kept in `sort_order`, and at most one variant is the default.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageVariants {
    variants: Vec<Variant>,
}

impl PackageVariants {
    pub fn new(first: Variant) -> Self {
        let mut variants = Self {
            variants: vec![first],
        };
        variants.renumber();
        variants
    }

    /// Load a persisted list. Fails when there is nothing to load.
    pub fn from_variants(mut variants: Vec<Variant>) -> Result<Self, VariantError> {
        if variants.is_empty() {
            return Err(VariantError::VariantNotFound(
                "package has no variants".to_string(),
            ));
        }
        variants.sort_by_key(|variant| variant.sort_order);

        // Keep the first default if storage ever held more than one.
        let mut seen_default = false;
        for variant in &mut variants {
            if variant.is_default && seen_default {
                variant.is_default = false;
            }
            seen_default |= variant.is_default;
        }

        Ok(Self { variants })
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter()
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.variants
    }

    pub fn into_inner(self) -> Vec<Variant> {
        self.variants
    }

    pub fn get(&self, index: usize) -> Option<&Variant> {
        self.variants.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Variant, VariantError> {
        self.variants
            .get_mut(index)
            .ok_or_else(|| VariantError::VariantNotFound(format!("index {}", index)))
    }

    pub fn position_of(&self, id: &ObjectId) -> Result<usize, VariantError> {
        self.variants
            .iter()
            .position(|variant| variant.id.as_ref() == Some(id))
            .ok_or_else(|| VariantError::VariantNotFound(id.to_hex()))
    }

    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.is_default)
    }

    /// Append a variant, returning its index.
    pub fn add(&mut self, variant: Variant) -> usize {
        let make_default = variant.is_default;
        self.variants.push(variant);
        let index = self.variants.len() - 1;
        self.variants[index].sort_order = index as i32;
        if make_default {
            self.mark_default(index);
        }
        index
    }

    /// New unsaved variant sharing the template's hotels and price modifier.
    /// Pricing periods belong to the template and are not copied.
    pub fn add_from_template(
        &mut self,
        template_index: usize,
        name: impl Into<String>,
    ) -> Result<usize, VariantError> {
        let template = self
            .variants
            .get(template_index)
            .ok_or_else(|| VariantError::VariantNotFound(format!("index {}", template_index)))?;

        let mut variant = Variant::new(name);
        variant.description = template.description.clone();
        variant.price_modifier = template.price_modifier;
        HotelMappingService::copy_mappings(template, &mut variant);

        Ok(self.add(variant))
    }

    /// Remove a variant. The last one cannot be removed; if the default is
    /// removed the first remaining variant becomes the default.
    pub fn remove(&mut self, index: usize) -> Result<Variant, VariantError> {
        if index >= self.variants.len() {
            return Err(VariantError::VariantNotFound(format!("index {}", index)));
        }
        if self.variants.len() == 1 {
            return Err(VariantError::LastVariant);
        }

        let removed = self.variants.remove(index);
        if removed.is_default {
            self.variants[0].is_default = true;
            info!(
                "Default variant '{}' removed; '{}' is now the default",
                removed.name, self.variants[0].name
            );
        }
        self.renumber();
        Ok(removed)
    }

    pub fn set_default(&mut self, index: usize) -> Result<(), VariantError> {
        if index >= self.variants.len() {
            return Err(VariantError::VariantNotFound(format!("index {}", index)));
        }
        self.mark_default(index);
        Ok(())
    }

    /// Move a variant to a new position and renumber `sort_order`.
    pub fn move_variant(&mut self, from: usize, to: usize) -> Result<(), VariantError> {
        if from >= self.variants.len() || to >= self.variants.len() {
            return Err(VariantError::VariantNotFound(format!("index {}", from.max(to))));
        }
        let variant = self.variants.remove(from);
        self.variants.insert(to, variant);
        self.renumber();
        Ok(())
    }

    /// Record the id storage assigned on first save.
    pub fn assign_id(&mut self, index: usize, id: ObjectId) -> Result<(), VariantError> {
        let variant = self.get_mut(index)?;
        for period in &mut variant.seasonal_pricings {
            period.variant_id = Some(id);
        }
        variant.id = Some(id);
        Ok(())
    }

    pub fn copy_hotel_mappings(&mut self, from: usize, to: usize) -> Result<(), VariantError> {
        let source = self
            .variants
            .get(from)
            .cloned()
            .ok_or_else(|| VariantError::VariantNotFound(format!("index {}", from)))?;
        let target = self.get_mut(to)?;
        HotelMappingService::copy_mappings(&source, target);
        Ok(())
    }

    pub fn create_period(
        &mut self,
        index: usize,
        draft: &PeriodDraft,
    ) -> Result<SeasonalPricingPeriod, VariantError> {
        SeasonalPricingService::create(self.get_mut(index)?, draft)
    }

    pub fn update_period(
        &mut self,
        period_id: &ObjectId,
        draft: &PeriodDraft,
    ) -> Result<SeasonalPricingPeriod, VariantError> {
        let index = self.owner_of(period_id)?;
        SeasonalPricingService::update(&mut self.variants[index], period_id, draft)
    }

    pub fn delete_period(&mut self, period_id: &ObjectId) -> Result<SeasonalPricingPeriod, VariantError> {
        let index = self.owner_of(period_id)?;
        SeasonalPricingService::delete(&mut self.variants[index], period_id)
    }

    /// Index of the variant holding `period_id`.
    pub fn owner_of(&self, period_id: &ObjectId) -> Result<usize, VariantError> {
        self.variants
            .iter()
            .position(|variant| {
                variant
                    .seasonal_pricings
                    .iter()
                    .any(|period| period.id.as_ref() == Some(period_id))
            })
            .ok_or_else(|| VariantError::PeriodNotFound(period_id.to_hex()))
    }

    fn mark_default(&mut self, index: usize) {
        for (i, variant) in self.variants.iter_mut().enumerate() {
            variant.is_default = i == index;
        }
    }

    fn renumber(&mut self) {
        for (i, variant) in self.variants.iter_mut().enumerate() {
            variant.sort_order = i as i32;
        }
    }
}
