//! Storage of variants and their seasonal pricing periods.
//!
//! Variants are stored without their periods; periods live in their own
//! collection, keyed by package and carrying the id of the variant they
//! belong to. Periods always come back as raw records and go through the
//! normalizer before anything else sees them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use log::{info, warn};
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::RepositoryError;
use crate::models::pricing::SeasonalPricingPeriod;
use crate::models::raw::RawPricingPeriod;
use crate::models::variant::{HotelMappings, Variant};
use crate::services::normalizer;

const VARIANTS: &str = "Variants";
const SEASONAL_PRICING: &str = "SeasonalPricing";

#[async_trait]
pub trait VariantRepository: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Variants of a package in `sort_order`, without pricing periods.
    async fn list_variants(&self, package_id: &str) -> Result<Vec<Variant>, RepositoryError>;
    async fn insert_variant(&self, package_id: &str, variant: &Variant) -> Result<ObjectId, RepositoryError>;
    async fn update_variant(&self, package_id: &str, variant: &Variant) -> Result<(), RepositoryError>;
    /// Removes the variant together with its pricing periods.
    async fn delete_variant(&self, package_id: &str, variant_id: &ObjectId) -> Result<(), RepositoryError>;

    async fn list_periods(&self, package_id: &str) -> Result<Vec<RawPricingPeriod>, RepositoryError>;
    async fn insert_period(&self, package_id: &str, period: &SeasonalPricingPeriod) -> Result<(), RepositoryError>;
    async fn update_period(&self, package_id: &str, period: &SeasonalPricingPeriod) -> Result<(), RepositoryError>;
    async fn delete_period(&self, package_id: &str, period_id: &ObjectId) -> Result<(), RepositoryError>;
}

/// Variants of a package with their normalized periods attached.
pub async fn load_variants(
    repository: &dyn VariantRepository,
    package_id: &str,
) -> Result<Vec<Variant>, RepositoryError> {
    let mut variants = repository.list_variants(package_id).await?;
    let periods = normalizer::normalize(repository.list_periods(package_id).await?);

    for period in periods {
        let owner = period
            .variant_id
            .and_then(|id| variants.iter().position(|variant| variant.id == Some(id)));
        match owner {
            Some(index) => variants[index].seasonal_pricings.push(period),
            None => warn!(
                "Package {}: skipping pricing period {:?} with no matching variant",
                package_id, period.id
            ),
        }
    }

    Ok(variants)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VariantDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    package_id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    is_default: bool,
    #[serde(default)]
    sort_order: i32,
    #[serde(default)]
    price_modifier: f64,
    #[serde(default)]
    hotel_mappings: HotelMappings,
}

impl VariantDocument {
    fn new(id: ObjectId, package_id: &str, variant: &Variant) -> Self {
        Self {
            id,
            package_id: package_id.to_string(),
            name: variant.name.clone(),
            description: variant.description.clone(),
            is_default: variant.is_default,
            sort_order: variant.sort_order,
            price_modifier: variant.price_modifier,
            hotel_mappings: variant.hotel_mappings.clone(),
        }
    }

    fn into_variant(self) -> Variant {
        Variant {
            id: Some(self.id),
            name: self.name,
            description: self.description,
            is_default: self.is_default,
            sort_order: self.sort_order,
            price_modifier: self.price_modifier,
            hotel_mappings: self.hotel_mappings,
            seasonal_pricings: Vec::new(),
        }
    }
}

fn period_document(package_id: &str, period: &SeasonalPricingPeriod) -> Result<Document, RepositoryError> {
    let mut document = mongodb::bson::to_document(&RawPricingPeriod::from(period))?;
    document.insert("package_id", package_id);
    Ok(document)
}

fn stored_id(variant: &Variant) -> Result<ObjectId, RepositoryError> {
    variant
        .id
        .ok_or_else(|| RepositoryError::NotFound(format!("variant '{}' has no id", variant.name)))
}

fn stored_period_id(period: &SeasonalPricingPeriod) -> Result<ObjectId, RepositoryError> {
    period
        .id
        .ok_or_else(|| RepositoryError::NotFound("pricing period has no id".to_string()))
}

pub struct MongoVariantRepository {
    database: Database,
}

impl MongoVariantRepository {
    pub fn new(client: Arc<Client>, database: &str) -> Self {
        Self {
            database: client.database(database),
        }
    }

    fn variants(&self) -> Collection<VariantDocument> {
        self.database.collection(VARIANTS)
    }

    fn periods(&self) -> Collection<Document> {
        self.database.collection(SEASONAL_PRICING)
    }
}

#[async_trait]
impl VariantRepository for MongoVariantRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.database.run_command(doc! {"ping": 1}).await?;
        Ok(())
    }

    async fn list_variants(&self, package_id: &str) -> Result<Vec<Variant>, RepositoryError> {
        let cursor = self
            .variants()
            .find(doc! {"package_id": package_id})
            .sort(doc! {"sort_order": 1})
            .await?;
        let documents: Vec<VariantDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(VariantDocument::into_variant).collect())
    }

    async fn insert_variant(&self, package_id: &str, variant: &Variant) -> Result<ObjectId, RepositoryError> {
        let id = ObjectId::new();
        self.variants()
            .insert_one(VariantDocument::new(id, package_id, variant))
            .await?;
        info!("Inserted variant {} into package {}", id, package_id);
        Ok(id)
    }

    async fn update_variant(&self, package_id: &str, variant: &Variant) -> Result<(), RepositoryError> {
        let id = stored_id(variant)?;
        let result = self
            .variants()
            .replace_one(
                doc! {"_id": id, "package_id": package_id},
                VariantDocument::new(id, package_id, variant),
            )
            .await?;
        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound(id.to_hex()));
        }
        Ok(())
    }

    async fn delete_variant(&self, package_id: &str, variant_id: &ObjectId) -> Result<(), RepositoryError> {
        let result = self
            .variants()
            .delete_one(doc! {"_id": *variant_id, "package_id": package_id})
            .await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::NotFound(variant_id.to_hex()));
        }
        let periods = self
            .periods()
            .delete_many(doc! {"package_id": package_id, "variant_id": *variant_id})
            .await?;
        info!(
            "Deleted variant {} and {} pricing period(s) from package {}",
            variant_id, periods.deleted_count, package_id
        );
        Ok(())
    }

    async fn list_periods(&self, package_id: &str) -> Result<Vec<RawPricingPeriod>, RepositoryError> {
        let cursor = self
            .database
            .collection::<RawPricingPeriod>(SEASONAL_PRICING)
            .find(doc! {"package_id": package_id})
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_period(&self, package_id: &str, period: &SeasonalPricingPeriod) -> Result<(), RepositoryError> {
        self.periods()
            .insert_one(period_document(package_id, period)?)
            .await?;
        Ok(())
    }

    async fn update_period(&self, package_id: &str, period: &SeasonalPricingPeriod) -> Result<(), RepositoryError> {
        let id = stored_period_id(period)?;
        let result = self
            .periods()
            .replace_one(
                doc! {"_id": id, "package_id": package_id},
                period_document(package_id, period)?,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound(id.to_hex()));
        }
        Ok(())
    }

    async fn delete_period(&self, package_id: &str, period_id: &ObjectId) -> Result<(), RepositoryError> {
        let result = self
            .periods()
            .delete_one(doc! {"_id": *period_id, "package_id": package_id})
            .await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::NotFound(period_id.to_hex()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct StoredPackage {
    variants: Vec<Variant>,
    periods: Vec<RawPricingPeriod>,
}

/// Process-local storage, used when no MongoDB URI is configured and in tests.
#[derive(Debug, Default)]
pub struct InMemoryVariantRepository {
    packages: RwLock<HashMap<String, StoredPackage>>,
}

impl InMemoryVariantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw period as-is, whatever shape it has.
    pub async fn insert_raw_period(&self, package_id: &str, period: RawPricingPeriod) {
        let mut packages = self.packages.write().await;
        packages
            .entry(package_id.to_string())
            .or_default()
            .periods
            .push(period);
    }
}

fn raw_period_id(period: &RawPricingPeriod) -> Option<ObjectId> {
    period.id.as_ref().and_then(|id| id.to_object_id())
}

#[async_trait]
impl VariantRepository for InMemoryVariantRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_variants(&self, package_id: &str) -> Result<Vec<Variant>, RepositoryError> {
        let packages = self.packages.read().await;
        let mut variants = packages
            .get(package_id)
            .map(|package| package.variants.clone())
            .unwrap_or_default();
        variants.sort_by_key(|variant| variant.sort_order);
        Ok(variants)
    }

    async fn insert_variant(&self, package_id: &str, variant: &Variant) -> Result<ObjectId, RepositoryError> {
        let id = ObjectId::new();
        let mut stored = variant.clone();
        stored.id = Some(id);
        stored.seasonal_pricings.clear();

        let mut packages = self.packages.write().await;
        packages
            .entry(package_id.to_string())
            .or_default()
            .variants
            .push(stored);
        Ok(id)
    }

    async fn update_variant(&self, package_id: &str, variant: &Variant) -> Result<(), RepositoryError> {
        let id = stored_id(variant)?;
        let mut packages = self.packages.write().await;
        let slot = packages
            .get_mut(package_id)
            .and_then(|package| package.variants.iter_mut().find(|stored| stored.id == Some(id)))
            .ok_or_else(|| RepositoryError::NotFound(id.to_hex()))?;

        *slot = variant.clone();
        slot.seasonal_pricings.clear();
        Ok(())
    }

    async fn delete_variant(&self, package_id: &str, variant_id: &ObjectId) -> Result<(), RepositoryError> {
        let mut packages = self.packages.write().await;
        let package = packages
            .get_mut(package_id)
            .ok_or_else(|| RepositoryError::NotFound(variant_id.to_hex()))?;

        let before = package.variants.len();
        package.variants.retain(|variant| variant.id.as_ref() != Some(variant_id));
        if package.variants.len() == before {
            return Err(RepositoryError::NotFound(variant_id.to_hex()));
        }
        package.periods.retain(|period| {
            period.variant_id.as_ref().and_then(|id| id.to_object_id()).as_ref() != Some(variant_id)
        });
        Ok(())
    }

    async fn list_periods(&self, package_id: &str) -> Result<Vec<RawPricingPeriod>, RepositoryError> {
        let packages = self.packages.read().await;
        Ok(packages
            .get(package_id)
            .map(|package| package.periods.clone())
            .unwrap_or_default())
    }

    async fn insert_period(&self, package_id: &str, period: &SeasonalPricingPeriod) -> Result<(), RepositoryError> {
        self.insert_raw_period(package_id, RawPricingPeriod::from(period)).await;
        Ok(())
    }

    async fn update_period(&self, package_id: &str, period: &SeasonalPricingPeriod) -> Result<(), RepositoryError> {
        let id = stored_period_id(period)?;
        let mut packages = self.packages.write().await;
        let slot = packages
            .get_mut(package_id)
            .and_then(|package| {
                package
                    .periods
                    .iter_mut()
                    .find(|stored| raw_period_id(stored) == Some(id))
            })
            .ok_or_else(|| RepositoryError::NotFound(id.to_hex()))?;

        *slot = RawPricingPeriod::from(period);
        Ok(())
    }

    async fn delete_period(&self, package_id: &str, period_id: &ObjectId) -> Result<(), RepositoryError> {
        let mut packages = self.packages.write().await;
        let package = packages
            .get_mut(package_id)
            .ok_or_else(|| RepositoryError::NotFound(period_id.to_hex()))?;

        let before = package.periods.len();
        package
            .periods
            .retain(|period| raw_period_id(period).as_ref() != Some(period_id));
        if package.periods.len() == before {
            return Err(RepositoryError::NotFound(period_id.to_hex()));
        }
        Ok(())
    }
}
