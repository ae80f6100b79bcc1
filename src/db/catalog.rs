use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Database};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::LookupError;
use crate::models::catalog::{DateRange, Hotel, MealPlan, PricingAttribute, RoomPrice, VehicleType};
use crate::models::raw::RawDate;
use crate::services::catalog_service::CatalogLookup;
use crate::services::normalizer;

/// Room rate as stored in the catalog, valid for an optional date window.
#[derive(Debug, Deserialize)]
struct RoomRateDocument {
    room_type: String,
    occupancy_type: String,
    meal_plan: String,
    price: f64,
    #[serde(default)]
    valid_from: Option<RawDate>,
    #[serde(default)]
    valid_to: Option<RawDate>,
}

impl RoomRateDocument {
    fn applies_to(&self, range: &DateRange) -> bool {
        let starts_in_time = match &self.valid_from {
            Some(from) => normalizer::try_date(from).map_or(true, |from| from <= range.end),
            None => true,
        };
        let ends_in_time = match &self.valid_to {
            Some(to) => normalizer::try_date(to).map_or(true, |to| to >= range.start),
            None => true,
        };
        starts_in_time && ends_in_time
    }
}

pub struct MongoCatalog {
    database: Database,
}

impl MongoCatalog {
    pub fn new(client: Arc<Client>, database: &str) -> Self {
        Self {
            database: client.database(database),
        }
    }

    async fn list<T>(&self, collection: &'static str) -> Result<Vec<T>, LookupError>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        let cursor = self
            .database
            .collection::<T>(collection)
            .find(doc! {})
            .await
            .map_err(|e| LookupError::new(collection, e.to_string()))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| LookupError::new(collection, e.to_string()))
    }
}

#[async_trait]
impl CatalogLookup for MongoCatalog {
    async fn hotels(&self) -> Result<Vec<Hotel>, LookupError> {
        self.list("Hotels").await
    }

    async fn meal_plans(&self) -> Result<Vec<MealPlan>, LookupError> {
        self.list("MealPlans").await
    }

    async fn vehicle_types(&self) -> Result<Vec<VehicleType>, LookupError> {
        self.list("VehicleTypes").await
    }

    async fn pricing_attributes(&self) -> Result<Vec<PricingAttribute>, LookupError> {
        self.list("PricingAttributes").await
    }

    async fn room_prices(
        &self,
        hotel_id: &str,
        range: &DateRange,
        meal_plan_id: &str,
    ) -> Result<Vec<RoomPrice>, LookupError> {
        let cursor = self
            .database
            .collection::<RoomRateDocument>("RoomRates")
            .find(doc! {"hotel_id": hotel_id, "meal_plan_id": meal_plan_id})
            .await
            .map_err(|e| LookupError::new("room prices", e.to_string()))?;
        let rates: Vec<RoomRateDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| LookupError::new("room prices", e.to_string()))?;

        Ok(rates
            .into_iter()
            .filter(|rate| rate.applies_to(range))
            .map(|rate| RoomPrice {
                room_type: rate.room_type,
                occupancy_type: rate.occupancy_type,
                meal_plan: rate.meal_plan,
                price: rate.price,
            })
            .collect())
    }
}
