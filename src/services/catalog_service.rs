//! Catalog lookups
//!
//! Hotels, meal plans, vehicle types, pricing attributes and room prices
//! come from an external catalog. Fetch failures never stop an editing
//! session: they degrade to an empty result plus a warning for the user.
//!
//! Room prices are cached under the full set of inputs that produced them,
//! so a slow response for an old edit can land at any time without
//! replacing the answer for the current one. Cached rates expire so
//! catalog rate changes show up without a restart.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::LookupError;
use crate::models::catalog::{DateRange, Hotel, MealPlan, PricingAttribute, RoomPrice, VehicleType};
use crate::models::variant::ItineraryDay;
use crate::services::hotel_mapping_service::HotelMappingService;
use crate::services::pricing_service::PricingService;
use crate::services::variant_service::PackageVariants;

#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn hotels(&self) -> Result<Vec<Hotel>, LookupError>;
    async fn meal_plans(&self) -> Result<Vec<MealPlan>, LookupError>;
    async fn vehicle_types(&self) -> Result<Vec<VehicleType>, LookupError>;
    async fn pricing_attributes(&self) -> Result<Vec<PricingAttribute>, LookupError>;
    async fn room_prices(
        &self,
        hotel_id: &str,
        range: &DateRange,
        meal_plan_id: &str,
    ) -> Result<Vec<RoomPrice>, LookupError>;
}

/// Result of a lookup that is allowed to fail softly.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome<T> {
    pub value: T,
    pub warning: Option<String>,
}

fn degrade<T: Default>(result: Result<T, LookupError>) -> LookupOutcome<T> {
    match result {
        Ok(value) => LookupOutcome {
            value,
            warning: None,
        },
        Err(err) => {
            warn!("{}", err);
            LookupOutcome {
                value: T::default(),
                warning: Some(format!("{}; showing no {} for now", err, err.resource)),
            }
        }
    }
}

pub async fn fetch_room_prices(
    lookup: &dyn CatalogLookup,
    hotel_id: &str,
    range: &DateRange,
    meal_plan_id: &str,
) -> LookupOutcome<Vec<RoomPrice>> {
    degrade(lookup.room_prices(hotel_id, range, meal_plan_id).await)
}

/// Resolved catalog data used while building comparisons.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    hotels: HashMap<String, Hotel>,
    meal_plans: HashMap<String, MealPlan>,
    vehicle_types: HashMap<String, VehicleType>,
    attributes: HashMap<String, PricingAttribute>,
}

impl Catalog {
    pub fn new(
        hotels: Vec<Hotel>,
        meal_plans: Vec<MealPlan>,
        vehicle_types: Vec<VehicleType>,
        attributes: Vec<PricingAttribute>,
    ) -> Self {
        Self {
            hotels: hotels.into_iter().map(|h| (h.id.clone(), h)).collect(),
            meal_plans: meal_plans.into_iter().map(|m| (m.id.clone(), m)).collect(),
            vehicle_types: vehicle_types.into_iter().map(|v| (v.id.clone(), v)).collect(),
            attributes: attributes.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    /// Fetch every list; failed lists are empty and reported as warnings.
    pub async fn load(lookup: &dyn CatalogLookup) -> LookupOutcome<Catalog> {
        let hotels = degrade(lookup.hotels().await);
        let meal_plans = degrade(lookup.meal_plans().await);
        let vehicle_types = degrade(lookup.vehicle_types().await);
        let attributes = degrade(lookup.pricing_attributes().await);

        let warnings: Vec<String> = [
            hotels.warning,
            meal_plans.warning,
            vehicle_types.warning,
            attributes.warning,
        ]
        .into_iter()
        .flatten()
        .collect();

        LookupOutcome {
            value: Catalog::new(
                hotels.value,
                meal_plans.value,
                vehicle_types.value,
                attributes.value,
            ),
            warning: if warnings.is_empty() {
                None
            } else {
                Some(warnings.join("; "))
            },
        }
    }

    pub fn hotel(&self, id: &str) -> Option<&Hotel> {
        self.hotels.get(id)
    }

    pub fn meal_plan(&self, id: &str) -> Option<&MealPlan> {
        self.meal_plans.get(id)
    }

    pub fn vehicle_type(&self, id: &str) -> Option<&VehicleType> {
        self.vehicle_types.get(id)
    }

    /// Display name of a pricing attribute, or the id itself when unknown.
    pub fn attribute_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.attributes
            .get(id)
            .map(|attribute| attribute.name.as_str())
            .unwrap_or(id)
    }
}

/// In-memory catalog, used when no database is configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pub hotels: Vec<Hotel>,
    pub meal_plans: Vec<MealPlan>,
    pub vehicle_types: Vec<VehicleType>,
    pub pricing_attributes: Vec<PricingAttribute>,
    pub room_prices: HashMap<String, Vec<RoomPrice>>,
}

#[async_trait]
impl CatalogLookup for StaticCatalog {
    async fn hotels(&self) -> Result<Vec<Hotel>, LookupError> {
        Ok(self.hotels.clone())
    }

    async fn meal_plans(&self) -> Result<Vec<MealPlan>, LookupError> {
        Ok(self.meal_plans.clone())
    }

    async fn vehicle_types(&self) -> Result<Vec<VehicleType>, LookupError> {
        Ok(self.vehicle_types.clone())
    }

    async fn pricing_attributes(&self) -> Result<Vec<PricingAttribute>, LookupError> {
        Ok(self.pricing_attributes.clone())
    }

    async fn room_prices(
        &self,
        hotel_id: &str,
        _range: &DateRange,
        meal_plan_id: &str,
    ) -> Result<Vec<RoomPrice>, LookupError> {
        let meal_plan = self
            .meal_plans
            .iter()
            .find(|plan| plan.id == meal_plan_id)
            .map(|plan| plan.name.as_str())
            .unwrap_or(meal_plan_id);

        Ok(self
            .room_prices
            .get(hotel_id)
            .map(|prices| {
                prices
                    .iter()
                    .filter(|price| price.meal_plan == meal_plan || price.meal_plan == meal_plan_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Every input of a room price fetch. Two fetches with the same query
/// return the same rates, whichever variant or package asked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomRateQuery {
    pub hotel_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub meal_plan_id: String,
}

/// A room price fetch plus the variant period it was made for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomPriceKey {
    pub variant_index: usize,
    pub period_index: usize,
    pub query: RoomRateQuery,
}

pub const DEFAULT_ROOM_PRICE_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_ROOM_PRICE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct CachedRates {
    prices: Vec<RoomPrice>,
    fetched_at: Instant,
    sequence: u64,
}

/// Room rates by query. Entries expire after `ttl`; past `capacity` the
/// least recently stored entry is dropped first.
#[derive(Debug, Clone)]
pub struct RoomPriceCache {
    entries: HashMap<RoomRateQuery, CachedRates>,
    ttl: Duration,
    capacity: usize,
    next_sequence: u64,
}

impl Default for RoomPriceCache {
    fn default() -> Self {
        Self::with_limits(DEFAULT_ROOM_PRICE_TTL, DEFAULT_ROOM_PRICE_CAPACITY)
    }
}

impl RoomPriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    fn is_fresh(&self, entry: &CachedRates) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }

    /// Store a fetch result. The query fully determines the result, so
    /// inserting the same query again is harmless whatever order results arrive in.
    pub fn insert(&mut self, query: RoomRateQuery, prices: Vec<RoomPrice>) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);

        if !self.entries.contains_key(&query) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.sequence)
                .map(|(stale, _)| stale.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }

        self.next_sequence += 1;
        self.entries.insert(
            query,
            CachedRates {
                prices,
                fetched_at: Instant::now(),
                sequence: self.next_sequence,
            },
        );
    }

    pub fn get(&self, query: &RoomRateQuery) -> Option<&[RoomPrice]> {
        self.entries
            .get(query)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.prices.as_slice())
    }

    pub fn contains(&self, query: &RoomRateQuery) -> bool {
        self.get(query).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomBreakdown {
    pub variant_index: usize,
    pub period_index: usize,
    pub hotel_id: String,
    pub hotel_name: Option<String>,
    pub number_of_rooms: u32,
    pub prices: Vec<RoomPrice>,
    pub room_cost: Option<f64>,
}

/// Every room price fetch the current variants need, one per distinct
/// hotel in each period of each variant.
pub fn room_price_keys(variants: &PackageVariants, days: &[ItineraryDay]) -> Vec<RoomPriceKey> {
    let mut keys = Vec::new();
    for (variant_index, variant) in variants.iter().enumerate() {
        let hotel_ids: BTreeSet<&str> = days
            .iter()
            .filter_map(|day| HotelMappingService::get_mapping(variant, day))
            .collect();

        for (period_index, period) in variant.seasonal_pricings.iter().enumerate() {
            for hotel_id in &hotel_ids {
                keys.push(RoomPriceKey {
                    variant_index,
                    period_index,
                    query: RoomRateQuery {
                        hotel_id: hotel_id.to_string(),
                        start: period.start_date,
                        end: period.end_date,
                        meal_plan_id: period.meal_plan_id.clone(),
                    },
                });
            }
        }
    }
    keys
}

/// Rates for one request, taken from the cache or fetched.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRoomPrices {
    pub prices: HashMap<RoomRateQuery, Vec<RoomPrice>>,
    pub warnings: Vec<String>,
}

/// Resolve every key's rates. Cache hits are copied out under the lock;
/// misses are fetched with the lock released and stored afterwards.
pub async fn resolve_room_prices(
    lookup: &dyn CatalogLookup,
    cache: &Mutex<RoomPriceCache>,
    keys: &[RoomPriceKey],
) -> ResolvedRoomPrices {
    let mut resolved = ResolvedRoomPrices::default();
    let mut missing: Vec<RoomRateQuery> = Vec::new();
    {
        let cache = cache.lock().await;
        for key in keys {
            if resolved.prices.contains_key(&key.query) || missing.contains(&key.query) {
                continue;
            }
            match cache.get(&key.query) {
                Some(prices) => {
                    resolved.prices.insert(key.query.clone(), prices.to_vec());
                }
                None => missing.push(key.query.clone()),
            }
        }
    }

    let mut fetched = Vec::new();
    for query in missing {
        let range = DateRange {
            start: query.start,
            end: query.end,
        };
        let outcome = fetch_room_prices(lookup, &query.hotel_id, &range, &query.meal_plan_id).await;
        match outcome.warning {
            // Failed fetches stay out of the cache so the next request retries them.
            Some(warning) => resolved.warnings.push(warning),
            None => fetched.push((query, outcome.value)),
        }
    }

    if !fetched.is_empty() {
        let mut cache = cache.lock().await;
        for (query, prices) in fetched {
            cache.insert(query.clone(), prices.clone());
            resolved.prices.insert(query, prices);
        }
    }
    resolved
}

pub fn room_breakdown(
    variants: &PackageVariants,
    catalog: &Catalog,
    resolved: &ResolvedRoomPrices,
    keys: &[RoomPriceKey],
) -> Vec<RoomBreakdown> {
    keys.iter()
        .map(|key| {
            let prices = resolved.prices.get(&key.query).cloned().unwrap_or_default();
            let number_of_rooms = variants
                .get(key.variant_index)
                .and_then(|variant| variant.seasonal_pricings.get(key.period_index))
                .map(|period| period.number_of_rooms)
                .unwrap_or(1);
            RoomBreakdown {
                variant_index: key.variant_index,
                period_index: key.period_index,
                hotel_id: key.query.hotel_id.clone(),
                hotel_name: catalog.hotel(&key.query.hotel_id).map(|hotel| hotel.name.clone()),
                number_of_rooms,
                room_cost: PricingService::calculate_room_cost(&prices, number_of_rooms),
                prices,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingCatalog;

    #[async_trait]
    impl CatalogLookup for FailingCatalog {
        async fn hotels(&self) -> Result<Vec<Hotel>, LookupError> {
            Err(LookupError::new("hotels", "connection refused"))
        }

        async fn meal_plans(&self) -> Result<Vec<MealPlan>, LookupError> {
            Ok(vec![])
        }

        async fn vehicle_types(&self) -> Result<Vec<VehicleType>, LookupError> {
            Ok(vec![])
        }

        async fn pricing_attributes(&self) -> Result<Vec<PricingAttribute>, LookupError> {
            Ok(vec![])
        }

        async fn room_prices(
            &self,
            _hotel_id: &str,
            _range: &DateRange,
            _meal_plan_id: &str,
        ) -> Result<Vec<RoomPrice>, LookupError> {
            Err(LookupError::new("room prices", "timeout"))
        }
    }

    fn range() -> DateRange {
        DateRange {
            start: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap(),
        }
    }

    fn query(hotel_id: &str, meal_plan_id: &str) -> RoomRateQuery {
        let range = range();
        RoomRateQuery {
            hotel_id: hotel_id.to_string(),
            start: range.start,
            end: range.end,
            meal_plan_id: meal_plan_id.to_string(),
        }
    }

    fn key(variant_index: usize, hotel_id: &str) -> RoomPriceKey {
        RoomPriceKey {
            variant_index,
            period_index: 0,
            query: query(hotel_id, "MAP"),
        }
    }

    fn suite(price: f64) -> RoomPrice {
        RoomPrice {
            room_type: "Suite".to_string(),
            occupancy_type: "Single".to_string(),
            meal_plan: "MAP".to_string(),
            price,
        }
    }

    /// Static rates that count how often they are asked for.
    struct CountingCatalog {
        rates: StaticCatalog,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogLookup for CountingCatalog {
        async fn hotels(&self) -> Result<Vec<Hotel>, LookupError> {
            self.rates.hotels().await
        }

        async fn meal_plans(&self) -> Result<Vec<MealPlan>, LookupError> {
            self.rates.meal_plans().await
        }

        async fn vehicle_types(&self) -> Result<Vec<VehicleType>, LookupError> {
            self.rates.vehicle_types().await
        }

        async fn pricing_attributes(&self) -> Result<Vec<PricingAttribute>, LookupError> {
            self.rates.pricing_attributes().await
        }

        async fn room_prices(
            &self,
            hotel_id: &str,
            range: &DateRange,
            meal_plan_id: &str,
        ) -> Result<Vec<RoomPrice>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rates.room_prices(hotel_id, range, meal_plan_id).await
        }
    }

    #[test]
    fn test_failed_lookup_degrades_to_empty() {
        let outcome = tokio_test::block_on(fetch_room_prices(&FailingCatalog, "h1", &range(), "MAP"));
        assert!(outcome.value.is_empty());
        assert!(outcome.warning.unwrap().contains("timeout"));

        let catalog = tokio_test::block_on(Catalog::load(&FailingCatalog));
        assert!(catalog.value.hotel("h1").is_none());
        assert!(catalog.warning.unwrap().contains("hotels"));
    }

    #[test]
    fn test_static_catalog_filters_by_meal_plan() {
        let mut room_prices = HashMap::new();
        room_prices.insert(
            "h1".to_string(),
            vec![
                RoomPrice {
                    room_type: "Deluxe".to_string(),
                    occupancy_type: "Double".to_string(),
                    meal_plan: "MAP".to_string(),
                    price: 150.0,
                },
                RoomPrice {
                    room_type: "Deluxe".to_string(),
                    occupancy_type: "Double".to_string(),
                    meal_plan: "CP".to_string(),
                    price: 110.0,
                },
            ],
        );
        let catalog = StaticCatalog {
            room_prices,
            ..Default::default()
        };

        let outcome = tokio_test::block_on(fetch_room_prices(&catalog, "h1", &range(), "MAP"));
        assert_eq!(outcome.value.len(), 1);
        assert_eq!(outcome.warning, None);

        let empty = tokio_test::block_on(fetch_room_prices(&catalog, "unknown", &range(), "MAP"));
        assert!(empty.value.is_empty());
        assert_eq!(empty.warning, None);
    }

    #[test]
    fn test_cache_keys_on_every_input() {
        let mut cache = RoomPriceCache::new();
        let price = suite(300.0);

        // The response for the newer meal plan arrives first, the stale one after it.
        cache.insert(query("h1", "CP"), vec![]);
        cache.insert(query("h1", "MAP"), vec![price.clone()]);
        cache.insert(query("h1", "CP"), vec![]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&query("h1", "MAP")), Some(&[price][..]));
    }

    #[test]
    fn test_cache_expires_and_stays_bounded() {
        let mut expired = RoomPriceCache::with_limits(Duration::ZERO, 8);
        expired.insert(query("h1", "MAP"), vec![suite(300.0)]);
        assert!(!expired.contains(&query("h1", "MAP")));

        let mut bounded = RoomPriceCache::with_limits(Duration::from_secs(60), 2);
        bounded.insert(query("h1", "MAP"), vec![suite(100.0)]);
        bounded.insert(query("h2", "MAP"), vec![suite(200.0)]);
        bounded.insert(query("h3", "MAP"), vec![suite(300.0)]);

        assert_eq!(bounded.len(), 2);
        assert!(!bounded.contains(&query("h1", "MAP")));
        assert!(bounded.contains(&query("h3", "MAP")));
    }

    #[test]
    fn test_resolve_fetches_each_query_once() {
        let catalog = CountingCatalog {
            rates: StaticCatalog {
                room_prices: HashMap::from([("h1".to_string(), vec![suite(250.0)])]),
                ..Default::default()
            },
            calls: AtomicUsize::new(0),
        };
        let cache = Mutex::new(RoomPriceCache::new());
        // Two variants sharing a hotel and season need a single fetch
        let keys = vec![key(0, "h1"), key(1, "h1")];

        let first = tokio_test::block_on(resolve_room_prices(&catalog, &cache, &keys));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.prices.get(&query("h1", "MAP")), Some(&vec![suite(250.0)]));
        assert!(first.warnings.is_empty());

        let second = tokio_test::block_on(resolve_room_prices(&catalog, &cache, &keys));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.prices.len(), 1);
    }

    #[test]
    fn test_failed_fetch_is_not_cached() {
        let cache = Mutex::new(RoomPriceCache::new());
        let resolved = tokio_test::block_on(resolve_room_prices(&FailingCatalog, &cache, &[key(0, "h1")]));

        assert!(resolved.prices.is_empty());
        assert_eq!(resolved.warnings.len(), 1);
        assert!(tokio_test::block_on(cache.lock()).is_empty());
    }

    #[test]
    fn test_attribute_name_falls_back_to_id() {
        let catalog = Catalog::new(
            vec![],
            vec![],
            vec![],
            vec![PricingAttribute {
                id: "attr-1".to_string(),
                name: "Accommodation".to_string(),
            }],
        );
        assert_eq!(catalog.attribute_name("attr-1"), "Accommodation");
        assert_eq!(catalog.attribute_name("attr-2"), "attr-2");
    }
}
