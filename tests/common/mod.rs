#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use package_variants_api::db::variant_repository::InMemoryVariantRepository;
use package_variants_api::models::catalog::{Hotel, MealPlan, PricingAttribute, RoomPrice};
use package_variants_api::routes::{self, AppState};
use package_variants_api::services::catalog_service::StaticCatalog;

pub const PACKAGE: &str = "sikkim-explorer";

pub struct TestApp {
    pub repository: Arc<InMemoryVariantRepository>,
    pub state: web::Data<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryVariantRepository::new());
        let state = web::Data::new(AppState::new(repository.clone(), Arc::new(test_catalog())));
        Self { repository, state }
    }

    pub fn create_app(&self) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    }
}

pub fn test_catalog() -> StaticCatalog {
    let hotel = |id: &str, name: &str, location: &str| Hotel {
        id: id.to_string(),
        name: name.to_string(),
        location: location.to_string(),
        category: Some("Deluxe".to_string()),
        images: None,
    };
    let attribute = |id: &str, name: &str| PricingAttribute {
        id: id.to_string(),
        name: name.to_string(),
    };
    let room = |room_type: &str, price: f64| RoomPrice {
        room_type: room_type.to_string(),
        occupancy_type: "Double".to_string(),
        meal_plan: "MAP".to_string(),
        price,
    };

    StaticCatalog {
        hotels: vec![
            hotel("h-1", "Cliffside Resort", "Pelling"),
            hotel("h-2", "Valley Inn", "Gangtok"),
            hotel("h-3", "Lakeview Lodge", "Lachung"),
        ],
        meal_plans: vec![MealPlan {
            id: "MAP".to_string(),
            name: "Modified American Plan".to_string(),
        }],
        vehicle_types: Vec::new(),
        pricing_attributes: vec![attribute("stay", "Stay"), attribute("transfer", "Transfer")],
        room_prices: HashMap::from([
            ("h-1".to_string(), vec![room("Deluxe", 180.0), room("Standard", 120.0)]),
            ("h-2".to_string(), vec![room("Standard", 90.0)]),
        ]),
    }
}

/// Hex id of a serialized variant or period.
pub fn object_id(value: &Value) -> String {
    value["_id"]["$oid"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_default()
}

pub fn period_body(start: &str, end: &str, stay: f64, total: Option<f64>) -> Value {
    let mut body = serde_json::json!({
        "start_date": start,
        "end_date": end,
        "meal_plan_id": "MAP",
        "number_of_rooms": 2,
        "pricing_components": [
            { "attribute_id": "stay", "price": stay, "purchase_price": stay * 0.8 }
        ]
    });
    if let Some(total) = total {
        body["total_price"] = serde_json::json!(total);
    }
    body
}
