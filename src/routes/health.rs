use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::Serialize;
use std::collections::HashMap;
use std::env;

use crate::routes::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let storage = check_storage(&state).await;
    let catalog = check_catalog(&state).await;

    // Any failing dependency degrades the overall status
    if storage.status != "ok" || catalog.status != "ok" {
        health.status = "degraded".to_string();
    }
    health.services.insert("storage".to_string(), storage);
    health.services.insert("catalog".to_string(), catalog);

    HttpResponse::Ok().json(health)
}

async fn check_storage(state: &AppState) -> ServiceStatus {
    match state.repository.ping().await {
        Ok(()) => ServiceStatus {
            status: "ok".to_string(),
            details: Some("Package storage reachable".to_string()),
        },
        Err(e) => {
            error!("Storage health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some(format!("Failed to reach storage: {}", e)),
            }
        }
    }
}

async fn check_catalog(state: &AppState) -> ServiceStatus {
    match state.catalog.meal_plans().await {
        Ok(plans) => ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("Catalog reachable, {} meal plans", plans.len())),
        },
        Err(e) => {
            error!("Catalog health check failed: {}", e);
            ServiceStatus {
                status: "error".to_string(),
                details: Some(e.to_string()),
            }
        }
    }
}
