mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use common::{object_id, TestApp, PACKAGE};

#[actix_rt::test]
async fn test_first_variant_becomes_default() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Standard" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let standard: Value = test::read_body_json(resp).await;
    assert_eq!(standard["name"], "Standard");
    assert_eq!(standard["is_default"], true);
    assert_eq!(standard["sort_order"], 0);
    assert!(!object_id(&standard).is_empty());

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Luxury", "priceModifier": 20 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let luxury: Value = test::read_body_json(resp).await;
    assert_eq!(luxury["is_default"], false);
    assert_eq!(luxury["sort_order"], 1);
    assert_eq!(luxury["price_modifier"], 20.0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let variants: Vec<Value> = test::read_body_json(resp).await;
    let names: Vec<&str> = variants.iter().filter_map(|v| v["name"].as_str()).collect();
    assert_eq!(names, vec!["Standard", "Luxury"]);
}

#[actix_rt::test]
async fn test_default_is_exclusive() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut ids = Vec::new();
    for name in ["Budget", "Standard", "Luxury"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/packages/{}/variants", PACKAGE))
            .set_json(json!({ "name": name }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(object_id(&created));
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants/{}/default", PACKAGE, ids[2]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let variants: Vec<Value> = test::read_body_json(resp).await;

    let defaults: Vec<&str> = variants
        .iter()
        .filter(|v| v["is_default"] == true)
        .filter_map(|v| v["name"].as_str())
        .collect();
    assert_eq!(defaults, vec!["Luxury"]);

    // The stored state agrees with the response
    let req = test::TestRequest::get()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .to_request();
    let stored: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stored.iter().filter(|v| v["is_default"] == true).count(), 1);
    assert_eq!(stored[2]["is_default"], true);
}

#[actix_rt::test]
async fn test_last_variant_cannot_be_deleted() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Standard" }))
        .to_request();
    let standard: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Luxury" }))
        .to_request();
    let luxury: Value = test::call_and_read_body_json(&app, req).await;

    // Removing the default promotes the first remaining variant
    let req = test::TestRequest::delete()
        .uri(&format!("/api/packages/{}/variants/{}", PACKAGE, object_id(&standard)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let remaining: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["name"], "Luxury");
    assert_eq!(remaining[0]["is_default"], true);
    assert_eq!(remaining[0]["sort_order"], 0);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/packages/{}/variants/{}", PACKAGE, object_id(&luxury)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "a package must keep at least one variant");
}

#[actix_rt::test]
async fn test_create_from_template_copies_hotels() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({
            "name": "Standard",
            "price_modifier": 10,
            "hotel_mappings": { "d1": "h-1", "d2": "h-2" }
        }))
        .to_request();
    let standard: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Standard Plus", "template_id": object_id(&standard) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let copy: Value = test::read_body_json(resp).await;

    assert_eq!(copy["hotel_mappings"], json!({ "d1": "h-1", "d2": "h-2" }));
    assert_eq!(copy["price_modifier"], 10.0);
    assert_eq!(copy["is_default"], false);
    assert_ne!(object_id(&copy), object_id(&standard));
}

#[actix_rt::test]
async fn test_unknown_template_in_empty_package() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;
    let missing = "65f1c2a9e4b0a1b2c3d4e5f6";

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Standard Plus", "template_id": missing }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], format!("variant not found: {}", missing));

    // Nothing was created
    let req = test::TestRequest::get()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .to_request();
    let variants: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(variants.is_empty());
}

#[actix_rt::test]
async fn test_update_and_reorder() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let mut ids = Vec::new();
    for name in ["Budget", "Standard", "Luxury"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/packages/{}/variants", PACKAGE))
            .set_json(json!({ "name": name }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(object_id(&created));
    }

    let req = test::TestRequest::put()
        .uri(&format!("/api/packages/{}/variants/{}", PACKAGE, ids[2]))
        .set_json(json!({ "name": "Premium", "position": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["name"], "Premium");
    assert_eq!(updated["sort_order"], 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .to_request();
    let variants: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let order: Vec<&str> = variants.iter().filter_map(|v| v["name"].as_str()).collect();
    assert_eq!(order, vec!["Premium", "Budget", "Standard"]);
}

#[actix_rt::test]
async fn test_invalid_requests() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid name: is required");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/packages/{}/variants/not-an-id", PACKAGE))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Package without variants
    let req = test::TestRequest::post()
        .uri(&format!(
            "/api/packages/{}/variants/{}/default",
            PACKAGE, "65f1a2b3c4d5e6f708192a3b"
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Standard" }))
        .to_request();
    let _: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::put()
        .uri(&format!(
            "/api/packages/{}/variants/{}",
            PACKAGE, "65f1a2b3c4d5e6f708192a3b"
        ))
        .set_json(json!({ "name": "Ghost" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
