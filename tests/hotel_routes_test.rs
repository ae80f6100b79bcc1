mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use common::{object_id, TestApp, PACKAGE};

fn days() -> Value {
    json!([
        { "id": "d1", "day_number": 1, "title": "Arrive in Gangtok" },
        { "id": "d2", "day_number": 2, "title": "Lachung" },
        { "id": "d3", "day_number": 3, "title": "Pelling" }
    ])
}

#[actix_rt::test]
async fn test_assign_and_clear_hotels() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Standard", "hotel_mappings": { "2": "h-3" } }))
        .to_request();
    let variant: Value = test::call_and_read_body_json(&app, req).await;

    // "2" is a legacy bare day number and moves onto day d2
    let req = test::TestRequest::put()
        .uri(&format!("/api/packages/{}/variants/{}/hotels", PACKAGE, object_id(&variant)))
        .set_json(json!({
            "days": days(),
            "assignments": [
                { "day_key": "d1", "hotel_id": "h-2" },
                { "day_key": "d3", "hotel_id": "h-1" },
                { "day_key": "d3", "hotel_id": null }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let mappings: Value = test::read_body_json(resp).await;
    assert_eq!(mappings, json!({ "d1": "h-2", "d2": "h-3" }));

    let req = test::TestRequest::put()
        .uri(&format!("/api/packages/{}/variants/{}/hotels", PACKAGE, object_id(&variant)))
        .set_json(json!({ "assignments": [{ "day_key": " ", "hotel_id": "h-1" }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_copy_hotels_between_variants() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Standard", "hotel_mappings": { "d1": "h-1" } }))
        .to_request();
    let source: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Luxury", "hotel_mappings": { "d2": "h-3" } }))
        .to_request();
    let target: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!(
            "/api/packages/{}/variants/{}/hotels/copy",
            PACKAGE,
            object_id(&target)
        ))
        .set_json(json!({ "source_variant_id": object_id(&source) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let mappings: Value = test::read_body_json(resp).await;
    assert_eq!(mappings, json!({ "d1": "h-1" }));

    let req = test::TestRequest::get()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .to_request();
    let variants: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(variants[1]["hotel_mappings"], json!({ "d1": "h-1" }));
    assert_eq!(variants[0]["hotel_mappings"], json!({ "d1": "h-1" }));
}

#[actix_rt::test]
async fn test_apply_from_other_itinerary() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .set_json(json!({ "name": "Standard", "hotel_mappings": { "d3": "h-3" } }))
        .to_request();
    let variant: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!(
        "/api/packages/{}/variants/{}/hotels/apply",
        PACKAGE,
        object_id(&variant)
    );

    // Day counts differ: nothing changes
    let req = test::TestRequest::post()
        .uri(&uri)
        .set_json(json!({
            "days": days(),
            "source_days": [
                { "day_number": 1, "hotel_id": "h-1" },
                { "day_number": 2, "hotel_id": "h-2" }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "day count mismatch: itinerary has 3 days, source has 2"
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/packages/{}/variants", PACKAGE))
        .to_request();
    let variants: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(variants[0]["hotel_mappings"], json!({ "d3": "h-3" }));

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_json(json!({
            "days": days(),
            "source_days": [
                { "day_number": 1, "hotel_id": "h-1" },
                { "day_number": 2, "hotel_id": "h-2" },
                { "day_number": 3 }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["applied"], 2);
    assert_eq!(report["unmapped_days"], json!([3]));
    assert_eq!(report["hotel_mappings"], json!({ "d1": "h-1", "d2": "h-2" }));
}
