//! Integration tests for the todo endpoints over in-memory storage.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use common::{bearer, json_body, test_state, token_for};
use tasklane::server::build_app;

#[actix_web::test]
async fn create_returns_input_title_and_flag() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::post()
        .uri("/api/v1/todos")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Buy groceries", "completed": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = json_body(resp).await;
    assert_eq!(body["data"]["title"], "Buy groceries");
    assert_eq!(body["data"]["completed"], true);
    assert!(body["data"]["id"].as_i64().is_some());
    assert!(body["data"].get("deleted_at").is_none());
}

#[actix_web::test]
async fn completed_defaults_to_false() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::post()
        .uri("/api/v1/todos")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Walk the dog"}))
        .to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["completed"], false);
}

#[actix_web::test]
async fn short_title_is_rejected() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::post()
        .uri("/api/v1/todos")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "ab"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = json_body(resp).await;
    assert_eq!(body["code"], 400);
    assert!(body["error"].as_str().unwrap().contains("Title"));
}

#[actix_web::test]
async fn malformed_body_yields_json_400() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::post()
        .uri("/api/v1/todos")
        .insert_header(bearer(&token))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["code"], 400);
}

#[actix_web::test]
async fn second_page_holds_the_remainder() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    for i in 1..=7 {
        let req = test::TestRequest::post()
            .uri("/api/v1/todos")
            .insert_header(bearer(&token))
            .set_json(json!({"title": format!("Task number {}", i)}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/todos?page=2&page_size=5")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Task number 6");
    assert_eq!(items[1]["title"], "Task number 7");
    assert_eq!(body["meta"]["page"], 2);
    assert_eq!(body["meta"]["page_size"], 5);
    assert_eq!(body["meta"]["total_items"], 7);
    assert_eq!(body["meta"]["total_pages"], 2);
    assert!(body["links"]["prev"].as_str().unwrap().ends_with("page=1&page_size=5"));
    assert!(body["links"].get("next").is_none());
}

#[actix_web::test]
async fn default_page_size_is_ten() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    for i in 1..=12 {
        let req = test::TestRequest::post()
            .uri("/api/v1/todos")
            .insert_header(bearer(&token))
            .set_json(json!({"title": format!("Task number {}", i)}))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/todos")
        .insert_header(bearer(&token))
        .to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["total_pages"], 2);
}

#[actix_web::test]
async fn out_of_range_pagination_is_rejected() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    for uri in [
        "/api/v1/todos?page=0",
        "/api/v1/todos?page_size=101",
        "/api/v1/todos?page_size=0",
        "/api/v1/todos?page=abc",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(json_body(resp).await["code"], 400);
    }
}

#[actix_web::test]
async fn page_far_past_the_end_is_empty() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::post()
        .uri("/api/v1/todos")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Only task"}))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/todos?page={}&page_size=100", i64::MAX))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["page"], i64::MAX);
    assert_eq!(body["meta"]["total_items"], 1);
    assert_eq!(body["meta"]["total_pages"], 1);
    assert!(body["links"].get("next").is_none());
}

#[actix_web::test]
async fn update_overwrites_fields() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::post()
        .uri("/api/v1/todos")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Draft report"}))
        .to_request();
    let id = json_body(test::call_service(&app, req).await).await["data"]["id"]
        .as_i64()
        .unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/todos/{}", id))
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Final report", "completed": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["title"], "Final report");
    assert_eq!(body["data"]["completed"], true);
}

#[actix_web::test]
async fn update_of_missing_todo_is_not_found() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::put()
        .uri("/api/v1/todos/999")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Nothing here"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["code"], 404);
}

#[actix_web::test]
async fn delete_then_get_is_not_found() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::post()
        .uri("/api/v1/todos")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Temporary"}))
        .to_request();
    let id = json_body(test::call_service(&app, req).await).await["data"]["id"]
        .as_i64()
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/todos/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/todos/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["code"], 404);

    // Deleting twice is also a 404
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/todos/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn non_numeric_id_is_bad_request() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let token = token_for("alice");

    let req = test::TestRequest::get()
        .uri("/api/v1/todos/abc")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn todos_require_a_token() {
    let app = test::init_service(build_app(test_state(1000))).await;

    let req = test::TestRequest::get().uri("/api/v1/todos").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["code"], 401);

    let req = test::TestRequest::get()
        .uri("/api/v1/todos")
        .insert_header(bearer("not-a-real-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "Invalid token");
}
