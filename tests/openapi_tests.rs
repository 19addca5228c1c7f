//! The served OpenAPI document.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;

use common::{json_body, test_state};
use tasklane::server::{build_app, OPENAPI_PATH};

#[actix_web::test]
async fn document_is_served_with_all_paths() {
    let app = test::init_service(build_app(test_state(1000))).await;

    let req = test::TestRequest::get().uri(OPENAPI_PATH).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let doc = json_body(resp).await;
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    for path in ["/api/v1/todos", "/api/v1/todos/{id}", "/api/v1/auth/login"] {
        assert!(doc["paths"].get(path).is_some(), "missing {}", path);
    }
    assert!(doc["components"]["securitySchemes"]["bearerAuth"].is_object());
}

/// Follows a `$ref` into `components.schemas` if present.
fn resolve<'a>(doc: &'a serde_json::Value, schema: &'a serde_json::Value) -> &'a serde_json::Value {
    match schema["$ref"].as_str() {
        Some(reference) => {
            let name = reference.trim_start_matches("#/components/schemas/");
            &doc["components"]["schemas"][name]
        }
        None => schema,
    }
}

fn response_schema<'a>(doc: &'a serde_json::Value, path: &str, method: &str, status: &str) -> &'a serde_json::Value {
    let schema = &doc["paths"][path][method]["responses"][status]["content"]["application/json"]["schema"];
    resolve(doc, schema)
}

#[actix_web::test]
async fn success_bodies_describe_the_envelopes() {
    let app = test::init_service(build_app(test_state(1000))).await;
    let req = test::TestRequest::get().uri(OPENAPI_PATH).to_request();
    let doc = json_body(test::call_service(&app, req).await).await;

    let single = response_schema(&doc, "/api/v1/todos/{id}", "get", "200");
    assert!(single["properties"]["data"].is_object(), "{}", single);

    let login = response_schema(&doc, "/api/v1/auth/login", "post", "200");
    assert!(login["properties"]["data"].is_object(), "{}", login);

    let page = response_schema(&doc, "/api/v1/todos", "get", "200");
    for field in ["data", "meta", "links"] {
        assert!(page["properties"][field].is_object(), "missing {} in {}", field, page);
    }
}
