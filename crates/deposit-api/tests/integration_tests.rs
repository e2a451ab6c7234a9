//! # Integration Tests for deposit-api
//!
//! Full deposit workflow over HTTP with authentication enabled: create,
//! upload, reorder, publish, edit, discard and republish. Also covers health
//! probes and authentication failures.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use deposit_api::state::{AppConfig, AppState};
use deposit_core::DepositConfig;

const TOKEN: &str = "s3cret";

/// Helper: build the test app with auth disabled.
fn test_app() -> Router {
    deposit_api::app(AppState::new())
}

/// Helper: build the test app with auth enabled.
fn test_app_with_auth() -> Router {
    let config = AppConfig {
        port: 8080,
        auth_token: Some(TOKEN.to_string()),
    };
    deposit_api::app(AppState::with_config(config, DepositConfig::default()))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// A client acting as one principal against a shared router.
struct Client {
    app: Router,
    principal: &'static str,
}

impl Client {
    fn new(app: &Router, principal: &'static str) -> Self {
        Self {
            app: app.clone(),
            principal,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Body>,
        json: bool,
    ) -> axum::http::Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}:{TOKEN}", self.principal),
            );
        if json {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder.body(body.unwrap_or_else(Body::empty)).unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> axum::http::Response<Body> {
        self.send("GET", uri, None, false).await
    }

    async fn delete(&self, uri: &str) -> axum::http::Response<Body> {
        self.send("DELETE", uri, None, false).await
    }

    async fn post(&self, uri: &str) -> axum::http::Response<Body> {
        self.send("POST", uri, None, false).await
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> axum::http::Response<Body> {
        self.send(method, uri, Some(Body::from(body.to_string())), true)
            .await
    }

    async fn upload(&self, uri: &str, data: &'static str) -> axum::http::Response<Body> {
        self.send("PUT", uri, Some(Body::from(data)), false).await
    }
}

fn keys(listing: &Value) -> Vec<String> {
    listing
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["key"].as_str().unwrap().to_string())
        .collect()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_health_probes_skip_auth() {
    let app = test_app_with_auth();
    for (uri, expected) in [("/health/liveness", "ok"), ("/health/readiness", "ready")] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, expected);
    }
}

// -- Authentication -----------------------------------------------------------

#[tokio::test]
async fn test_anonymous_create_is_unauthorized() {
    let app = test_app_with_auth();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/deposits")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title":"The title field"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_only_owners_run_actions() {
    let app = test_app_with_auth();
    let alice = Client::new(&app, "alice");
    let bob = Client::new(&app, "bob");

    let created = alice
        .json("POST", "/api/deposits", json!({"title": "alice's"}))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let id = body_json(created).await["id"].as_str().unwrap().to_string();

    let response = bob.post(&format!("/api/deposits/{id}/actions/publish")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = bob.get(&format!("/api/deposits/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Deposit Workflow ---------------------------------------------------------

#[tokio::test]
async fn test_deposit_workflow() {
    let app = test_app_with_auth();
    let alice = Client::new(&app, "alice");

    // Create.
    let response = alice
        .json("POST", "/api/deposits", json!({"title": "The title field"}))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["metadata"]["_deposit"]["owners"], json!(["alice"]));
    let deposit = format!("/api/deposits/{id}");
    let files = format!("{deposit}/files");
    let action = |name: &str| format!("{deposit}/actions/{name}");

    // Upload two files.
    for (key, data) in [("test1.txt", "Hello world!"), ("test2.txt", "Second file.")] {
        let response = alice.upload(&format!("{files}/{key}"), data).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let listing = body_json(alice.get(&files).await).await;
    assert_eq!(keys(&listing), vec!["test1.txt", "test2.txt"]);

    // Reorder.
    let response = alice
        .json("PUT", &files, json!([{"id": "test2.txt"}, {"id": "test1.txt"}]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        keys(&body_json(response).await),
        vec!["test2.txt", "test1.txt"]
    );

    // Publish.
    let response = alice.post(&action("publish")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::LOCATION], deposit.as_str());
    let published = body_json(response).await;
    assert_eq!(published["metadata"]["_deposit"]["status"], "published");
    let record = published["links"]["record"].as_str().unwrap().to_string();

    let response = alice.get(&record).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["metadata"]["title"], "The title field");
    assert_eq!(keys(&json["metadata"]["_files"]), vec!["test2.txt", "test1.txt"]);

    // A published deposit refuses deletes.
    assert_eq!(alice.delete(&deposit).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        alice.delete(&format!("{files}/test1.txt")).await.status(),
        StatusCode::FORBIDDEN
    );

    // Edit.
    let response = alice.post(&action("edit")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let edited = body_json(response).await;
    assert_eq!(edited["metadata"]["_deposit"]["status"], "draft");

    // Still not deletable, but files and their order can change again.
    assert_eq!(alice.delete(&deposit).await.status(), StatusCode::FORBIDDEN);
    let response = alice.upload(&format!("{files}/test3.txt"), "Third file.").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        alice.delete(&format!("{files}/test1.txt")).await.status(),
        StatusCode::NO_CONTENT
    );
    let response = alice
        .json("PUT", &files, json!([{"id": "test3.txt"}, {"id": "test2.txt"}]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The published record still lists what was published.
    let json = body_json(alice.get(&record).await).await;
    assert_eq!(keys(&json["metadata"]["_files"]), vec!["test2.txt", "test1.txt"]);

    // Discard restores the published files and order.
    let response = alice.post(&action("discard")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let listing = body_json(alice.get(&files).await).await;
    assert_eq!(keys(&listing), vec!["test2.txt", "test1.txt"]);
    let response = alice.get(&format!("{files}/test1.txt/content")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Hello world!");

    // Change the title and republish.
    let response = alice
        .json("PUT", &deposit, json!({"title": "Another title"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = alice.post(&action("publish")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(alice.get(&record).await).await;
    assert_eq!(json["metadata"]["title"], "Another title");
    assert_eq!(json["revision_id"], 1);
}

#[tokio::test]
async fn test_delete_draft_then_not_found() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/deposits")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let uri = format!("/api/deposits/{id}");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}
