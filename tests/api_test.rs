//! API integration tests.
//!
//! Route-level tests drive the router directly with `oneshot`; the server
//! tests run the full stack on a random port.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{two_step_provider, TestHarness};

async fn send(h: &TestHarness, request: Request<Body>) -> (StatusCode, String, String) {
    let response = h.router().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn static_provider(id: &str, content: Value) -> String {
    json!({
        "id": id,
        "inputs": { "series": "{series}", "chapter": "{chapter}" },
        "output": { "type": "json", "content": content }
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Health and listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_200() {
    let (_harness, addr) = TestHarness::new().with_server().await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn server_bulk_loads_provider_dir() {
    let h = TestHarness::new();
    h.write_provider("b.json", &static_provider("mal", json!({})));
    h.write_provider("a.jsonc", &static_provider("kitsu", json!({})));
    let (_harness, addr) = h.with_server().await;

    let ids: Vec<String> = reqwest::get(format!("http://{addr}/providers"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ids, vec!["kitsu", "mal"]);
}

#[tokio::test]
async fn get_provider_returns_definition() {
    let h = TestHarness::new();
    h.write_provider(
        "kitsu.json",
        &json!({
            "id": "kitsu",
            "envs": { "YUZU_API_TEST_TOKEN": "{token}" },
            "output": { "type": "xml" }
        })
        .to_string(),
    );
    h.load();

    let (status, _, body) = send(&h, get("/providers/kitsu")).await;
    assert_eq!(status, StatusCode::OK);
    let def: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(def["id"], "kitsu");
    assert_eq!(def["output"]["type"], "xml");
    assert_eq!(def["envs"]["YUZU_API_TEST_TOKEN"], "{token}");
}

#[tokio::test]
async fn unknown_provider_is_404() {
    let h = TestHarness::new();
    let (status, content_type, body) = send(&h, get("/providers/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type, "application/json");
    let err: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(err["code"], "not_found");

    let (status, _, _) = send(&h, get("/providers/nope/run")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Management
// ---------------------------------------------------------------------------

#[tokio::test]
async fn put_then_delete_provider() {
    let h = TestHarness::new();

    let put = Request::put("/providers/adhoc")
        .header("content-type", "application/json")
        .body(Body::from(static_provider("ignored", json!({ "Series": "{series}" }))))
        .unwrap();
    let (status, _, body) = send(&h, put).await;
    assert_eq!(status, StatusCode::OK);
    let stored: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stored["id"], "adhoc");
    assert_eq!(h.ctx.registry.ids(), vec!["adhoc"]);

    let (status, _, body) = send(&h, get("/providers/adhoc/run?series=Berserk")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"Series\": \"Berserk\""));

    let delete = Request::delete("/providers/adhoc").body(Body::empty()).unwrap();
    let (status, _, _) = send(&h, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(h.ctx.registry.is_empty());

    let delete = Request::delete("/providers/adhoc").body(Body::empty()).unwrap();
    let (status, _, _) = send(&h, delete).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_invalid_definition_is_400() {
    let h = TestHarness::new();
    let put = Request::put("/providers/bad")
        .body(Body::from(r#"{ "endpoints": [ { "method": "BAD METHOD", "url": "http://x" } ] }"#))
        .unwrap();
    let (status, _, body) = send(&h, put).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("BAD METHOD"));
    assert!(h.ctx.registry.is_empty());
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_provider_against_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [ { "id": "13" } ] })))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/manga/13/chapters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "attributes": { "canonicalTitle": "Romance Dawn", "volumeNumber": 1 } } ]
        })))
        .mount(&upstream)
        .await;

    let h = TestHarness::new();
    h.write_provider("kitsu.json", &two_step_provider("kitsu", &upstream.uri(), "xml"));
    h.load();

    let (status, content_type, body) =
        send(&h, get("/providers/kitsu/run?series=One%20Piece&chapter=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/xml");
    assert_eq!(
        body,
        "<content><Number>1</Number><Series>One Piece</Series>\
         <Title>Romance Dawn</Title><Volume>1</Volume></content>"
    );
}

#[tokio::test]
async fn upstream_failure_is_502() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&upstream)
        .await;

    let h = TestHarness::new();
    h.write_provider("kitsu.json", &two_step_provider("kitsu", &upstream.uri(), "json"));
    h.load();

    let (status, _, body) = send(&h, get("/providers/kitsu/run?series=x&chapter=1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let err: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(err["code"], "upstream_status");
    assert!(err["error"].as_str().unwrap().contains("down for maintenance"));
}

// ---------------------------------------------------------------------------
// ComicInfo merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comicinfo_merges_by_precedence() {
    let h = TestHarness::new();
    h.write_provider(
        "first.json",
        &static_provider(
            "first",
            json!({ "Title": "Romance Dawn", "Series": "{series}", "Number": "{chapter}" }),
        ),
    );
    h.write_provider(
        "second.json",
        &static_provider(
            "second",
            json!({ "Title": "Ignored", "Summary": "Luffy sets out", "Year": "1997", "Popularity": "high" }),
        ),
    );
    h.load();

    let (status, content_type, body) =
        send(&h, get("/comicinfo?s=One%20Piece&c=1&p=first,second")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/xml");
    assert_eq!(
        body,
        "<ComicInfo>\n  <Title>Romance Dawn</Title>\n  <Series>One Piece</Series>\n  \
         <Number>1</Number>\n  <Summary>Luffy sets out</Summary>\n  \
         <Year>1997</Year>\n</ComicInfo>"
    );
}

#[tokio::test]
async fn comicinfo_requires_providers() {
    let h = TestHarness::new();
    let (status, _, body) = send(&h, get("/comicinfo?s=x&c=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("validation_error"));
}

#[tokio::test]
async fn comicinfo_unknown_provider_is_404() {
    let h = TestHarness::new();
    h.write_provider("first.json", &static_provider("first", json!({})));
    h.load();

    let (status, _, _) = send(&h, get("/comicinfo?s=x&c=1&p=first,missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comicinfo_bad_field_value_is_400() {
    let h = TestHarness::new();
    h.write_provider("y.json", &static_provider("y", json!({ "Year": "ninety-seven" })));
    h.load();

    let (status, _, body) = send(&h, get("/comicinfo?s=x&c=1&p=y")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Year"));
}

// ---------------------------------------------------------------------------
// Query-path debugging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn jsonpath_returns_matches() {
    let h = TestHarness::new();
    let request = Request::post("/jsonpath?path=$.data%5B*%5D.id")
        .body(Body::from(r#"{ "data": [ { "id": "13" }, { "id": 99 } ] }"#))
        .unwrap();
    let (status, _, body) = send(&h, request).await;
    assert_eq!(status, StatusCode::OK);
    let matches: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(matches, json!(["13", 99]));
}

#[tokio::test]
async fn jsonpath_rejects_non_json_body() {
    let h = TestHarness::new();
    let request = Request::post("/jsonpath?path=$.a")
        .body(Body::from("not json"))
        .unwrap();
    let (status, _, _) = send(&h, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
