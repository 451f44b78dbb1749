// tests/ingest_e2e.rs
//
// Full pipeline against a local HTTP server: registry TOML -> HttpFetcher ->
// extractors -> store -> HTTP snapshot.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use httpmock::prelude::*;
use serde_json::Value as Json;
use tower::ServiceExt as _;

use hotspot::api::{self, AppState};
use hotspot::ingest::transport::{HttpFetcher, BROWSER_USER_AGENT};
use hotspot::{Scheduler, SourceRegistry, Store};

const BODY_LIMIT: usize = 1024 * 1024;

fn registry_for(server: &MockServer) -> SourceRegistry {
    let toml = format!(
        r#"
[[source]]
key = "structured"
url = "{api}"
kind = "structured"

[[source]]
key = "markup"
url = "{page}"
kind = "markup"
selector = "a.list-title"
encoding = "gb18030"
link_prefix = "https://host"
browser_headers = true

[[source]]
key = "down"
url = "{down}"
kind = "markup"
selector = "a"
"#,
        api = server.url("/api/hot"),
        page = server.url("/buzz"),
        down = server.url("/down"),
    );
    SourceRegistry::from_toml_str(&toml).expect("valid registry")
}

#[tokio::test]
async fn cycle_against_live_server_then_served_over_http() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/hot");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data":[{"target":{"title":"<Q> & A","url":"https://api.example.com/questions/123"}}]}"#);
    });
    let (page, _, _) = encoding_rs::GB18030.encode(
        r#"<html><body>
             <a class="list-title" href="/a">热点一</a>
             <a class="list-title">no link</a>
             <a class="list-title" href="/b">热点二</a>
           </body></html>"#,
    );
    let page = page.into_owned();
    let page_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/buzz")
            .header("user-agent", BROWSER_USER_AGENT);
        then.status(200)
            .header("content-type", "text/html; charset=gbk")
            .body(page);
    });
    server.mock(|when, then| {
        when.method(GET).path("/down");
        then.status(500);
    });

    let store = Store::new();
    let scheduler = Scheduler::new(
        Arc::new(registry_for(&server)),
        Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap()),
        store.clone(),
        Duration::from_secs(600),
    );
    let report = scheduler.run_cycle().await;
    api_mock.assert();
    page_mock.assert();
    assert_eq!(report.refreshed, 2);
    assert_eq!(report.failed, vec!["down".to_string()]);

    let app = api::router(AppState::new(store));
    let req = Request::builder()
        .uri("/hotspot")
        .body(Body::empty())
        .expect("build GET /hotspot");
    let resp = app.oneshot(req).await.expect("oneshot /hotspot");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let raw = String::from_utf8(bytes.clone()).expect("utf8");
    assert!(raw.contains("<Q> & A"), "html chars must stay literal: {raw}");

    let v: Json = serde_json::from_slice(&bytes).expect("snapshot json");
    let sources = v.get("sources").and_then(Json::as_object).expect("sources map");
    let keys: Vec<_> = sources.keys().cloned().collect();
    assert_eq!(keys.len(), 2);
    assert!(!sources.contains_key("down"));

    assert_eq!(
        sources["structured"][0]["link"],
        "https://www.example.com/question/123"
    );
    let markup = sources["markup"].as_array().expect("markup list");
    assert_eq!(markup.len(), 2);
    assert_eq!(markup[0]["title"], "热点一");
    assert_eq!(markup[0]["link"], "https://host/a");
    assert_eq!(markup[1]["title"], "热点二");
    assert_eq!(markup[1]["link"], "https://host/b");
}
