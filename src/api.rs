//! Read-only HTTP surface over the aggregation store.

use std::fmt::Write as _;

use axum::{
    extract::State,
    response::Html,
    routing::get,
    Json, Router,
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tower_http::cors::CorsLayer;

use crate::store::{Snapshot, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/hotspot", get(hotspot))
        .route("/health", get(|| async { "OK" }))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn hotspot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.store.snapshot())
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.store.snapshot()))
}

/// Minimal dashboard: one numbered list per source.
pub fn render_index(snap: &Snapshot) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Hotspot</title></head><body>\n",
    );
    match snap.generated_at {
        Some(ts) => {
            let _ = writeln!(
                out,
                "<p class=\"updated\">Updated {}</p>",
                ts.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => out.push_str("<p class=\"updated\">No data yet</p>\n"),
    }

    for entry in &snap.sources {
        let _ = writeln!(
            out,
            "<section id=\"{}\"><h2>{}</h2><ol>",
            encode_double_quoted_attribute(&entry.key),
            encode_text(&entry.key)
        );
        for (i, r) in entry.records.iter().enumerate() {
            let _ = writeln!(
                out,
                "<li><span class=\"rank\">{}.</span> <a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></li>",
                i + 1,
                encode_double_quoted_attribute(&r.link),
                encode_text(&r.title)
            );
        }
        out.push_str("</ol></section>\n");
    }

    out.push_str("</body></html>\n");
    out
}
