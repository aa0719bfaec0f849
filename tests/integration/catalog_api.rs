//! Integration tests for the artwork catalog REST API.
//!
//! Exercises the full application router, so the upgrade middleware, the
//! JSON 404 fallback and the CORS layer are in front of every request.
//!
//! Verification command: `cargo test --test catalog_api`

use std::sync::Arc;

use arttalk_proto::artwork::{ArtCategory, ArtPiece};
use arttalk_relay::catalog::{ArtCatalog, StaticCatalog};
use arttalk_relay::relay::{RelayState, app};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use tower::ServiceExt;

async fn request(
    catalog: Arc<dyn ArtCatalog>,
    method: Method,
    uri: &str,
) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = app(Arc::new(RelayState::new()), catalog)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::ORIGIN, "http://gallery.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, headers, json)
}

async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = request(Arc::new(StaticCatalog::new()), Method::GET, uri).await;
    (status, body)
}

#[tokio::test]
async fn lists_built_in_gallery() {
    let (status, body) = get("/api/artworks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 16);

    let pieces = body["data"].as_array().unwrap();
    assert_eq!(pieces.len(), 16);
    for (i, piece) in pieces.iter().enumerate() {
        assert_eq!(piece["id"], i + 1);
        for field in ["title", "artist", "description", "imageUrl", "category"] {
            assert!(piece[field].is_string(), "piece {i} lacks {field}");
        }
    }
}

#[tokio::test]
async fn categories_use_wire_names() {
    let (_, body) = get("/api/artworks").await;
    let categories: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|piece| piece["category"].as_str().unwrap())
        .collect();
    assert!(categories.contains(&"still-life"));
    assert!(categories.iter().all(|c| {
        ["landscape", "abstract", "portrait", "digital", "still-life", "urban"].contains(c)
    }));
}

#[tokio::test]
async fn fetches_one_artwork() {
    let (status, body) = get("/api/artworks/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], 1);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn unknown_artwork_is_not_found() {
    for uri in ["/api/artworks/0", "/api/artworks/17", "/api/artworks/abc"] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Artwork not found");
    }
}

#[tokio::test]
async fn plain_request_to_other_path_is_not_found() {
    for uri in ["/", "/chat/7", "/api/unknown"] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Endpoint not found");
    }
}

#[tokio::test]
async fn responses_carry_cors_header() {
    let (_, headers, _) =
        request(Arc::new(StaticCatalog::new()), Method::GET, "/api/artworks").await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn custom_catalog_is_served() {
    let catalog = StaticCatalog::from_pieces(vec![ArtPiece {
        id: 42,
        title: "Harbor at Dusk".to_string(),
        artist: "Test Painter".to_string(),
        description: "A quiet harbor.".to_string(),
        image_url: "https://example.com/harbor.jpg".to_string(),
        category: ArtCategory::Landscape,
    }]);
    let catalog: Arc<dyn ArtCatalog> = Arc::new(catalog);

    let (status, _, body) = request(Arc::clone(&catalog), Method::GET, "/api/artworks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _, body) = request(catalog, Method::GET, "/api/artworks/42").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Harbor at Dusk");
    assert_eq!(body["data"]["imageUrl"], "https://example.com/harbor.jpg");
    assert_eq!(body["data"]["category"], "landscape");
}

#[tokio::test]
async fn other_methods_on_catalog_paths_are_not_found() {
    for (method, uri) in [
        (Method::POST, "/api/artworks"),
        (Method::PATCH, "/api/artworks/3"),
        (Method::DELETE, "/api/artworks/3"),
        (Method::POST, "/chat/7"),
    ] {
        let (status, _, body) = request(Arc::new(StaticCatalog::new()), method.clone(), uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Endpoint not found");
    }
}
