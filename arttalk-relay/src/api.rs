//! REST endpoints for the artwork catalog.
//!
//! - `GET /api/artworks` lists every artwork.
//! - `GET /api/artworks/{id}` returns one artwork, or 404.
//!
//! Other methods on these paths, like any unknown path, get the JSON
//! "Endpoint not found" 404.

use std::sync::Arc;

use arttalk_proto::artwork::{ApiResponse, ArtPiece};
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::catalog::ArtCatalog;

type Catalog = Arc<dyn ArtCatalog>;

/// Catalog routes, ready to merge into a router with any state type.
pub fn router<S>(catalog: Catalog) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/api/artworks", get(list_artworks))
        .route("/api/artworks/{id}", get(get_artwork))
        .method_not_allowed_fallback(endpoint_not_found)
        .with_state(catalog)
}

/// JSON 404 for requests no endpoint answers.
pub async fn endpoint_not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("Endpoint not found")),
    )
}

/// CORS policy for browser clients served from another origin.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn list_artworks(State(catalog): State<Catalog>) -> Json<ApiResponse<Vec<ArtPiece>>> {
    Json(ApiResponse::list(catalog.list().to_vec()))
}

async fn get_artwork(
    State(catalog): State<Catalog>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse<ArtPiece>>) {
    let found = id.parse::<u32>().ok().and_then(|id| catalog.get(id)).cloned();
    match found {
        Some(piece) => (StatusCode::OK, Json(ApiResponse::ok(piece))),
        None => {
            tracing::debug!(id = %id, "artwork not found");
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::failure("Artwork not found")),
            )
        }
    }
}
