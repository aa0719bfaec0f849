//! Artwork catalog records and the REST response envelope.

use serde::{Deserialize, Serialize};

/// Gallery category of an artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtCategory {
    Landscape,
    Abstract,
    Portrait,
    Digital,
    StillLife,
    Urban,
}

/// One artwork in the gallery.
///
/// Each artwork's discussion room is keyed by its `id` rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtPiece {
    pub id: u32,
    pub title: String,
    pub artist: String,
    pub description: String,
    pub image_url: String,
    pub category: ArtCategory,
}

/// JSON envelope for every REST response: `{success, data?, count?, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            error: None,
        }
    }

    /// A failed response with a human-readable reason.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            error: Some(error.into()),
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A successful list response; `count` mirrors the list length.
    #[must_use]
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data: Some(data),
            error: None,
        }
    }
}
