//! Artwork catalog backing the REST API.
//!
//! The relay itself never consults the catalog; rooms are keyed by whatever
//! id the client puts in its path.

use arttalk_proto::artwork::{ArtCategory, ArtPiece};

/// Read-only source of gallery artworks.
pub trait ArtCatalog: Send + Sync {
    /// All artworks in gallery order.
    fn list(&self) -> &[ArtPiece];

    /// Looks up an artwork by id.
    fn get(&self, id: u32) -> Option<&ArtPiece> {
        self.list().iter().find(|piece| piece.id == id)
    }
}

/// The built-in gallery.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    pieces: Vec<ArtPiece>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticCatalog {
    /// Creates the catalog holding the built-in gallery.
    #[must_use]
    pub fn new() -> Self {
        Self::from_pieces(
            GALLERY
                .iter()
                .map(|&(id, title, artist, description, image_url, category)| ArtPiece {
                    id,
                    title: title.to_string(),
                    artist: artist.to_string(),
                    description: description.to_string(),
                    image_url: image_url.to_string(),
                    category,
                })
                .collect(),
        )
    }

    /// Creates a catalog over an arbitrary list of artworks.
    #[must_use]
    pub const fn from_pieces(pieces: Vec<ArtPiece>) -> Self {
        Self { pieces }
    }
}

impl ArtCatalog for StaticCatalog {
    fn list(&self) -> &[ArtPiece] {
        &self.pieces
    }
}

type GalleryEntry = (u32, &'static str, &'static str, &'static str, &'static str, ArtCategory);

#[rustfmt::skip]
const GALLERY: &[GalleryEntry] = &[
    (
        1,
        "Red Sunset",
        "Emma Rodriguez",
        "A breathtaking sunset over mountain ranges, painted with vibrant reds and oranges that capture the essence of twilight.",
        "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=400&h=300&fit=crop",
        ArtCategory::Landscape,
    ),
    (
        2,
        "Urban Symphony",
        "Marcus Chen",
        "An abstract representation of city life, with bold geometric shapes and contrasting colors that reflect the energy of metropolitan areas.",
        "https://images.unsplash.com/photo-1541961017774-22349e4a1262?w=400&h=300&fit=crop",
        ArtCategory::Abstract,
    ),
    (
        3,
        "Ocean Dreams",
        "Sofia Martinez",
        "A serene seascape capturing the gentle waves and endless horizon, painted in soothing blues and whites.",
        "https://images.unsplash.com/photo-1439066615861-d1af74d74000?w=400&h=300&fit=crop",
        ArtCategory::Landscape,
    ),
    (
        4,
        "Portrait of Grace",
        "David Thompson",
        "A classical portrait showcasing masterful technique in capturing human emotion and character through oil painting.",
        "https://images.unsplash.com/photo-1544005313-94ddf0286df2?w=400&h=300&fit=crop&auto=format&q=80",
        ArtCategory::Portrait,
    ),
    (
        5,
        "Forest Whispers",
        "Luna Park",
        "A mystical forest scene with dappled sunlight filtering through ancient trees, creating an atmosphere of wonder and tranquility.",
        "https://images.unsplash.com/photo-1441974231531-c6227db76b6e?w=400&h=300&fit=crop",
        ArtCategory::Landscape,
    ),
    (
        6,
        "Digital Renaissance",
        "Alex Kumar",
        "A modern interpretation of classical themes using digital art techniques, blending traditional composition with contemporary style.",
        "https://images.unsplash.com/photo-1541961017774-22349e4a1262?w=400&h=300&fit=crop&auto=format&q=80",
        ArtCategory::Digital,
    ),
    (
        7,
        "Mountain Reflection",
        "Isabella Romano",
        "A pristine alpine lake perfectly mirrors the towering peaks above, creating a symmetrical masterpiece of natural beauty.",
        "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=400&h=300&fit=crop&auto=format&q=80",
        ArtCategory::Landscape,
    ),
    (
        8,
        "Cosmic Journey",
        "Ryan Foster",
        "An otherworldly composition exploring space and time through swirling galaxies and celestial bodies in deep purples and golds.",
        "https://images.unsplash.com/photo-1502134249126-9f3755a50d78?w=400&h=300&fit=crop",
        ArtCategory::Abstract,
    ),
    (
        9,
        "Morning Mist",
        "Catherine Williams",
        "A tranquil landscape capturing the ethereal beauty of dawn breaking through fog-covered hills and valleys.",
        "https://images.unsplash.com/photo-1470071459604-3b5ec3a7fe05?w=400&h=300&fit=crop&auto=format&q=80",
        ArtCategory::Landscape,
    ),
    (
        10,
        "City Lights",
        "Michael Zhang",
        "An urban nightscape showcasing the vibrant energy of metropolitan life through neon reflections and architectural silhouettes.",
        "https://images.unsplash.com/photo-1514565131-fce0801e5785?w=400&h=300&fit=crop",
        ArtCategory::Urban,
    ),
    (
        11,
        "Ancient Wisdom",
        "Elena Petrov",
        "A contemplative portrait of an elderly figure, capturing decades of life experience in weathered features and knowing eyes.",
        "https://images.unsplash.com/photo-1547036967-23d11aacaee0?w=400&h=300&fit=crop",
        ArtCategory::Portrait,
    ),
    (
        12,
        "Peaceful Valley",
        "James Patterson",
        "A serene valley landscape with gentle rolling hills, wildflowers, and a winding stream under a soft blue sky.",
        "https://images.unsplash.com/photo-1500964757637-c85e8a162699?w=400&h=300&fit=crop&auto=format&q=80",
        ArtCategory::Landscape,
    ),
    (
        13,
        "Autumn Harvest",
        "Sarah Mitchell",
        "A warm still life featuring seasonal fruits and vegetables arranged with rustic charm and golden lighting.",
        "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400&h=300&fit=crop",
        ArtCategory::StillLife,
    ),
    (
        14,
        "Golden Hour",
        "Kevin Liu",
        "A warm landscape bathed in the soft golden light of sunset, with rolling hills and scattered trees creating perfect silhouettes.",
        "https://images.unsplash.com/photo-1441974231531-c6227db76b6e?w=400&h=300&fit=crop&auto=format&q=80",
        ArtCategory::Landscape,
    ),
    (
        15,
        "Stormy Seas",
        "Maria Gonzalez",
        "A dramatic seascape capturing the raw power of nature with crashing waves and turbulent skies in moody blues and grays.",
        "https://images.unsplash.com/photo-1505142468610-359e7d316be0?w=400&h=300&fit=crop",
        ArtCategory::Landscape,
    ),
    (
        16,
        "Inner Reflection",
        "Thomas Anderson",
        "A psychological portrait exploring themes of identity and self-awareness through layered imagery and symbolic elements.",
        "https://images.unsplash.com/photo-1544005313-94ddf0286df2?w=400&h=300&fit=crop",
        ArtCategory::Portrait,
    ),
];
