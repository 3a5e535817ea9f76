//! Reference thumbnails to help users pick a title and a subject photo.

use serde::Serialize;

/// A well-known thumbnail archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Inspiration {
    /// Short name of the archetype.
    pub title: &'static str,
    /// When the archetype works best.
    pub description: &'static str,
    /// Example thumbnail.
    pub image_url: &'static str,
}

/// The built-in gallery.
pub const GALLERY: &[Inspiration] = &[
    Inspiration {
        title: "Epic reaction",
        description: "Shocked faces, explosions, loud colors. Great for challenges and surprising results.",
        image_url: "https://img.youtube.com/vi/yXWw0_UfSFg/maxresdefault.jpg",
    },
    Inspiration {
        title: "Emotional story",
        description: "One strong emotion, joy or sadness, front and center. Common for giveaways and personal stories.",
        image_url: "https://img.youtube.com/vi/d5gxUv1pGBg/maxresdefault.jpg",
    },
    Inspiration {
        title: "Danger & challenge",
        description: "Hints at an intense or risky situation. Fits survival and physical challenge videos.",
        image_url: "https://img.youtube.com/vi/0e3GPea1Tyg/maxresdefault.jpg",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallery_entries_are_complete() {
        assert_eq!(GALLERY.len(), 3);
        for entry in GALLERY {
            assert!(!entry.title.is_empty());
            assert!(entry.image_url.starts_with("https://"));
        }
    }
}
