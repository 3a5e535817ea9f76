//! Request and response values exchanged with the image model.

use crate::media::EncodedImage;
use crate::prompt::{generation_prompt, modification_prompt, ThumbnailParams};
use serde::{Deserialize, Serialize};

/// Which studio flow produced a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// A fresh thumbnail from the subject photo.
    Generation,
    /// An edit of an existing history entry.
    Modification,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation => write!(f, "generation"),
            Self::Modification => write!(f, "modification"),
        }
    }
}

/// One piece of multimodal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    /// Natural-language instruction.
    Text(String),
    /// Inline image.
    Image(EncodedImage),
}

/// A single call to the image model. The model must answer with one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRequest {
    kind: RequestKind,
    parts: Vec<RequestPart>,
}

impl ThumbnailRequest {
    /// Subject photo followed by the generation instruction.
    pub fn generation(subject: &EncodedImage, params: &ThumbnailParams) -> Self {
        Self {
            kind: RequestKind::Generation,
            parts: vec![
                RequestPart::Image(subject.clone()),
                RequestPart::Text(generation_prompt(params)),
            ],
        }
    }

    /// Edit instruction, then the identity reference, then the image to edit.
    pub fn modification(
        original_subject: &EncodedImage,
        current: &EncodedImage,
        instruction: &str,
    ) -> Self {
        Self {
            kind: RequestKind::Modification,
            parts: vec![
                RequestPart::Text(modification_prompt(instruction)),
                RequestPart::Image(original_subject.clone()),
                RequestPart::Image(current.clone()),
            ],
        }
    }

    /// Which flow built this request.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Parts in the order they are sent.
    pub fn parts(&self) -> &[RequestPart] {
        &self.parts
    }

    /// The instruction text.
    pub fn prompt(&self) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            RequestPart::Text(text) => Some(text.as_str()),
            RequestPart::Image(_) => None,
        })
    }

    /// Inline images in send order.
    pub fn images(&self) -> impl Iterator<Item = &EncodedImage> {
        self.parts.iter().filter_map(|p| match p {
            RequestPart::Image(image) => Some(image),
            RequestPart::Text(_) => None,
        })
    }
}

/// Metadata about the generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// The image returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated thumbnail should be stored or saved"]
pub struct GeneratedThumbnail {
    /// Image payload.
    pub image: EncodedImage,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedThumbnail {
    /// Creates a thumbnail with empty metadata.
    pub fn new(image: EncodedImage) -> Self {
        Self {
            image,
            metadata: GenerationMetadata::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ImageFormat;

    fn png(tag: u8) -> EncodedImage {
        EncodedImage::new(vec![0x89, 0x50, 0x4E, 0x47, tag], ImageFormat::Png)
    }

    #[test]
    fn test_generation_parts_order() {
        let params = ThumbnailParams {
            thumbnail_text: "go".into(),
            ..Default::default()
        };
        let req = ThumbnailRequest::generation(&png(1), &params);

        assert_eq!(req.kind(), RequestKind::Generation);
        assert_eq!(req.parts().len(), 2);
        assert!(matches!(req.parts()[0], RequestPart::Image(_)));
        assert!(matches!(req.parts()[1], RequestPart::Text(_)));
        assert!(req.prompt().unwrap().contains("\"GO\""));
    }

    #[test]
    fn test_modification_parts_order() {
        let subject = png(1);
        let current = EncodedImage::new(vec![0xFF, 0xD8, 0xFF, 2], ImageFormat::Jpeg);
        let req = ThumbnailRequest::modification(&subject, &current, "add lava");

        assert_eq!(req.kind(), RequestKind::Modification);
        assert!(matches!(req.parts()[0], RequestPart::Text(_)));
        let images: Vec<_> = req.images().collect();
        assert_eq!(images, vec![&subject, &current]);
    }
}
