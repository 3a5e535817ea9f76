//! The thumbnail form.

use crate::error::{Result, ThumbnailError};
use crate::media::EncodedImage;
use crate::prompt::ThumbnailParams;

/// Shown when the form is submitted without a subject or thumbnail text.
pub const MISSING_INPUT_MESSAGE: &str =
    "Please provide an image and the short thumbnail text.";

/// Subject photo plus the text parameters. Everything resets together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// Uploaded subject photo.
    pub subject: Option<EncodedImage>,
    /// Text fields and choices.
    pub params: ThumbnailParams,
}

impl FormState {
    /// Returns the subject if the form can be submitted.
    pub fn validate(&self) -> Result<&EncodedImage> {
        match &self.subject {
            Some(subject) if !self.params.thumbnail_text.trim().is_empty() => Ok(subject),
            _ => Err(ThumbnailError::Validation(MISSING_INPUT_MESSAGE.into())),
        }
    }

    /// True when both required inputs are present.
    pub fn is_submittable(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ImageFormat;

    fn subject() -> EncodedImage {
        EncodedImage::new(vec![0xFF, 0xD8, 0xFF], ImageFormat::Jpeg)
    }

    #[test]
    fn test_requires_subject_and_text() {
        let mut form = FormState::default();
        assert!(!form.is_submittable());

        form.params.thumbnail_text = "win".into();
        assert!(matches!(form.validate(), Err(ThumbnailError::Validation(_))));

        form.subject = Some(subject());
        assert_eq!(form.validate().unwrap(), &subject());
    }

    #[test]
    fn test_whitespace_text_is_missing() {
        let form = FormState {
            subject: Some(subject()),
            params: ThumbnailParams {
                thumbnail_text: "   ".into(),
                ..Default::default()
            },
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.user_message(), MISSING_INPUT_MESSAGE);
    }
}
