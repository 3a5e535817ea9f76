//! The seam between the studio and the external image model.

use crate::error::Result;
use crate::model::types::{GeneratedThumbnail, ThumbnailRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// A multimodal model that turns a [`ThumbnailRequest`] into exactly one image.
///
/// Implementations map refusals, text-only answers and malformed responses to
/// errors; they never retry.
#[async_trait]
pub trait ThumbnailModel: Send + Sync {
    /// Sends the request and awaits the single image answer.
    async fn generate(&self, request: &ThumbnailRequest) -> Result<GeneratedThumbnail>;

    /// Returns the name of this model for display.
    fn name(&self) -> &str;

    /// Checks if the model is reachable and authenticated.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: ThumbnailModel + ?Sized> ThumbnailModel for Arc<T> {
    async fn generate(&self, request: &ThumbnailRequest) -> Result<GeneratedThumbnail> {
        (**self).generate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}
