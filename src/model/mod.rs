//! Image model abstraction and providers.

mod provider;
pub mod providers;
mod types;

pub use provider::ThumbnailModel;
pub use types::{
    GeneratedThumbnail, GenerationMetadata, RequestKind, RequestPart, ThumbnailRequest,
};
