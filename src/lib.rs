#![warn(missing_docs)]
//! Beastify - viral YouTube thumbnails from a photo and a few words.
//!
//! The crate collects a subject photo and stylistic choices, turns them into
//! an instruction for a multimodal image model (Gemini), and keeps every
//! returned thumbnail in a session history so it can be edited later without
//! losing the subject's face.
//!
//! # Quick Start
//!
//! ```no_run
//! use beastify::{Action, EncodedImage, GeminiProvider, Studio};
//!
//! #[tokio::main]
//! async fn main() -> beastify::Result<()> {
//!     let studio = Studio::new(GeminiProvider::builder().build()?);
//!     studio.dispatch(Action::SelectSubject(Some(EncodedImage::load("me.jpg")?)));
//!     studio.dispatch(Action::SetThumbnailText("50 hours left".into()));
//!
//!     let receipt = studio.generate().await?;
//!     studio.modify(&receipt.id, "make the background molten lava").await?;
//!
//!     let state = studio.snapshot();
//!     let entry = state.history().get(&receipt.id).expect("just created");
//!     beastify::media::save_jpeg(entry.image(), "thumbnail.jpg")?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli`: the `beastify` command-line interface

pub mod config;
mod error;
pub mod inspiration;
pub mod media;
pub mod model;
pub mod prompt;
pub mod session;

// Re-export error types at crate root
pub use error::{Result, ThumbnailError};

pub use config::StudioConfig;
pub use media::{EncodedImage, ImageFormat};
pub use model::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};
pub use model::{GeneratedThumbnail, GenerationMetadata, ThumbnailModel, ThumbnailRequest};
pub use prompt::{Expression, SubjectPosition, TextStyle, ThumbnailParams};
pub use session::{Action, HistoryEntry, HistoryId, Receipt, SessionState, Studio};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, ThumbnailError};
    pub use crate::media::EncodedImage;
    pub use crate::model::providers::GeminiProvider;
    pub use crate::model::{ThumbnailModel, ThumbnailRequest};
    pub use crate::prompt::{Expression, SubjectPosition, TextStyle, ThumbnailParams};
    pub use crate::session::{Action, Studio};
}
