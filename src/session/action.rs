//! User interactions and request completions, as values.

use crate::media::EncodedImage;
use crate::prompt::{Expression, SubjectPosition, TextStyle};
use crate::session::history::HistoryId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one dispatched model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Returns a token distinct from every other token in this process.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A single state transition applied by [`SessionState::reduce`].
///
/// [`SessionState::reduce`]: crate::session::SessionState::reduce
#[derive(Debug, Clone)]
pub enum Action {
    /// Picks (or clears) the subject photo.
    SelectSubject(Option<EncodedImage>),
    /// Edits the video title.
    SetVideoTitle(String),
    /// Edits the on-image text.
    SetThumbnailText(String),
    /// Picks a lettering style.
    SetTextStyle(TextStyle),
    /// Edits the negative prompt.
    SetNegativePrompt(String),
    /// Picks an expression.
    SetExpression(Expression),
    /// Edits the extra elements.
    SetExtraElements(String),
    /// Edits the clothing style.
    SetClothingStyle(String),
    /// Edits the other people.
    SetOtherPeople(String),
    /// Picks a subject position.
    SetSubjectPosition(SubjectPosition),

    /// Submission refused locally; no request was sent.
    GenerationRejected {
        /// Message for the error region.
        reason: String,
    },
    /// A generation request was dispatched.
    GenerationStarted {
        /// Request identity.
        token: RequestToken,
    },
    /// A generation request finished.
    GenerationSettled {
        /// Request identity.
        token: RequestToken,
        /// Id given to the new history entry on success.
        entry_id: HistoryId,
        /// Subject that was sent.
        subject: EncodedImage,
        /// Image, or the user-facing failure message.
        outcome: Result<EncodedImage, String>,
    },
    /// A generation request was dropped before it finished.
    GenerationAbandoned {
        /// Request identity.
        token: RequestToken,
    },
    /// Restores form defaults and clears result, error and loading.
    Reset,

    /// Removes a history entry.
    DeleteEntry(HistoryId),
    /// Shows an entry full size.
    Enlarge(HistoryId),
    /// Hides the full-size view.
    CloseEnlarged,

    /// Opens the modification dialog for an entry.
    OpenModification(HistoryId),
    /// Edits the modification instruction.
    SetModificationInstruction(String),
    /// Dismisses the modification dialog.
    CloseModification,
    /// A modification request was dispatched for an entry.
    ModificationStarted {
        /// Entry being edited.
        id: HistoryId,
        /// Request identity.
        token: RequestToken,
    },
    /// A modification request finished.
    ModificationSettled {
        /// Entry being edited.
        id: HistoryId,
        /// Request identity.
        token: RequestToken,
        /// Edited image, or the user-facing failure message.
        outcome: Result<EncodedImage, String>,
    },
    /// A modification request was dropped before it finished.
    ModificationAbandoned {
        /// Entry being edited.
        id: HistoryId,
        /// Request identity.
        token: RequestToken,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_distinct() {
        let a = RequestToken::next();
        let b = RequestToken::next();
        assert_ne!(a, b);
    }
}
