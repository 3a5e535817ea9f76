//! The studio session: form, history, dialogs and request orchestration.
//!
//! Every change goes through [`SessionState::reduce`] as an [`Action`];
//! [`Studio`] wraps the state and runs the model calls.

mod action;
mod form;
mod history;
mod state;
mod studio;

pub use action::{Action, RequestToken};
pub use form::{FormState, MISSING_INPUT_MESSAGE};
pub use history::{History, HistoryEntry, HistoryId};
pub use state::{ModificationDraft, RequestStatus, SessionState};
pub use studio::{Receipt, Studio};
