//! Session state and its reducer.

use crate::media::EncodedImage;
use crate::session::action::{Action, RequestToken};
use crate::session::form::FormState;
use crate::session::history::{History, HistoryEntry, HistoryId};
use std::collections::BTreeMap;

/// Lifecycle of a model request as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus<T> {
    /// Dispatched, not yet answered.
    Pending,
    /// Answered with a payload.
    Succeeded(T),
    /// Failed with a user-facing reason.
    Failed(String),
}

/// The modification dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationDraft {
    /// Entry being edited.
    pub target: HistoryId,
    /// Instruction typed so far.
    pub instruction: String,
}

/// Everything the studio shows. Only [`SessionState::reduce`] changes it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    form: FormState,
    result: Option<EncodedImage>,
    error: Option<String>,
    history: History,
    enlarged: Option<HistoryId>,
    modification: Option<ModificationDraft>,
    pending_generation: Option<RequestToken>,
    pending_modifications: BTreeMap<HistoryId, RequestToken>,
}

impl SessionState {
    /// An empty session with form defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Form contents.
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Latest generated thumbnail.
    pub fn result(&self) -> Option<&EncodedImage> {
        self.result.as_ref()
    }

    /// Message in the error region.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Session history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Entry shown full size.
    pub fn enlarged(&self) -> Option<&HistoryEntry> {
        self.enlarged.as_ref().and_then(|id| self.history.get(id))
    }

    /// Open modification dialog.
    pub fn modification(&self) -> Option<&ModificationDraft> {
        self.modification.as_ref()
    }

    /// True while a generation request is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending_generation.is_some()
    }

    /// True while a modification of `id` is in flight.
    pub fn is_modifying(&self, id: &HistoryId) -> bool {
        self.pending_modifications.contains_key(id)
    }

    /// Entries with a modification in flight.
    pub fn busy_entries(&self) -> impl Iterator<Item = &HistoryId> {
        self.pending_modifications.keys()
    }

    /// What the output panel shows: a spinner, an error, or the result.
    pub fn output_status(&self) -> Option<RequestStatus<&EncodedImage>> {
        if self.is_loading() {
            return Some(RequestStatus::Pending);
        }
        if let Some(error) = &self.error {
            return Some(RequestStatus::Failed(error.clone()));
        }
        self.result.as_ref().map(RequestStatus::Succeeded)
    }

    /// Applies one action and returns the next state.
    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::SelectSubject(subject) => self.form.subject = subject,
            Action::SetVideoTitle(v) => self.form.params.video_title = v,
            Action::SetThumbnailText(v) => self.form.params.thumbnail_text = v,
            Action::SetTextStyle(v) => self.form.params.text_style = v,
            Action::SetNegativePrompt(v) => self.form.params.negative_prompt = v,
            Action::SetExpression(v) => self.form.params.expression = v,
            Action::SetExtraElements(v) => self.form.params.extra_elements = v,
            Action::SetClothingStyle(v) => self.form.params.clothing_style = v,
            Action::SetOtherPeople(v) => self.form.params.other_people = v,
            Action::SetSubjectPosition(v) => self.form.params.subject_position = v,

            Action::GenerationRejected { reason } => self.error = Some(reason),
            Action::GenerationStarted { token } => {
                self.pending_generation = Some(token);
                self.error = None;
                self.result = None;
            }
            Action::GenerationSettled {
                token,
                entry_id,
                subject,
                outcome,
            } => {
                // After a reset the form no longer waits on this request, but
                // a finished thumbnail still belongs in history.
                let current = self.pending_generation == Some(token);
                if current {
                    self.pending_generation = None;
                }
                match outcome {
                    Ok(image) => {
                        let entry = HistoryEntry::new(entry_id, image.clone(), subject);
                        if !self.history.prepend(entry) {
                            tracing::warn!("dropping generated thumbnail with duplicate history id");
                        }
                        if current {
                            self.result = Some(image);
                        }
                    }
                    Err(reason) if current => self.error = Some(reason),
                    Err(reason) => tracing::debug!("ignoring failure of a reset generation: {reason}"),
                }
            }
            Action::GenerationAbandoned { token } => {
                if self.pending_generation == Some(token) {
                    self.pending_generation = None;
                }
            }
            Action::Reset => {
                self.form = FormState::default();
                self.result = None;
                self.error = None;
                self.pending_generation = None;
            }

            Action::DeleteEntry(id) => {
                self.history.delete(&id);
                if self.enlarged.as_ref() == Some(&id) {
                    self.enlarged = None;
                }
                if self.modification.as_ref().map(|d| &d.target) == Some(&id) {
                    self.modification = None;
                }
            }
            Action::Enlarge(id) => {
                if self.history.contains(&id) {
                    self.enlarged = Some(id);
                }
            }
            Action::CloseEnlarged => self.enlarged = None,

            Action::OpenModification(id) => {
                if self.history.contains(&id) {
                    self.modification = Some(ModificationDraft {
                        target: id,
                        instruction: String::new(),
                    });
                }
            }
            Action::SetModificationInstruction(text) => {
                if let Some(draft) = self.modification.as_mut() {
                    draft.instruction = text;
                }
            }
            Action::CloseModification => self.modification = None,
            Action::ModificationStarted { id, token } => {
                if self.history.contains(&id) && !self.pending_modifications.contains_key(&id) {
                    self.pending_modifications.insert(id, token);
                    self.error = None;
                }
            }
            Action::ModificationSettled { id, token, outcome } => {
                if self.pending_modifications.get(&id) != Some(&token) {
                    tracing::debug!(%id, "ignoring settlement of an unknown modification");
                    return self;
                }
                self.pending_modifications.remove(&id);
                match outcome {
                    Ok(image) => {
                        if self.history.replace_image(&id, image) {
                            if self.modification.as_ref().map(|d| &d.target) == Some(&id) {
                                self.modification = None;
                            }
                        } else {
                            tracing::debug!(%id, "entry deleted before its modification finished");
                        }
                    }
                    Err(reason) => self.error = Some(reason),
                }
            }
            Action::ModificationAbandoned { id, token } => {
                if self.pending_modifications.get(&id) == Some(&token) {
                    self.pending_modifications.remove(&id);
                }
            }
        }
        self
    }
}
