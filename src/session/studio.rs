//! Runs the generation and modification flows against a model.

use crate::error::{Result, ThumbnailError};
use crate::model::{GenerationMetadata, ThumbnailModel, ThumbnailRequest};
use crate::session::action::{Action, RequestToken};
use crate::session::history::HistoryId;
use crate::session::state::SessionState;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Returned when a request completes successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// History entry that was created or edited.
    pub id: HistoryId,
    /// Metadata reported by the model.
    pub metadata: GenerationMetadata,
}

/// A thumbnail studio session bound to one model.
///
/// The state lock is only held while actions are applied, never across a
/// model call, so a generation and modifications of different entries can be
/// awaited concurrently.
pub struct Studio<M> {
    model: M,
    state: Mutex<SessionState>,
}

fn apply(state: &mut SessionState, action: Action) {
    *state = std::mem::take(state).reduce(action);
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears an in-flight marker when a request future is dropped before it
/// settles (timeout, `select!`, task abort or a panicking model).
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    abandon: Option<Action>,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<SessionState>, abandon: Action) -> Self {
        Self {
            state,
            abandon: Some(abandon),
        }
    }

    fn disarm(mut self) {
        self.abandon = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(action) = self.abandon.take() {
            tracing::debug!(?action, "request dropped before it settled");
            apply(&mut lock(self.state), action);
        }
    }
}

impl<M: ThumbnailModel> Studio<M> {
    /// Creates a session with an empty form and history.
    pub fn new(model: M) -> Self {
        Self {
            model,
            state: Mutex::new(SessionState::new()),
        }
    }

    /// The underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Applies a user action.
    pub fn dispatch(&self, action: Action) {
        apply(&mut lock(&self.state), action);
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    /// Submits the form.
    ///
    /// Missing inputs set the validation error and return without contacting
    /// the model. On success the new thumbnail becomes the result and the
    /// newest history entry. Dropping the returned future clears the loading
    /// flag.
    pub async fn generate(&self) -> Result<Receipt> {
        let (token, request, subject) = {
            let mut state = lock(&self.state);
            if state.is_loading() {
                return Err(ThumbnailError::Busy(
                    "a thumbnail is already being generated".into(),
                ));
            }
            let subject = match state.form().validate() {
                Ok(subject) => subject.clone(),
                Err(e) => {
                    apply(
                        &mut state,
                        Action::GenerationRejected {
                            reason: e.user_message(),
                        },
                    );
                    return Err(e);
                }
            };
            let request = ThumbnailRequest::generation(&subject, &state.form().params);
            let token = RequestToken::next();
            apply(&mut state, Action::GenerationStarted { token });
            (token, request, subject)
        };
        let in_flight = InFlight::new(&self.state, Action::GenerationAbandoned { token });

        tracing::debug!(model = self.model.name(), "generation started");
        let outcome = self.model.generate(&request).await;
        let entry_id = HistoryId::generate();

        if let Err(e) = &outcome {
            tracing::debug!("generation failed: {e}");
        }
        in_flight.disarm();
        self.dispatch(Action::GenerationSettled {
            token,
            entry_id: entry_id.clone(),
            subject,
            outcome: outcome
                .as_ref()
                .map(|t| t.image.clone())
                .map_err(ThumbnailError::user_message),
        });

        let generated = outcome?;
        tracing::debug!(id = %entry_id, "generation added to history");
        Ok(Receipt {
            id: entry_id,
            metadata: generated.metadata,
        })
    }

    /// Edits history entry `id` according to `instruction`.
    ///
    /// The entry's original subject is sent as the identity reference. Only
    /// one modification per entry may be in flight. If the entry is deleted
    /// before the model answers, the edit is discarded and `NotFound` is
    /// returned.
    pub async fn modify(&self, id: &HistoryId, instruction: &str) -> Result<Receipt> {
        let instruction = instruction.trim();
        let (token, request) = {
            let mut state = lock(&self.state);
            let entry = state
                .history()
                .get(id)
                .ok_or_else(|| ThumbnailError::NotFound(id.to_string()))?;
            if instruction.is_empty() {
                return Err(ThumbnailError::Validation(
                    "Please describe the modification.".into(),
                ));
            }
            if state.is_modifying(id) {
                return Err(ThumbnailError::Busy(format!(
                    "entry {id} is already being modified"
                )));
            }
            let request =
                ThumbnailRequest::modification(entry.original_subject(), entry.image(), instruction);
            let token = RequestToken::next();
            apply(
                &mut state,
                Action::ModificationStarted {
                    id: id.clone(),
                    token,
                },
            );
            (token, request)
        };
        let in_flight = InFlight::new(
            &self.state,
            Action::ModificationAbandoned {
                id: id.clone(),
                token,
            },
        );

        tracing::debug!(%id, "modification started");
        let outcome = self.model.generate(&request).await;
        if let Err(e) = &outcome {
            tracing::debug!(%id, "modification failed: {e}");
        }

        in_flight.disarm();
        let still_listed = {
            let mut state = lock(&self.state);
            apply(
                &mut state,
                Action::ModificationSettled {
                    id: id.clone(),
                    token,
                    outcome: outcome
                        .as_ref()
                        .map(|t| t.image.clone())
                        .map_err(ThumbnailError::user_message),
                },
            );
            state.history().contains(id)
        };

        let generated = outcome?;
        if !still_listed {
            return Err(ThumbnailError::NotFound(id.to_string()));
        }
        Ok(Receipt {
            id: id.clone(),
            metadata: generated.metadata,
        })
    }

    /// Submits the open modification dialog.
    pub async fn submit_modification(&self) -> Result<Receipt> {
        let draft = lock(&self.state)
            .modification()
            .cloned()
            .ok_or_else(|| ThumbnailError::Validation("No thumbnail selected for modification.".into()))?;
        self.modify(&draft.target, &draft.instruction).await
    }
}
