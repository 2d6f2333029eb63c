use super::FormError;
use crate::capture::CaptureArtifact;
use crate::host::HostSnapshot;
use crate::state::SessionId;
use crate::submission::{SubmissionError, TicketId};
use crate::ticket::{TicketDraft, TicketFields, TicketSeed, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Sending { attempt: u32 },
    Sent { ticket_id: TicketId },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
    Subject(String),
    Description(String),
    Priority(String),
}

/// What a finished submission means for the open form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// The result belongs to a session or attempt that no longer exists.
    Discarded,
    Sent(TicketId),
    Failed(SubmissionError),
}

/// Validated hand-off to the submission client, tagged so late results can be matched.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub session: SessionId,
    pub attempt: u32,
    pub draft: TicketDraft,
}

#[derive(Debug)]
pub struct FormSession {
    id: SessionId,
    seed: TicketSeed,
    fields: TicketFields,
    phase: FormPhase,
    attempts: u32,
    inline_error: Option<ValidationError>,
}

impl FormSession {
    fn new(id: SessionId, seed: TicketSeed) -> Self {
        let fields = TicketFields::for_seed(&seed);
        Self {
            id,
            seed,
            fields,
            phase: FormPhase::Editing,
            attempts: 0,
            inline_error: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn capture(&self) -> &CaptureArtifact {
        &self.seed.capture
    }

    pub fn host(&self) -> &HostSnapshot {
        &self.seed.host
    }

    pub fn fields(&self) -> &TicketFields {
        &self.fields
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn inline_error(&self) -> Option<&ValidationError> {
        self.inline_error.as_ref()
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.phase, FormPhase::Sending { .. })
    }

    /// Controls stay live while sending; only submit is withheld.
    pub fn can_submit(&self) -> bool {
        matches!(self.phase, FormPhase::Editing | FormPhase::Failed { .. })
    }
}

/// Owns the one modal ticket session that may exist at a time.
#[derive(Debug, Default)]
pub struct FormController {
    active: Option<FormSession>,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&FormSession> {
        self.active.as_ref()
    }

    pub fn open_session(
        &mut self,
        id: SessionId,
        seed: TicketSeed,
    ) -> Result<&FormSession, FormError> {
        if let Some(active) = &self.active {
            return Err(FormError::AlreadyOpen { active: active.id });
        }
        Ok(&*self.active.insert(FormSession::new(id, seed)))
    }

    pub fn edit(&mut self, edit: FormEdit) -> Result<(), FormError> {
        let session = self.active.as_mut().ok_or(FormError::NoActiveSession)?;
        if matches!(session.phase, FormPhase::Sent { .. }) {
            return Err(FormError::AlreadySubmitted);
        }

        match edit {
            FormEdit::Subject(subject) => session.fields.subject = subject,
            FormEdit::Description(description) => session.fields.description = description,
            FormEdit::Priority(priority) => session.fields.priority = priority,
        }
        session.inline_error = None;
        Ok(())
    }

    /// Validates the current fields and moves the form into its sending phase.
    /// A validation failure leaves the phase untouched and records the inline error.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, FormError> {
        let session = self.active.as_mut().ok_or(FormError::NoActiveSession)?;
        match session.phase {
            FormPhase::Sending { .. } => return Err(FormError::SubmissionInFlight),
            FormPhase::Sent { .. } => return Err(FormError::AlreadySubmitted),
            FormPhase::Editing | FormPhase::Failed { .. } => {}
        }

        let validated = match session.fields.validate() {
            Ok(validated) => validated,
            Err(err) => {
                tracing::debug!(session = %session.id, ?err, "ticket validation failed");
                session.inline_error = Some(err.clone());
                return Err(err.into());
            }
        };

        session.attempts += 1;
        session.phase = FormPhase::Sending {
            attempt: session.attempts,
        };
        session.inline_error = None;

        Ok(SubmitTicket {
            session: session.id,
            attempt: session.attempts,
            draft: TicketDraft::new(validated, &session.seed),
        })
    }

    pub fn finish_submit(
        &mut self,
        id: SessionId,
        attempt: u32,
        result: Result<TicketId, SubmissionError>,
    ) -> FormOutcome {
        let Some(session) = self.active.as_mut().filter(|session| session.id == id) else {
            tracing::debug!(session = %id, attempt, "dropping result for closed session");
            return FormOutcome::Discarded;
        };
        if session.phase != (FormPhase::Sending { attempt }) {
            tracing::debug!(session = %id, attempt, phase = ?session.phase, "dropping stale submission result");
            return FormOutcome::Discarded;
        }

        match result {
            Ok(ticket_id) => {
                session.phase = FormPhase::Sent {
                    ticket_id: ticket_id.clone(),
                };
                FormOutcome::Sent(ticket_id)
            }
            Err(err) => {
                session.phase = FormPhase::Failed {
                    message: err.user_message(),
                };
                FormOutcome::Failed(err)
            }
        }
    }

    /// Releases the session (and with it the capture) if `id` is the open one.
    pub fn close(&mut self, id: SessionId) -> Option<FormSession> {
        if self.active.as_ref().map(FormSession::id) != Some(id) {
            return None;
        }
        self.active.take()
    }

    pub fn close_any(&mut self) -> Option<FormSession> {
        self.active.take()
    }
}
