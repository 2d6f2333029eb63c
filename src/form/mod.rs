mod controller;

pub use controller::{
    FormController, FormEdit, FormOutcome, FormPhase, FormSession, SubmitTicket,
};

use crate::state::SessionId;
use crate::ticket::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("a ticket form is already open ({active})")]
    AlreadyOpen { active: SessionId },
    #[error("no ticket form is open")]
    NoActiveSession,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("the ticket was already submitted")]
    AlreadySubmitted,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
