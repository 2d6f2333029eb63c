use super::error::{StateError, StateResult};
use super::{SessionEvent, SessionState, StateTransition};

const MAX_HISTORY: usize = 64;

#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    transition_history: Vec<StateTransition>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        match (self.state, event) {
            (SessionState::Idle, Trigger) => Some(SessionState::CaptureInProgress),
            (SessionState::CaptureInProgress, CaptureReady) => Some(SessionState::FormOpen),
            (SessionState::CaptureInProgress, CaptureFailed) => Some(SessionState::Idle),
            (SessionState::FormOpen, Submit) => Some(SessionState::Submitting),
            (SessionState::Submitting, SubmissionSucceeded) => Some(SessionState::FormOpen),
            (SessionState::Submitting, SubmissionFailed) => Some(SessionState::FormOpen),
            (
                SessionState::CaptureInProgress | SessionState::FormOpen | SessionState::Submitting,
                Close,
            ) => Some(SessionState::Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionState> {
        tracing::debug!(from = ?self.state, event = ?event, "request session transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid session transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        if self.transition_history.len() == MAX_HISTORY {
            self.transition_history.remove(0);
        }
        self.transition_history
            .push(StateTransition::new(self.state, event, next));
        self.state = next;

        Ok(self.state)
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state)
    }
}
