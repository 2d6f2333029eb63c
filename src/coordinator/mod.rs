use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::capture::{self, ScreenGrabber};
use crate::form::{FormController, FormEdit, FormError, FormOutcome, FormSession};
use crate::host::{self, HostProbe};
use crate::state::{SessionEvent, SessionId, SessionMachine, SessionState, StateError};
use crate::submission::{SubmissionClient, SubmissionError, TicketId};
use crate::ticket::{TicketDraft, TicketSeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Hotkey,
    TrayMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Another session was active; nothing happened.
    Ignored { state: SessionState },
    CaptureFailed,
    Opened { session: SessionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Cancelled,
    AutoClosed,
    Shutdown,
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    State(#[from] StateError),
}

/// A submission detached from the coordinator so it can run off the UI thread.
pub struct SubmissionJob {
    session: SessionId,
    attempt: u32,
    draft: TicketDraft,
    client: Arc<dyn SubmissionClient>,
}

impl SubmissionJob {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn run(self) -> SubmissionReport {
        let result = self.client.submit(&self.draft);
        match &result {
            Ok(ticket_id) => {
                tracing::info!(session = %self.session, attempt = self.attempt, %ticket_id, "ticket submitted")
            }
            Err(err) => {
                tracing::warn!(session = %self.session, attempt = self.attempt, %err, "ticket submission failed")
            }
        }
        SubmissionReport {
            session: self.session,
            attempt: self.attempt,
            result,
        }
    }
}

impl fmt::Debug for SubmissionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionJob")
            .field("session", &self.session)
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub session: SessionId,
    pub attempt: u32,
    pub result: Result<TicketId, SubmissionError>,
}

/// Serializes triggers, form edits, and submission results for the one ticket session.
pub struct Coordinator<G, P> {
    machine: SessionMachine,
    form: FormController,
    grabber: G,
    probe: P,
    client: Arc<dyn SubmissionClient>,
    thumbnail_max_edge: u32,
    last_session: SessionId,
}

impl<G, P> Coordinator<G, P>
where
    G: ScreenGrabber,
    P: HostProbe,
{
    pub fn new(
        grabber: G,
        probe: P,
        client: Arc<dyn SubmissionClient>,
        thumbnail_max_edge: u32,
    ) -> Self {
        Self {
            machine: SessionMachine::new(),
            form: FormController::new(),
            grabber,
            probe,
            client,
            thumbnail_max_edge,
            last_session: SessionId::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn form(&self) -> Option<&FormSession> {
        self.form.session()
    }

    pub fn on_trigger(&mut self, source: TriggerSource) -> TriggerOutcome {
        if !self.machine.can_transition(SessionEvent::Trigger) {
            let state = self.machine.state();
            tracing::debug!(?source, ?state, "trigger ignored while a session is active");
            return TriggerOutcome::Ignored { state };
        }
        self.apply(SessionEvent::Trigger);

        let session = self.last_session.next();
        self.last_session = session;
        tracing::info!(?source, %session, "ticket session started");

        let capture = match capture::capture_with(&self.grabber, self.thumbnail_max_edge) {
            Ok(capture) => capture,
            Err(err) => {
                tracing::warn!(%session, %err, "screen capture failed; session aborted");
                self.apply(SessionEvent::CaptureFailed);
                return TriggerOutcome::CaptureFailed;
            }
        };
        let seed = TicketSeed {
            host: host::snapshot_with(&self.probe),
            capture: Arc::new(capture),
        };

        if let Err(err) = self.form.open_session(session, seed) {
            tracing::error!(%session, %err, "form refused a new session");
            self.apply(SessionEvent::CaptureFailed);
            return TriggerOutcome::Ignored {
                state: self.machine.state(),
            };
        }
        self.apply(SessionEvent::CaptureReady);
        TriggerOutcome::Opened { session }
    }

    pub fn edit(&mut self, edit: FormEdit) -> Result<(), CoordinatorError> {
        self.form.edit(edit)?;
        Ok(())
    }

    /// Validates the form and hands back a job for a worker thread. Validation
    /// failures leave the session open and make no client call.
    pub fn submit(&mut self) -> Result<SubmissionJob, CoordinatorError> {
        if !self.machine.can_transition(SessionEvent::Submit) {
            let err = match self.machine.state() {
                SessionState::Submitting => FormError::SubmissionInFlight,
                _ => FormError::NoActiveSession,
            };
            return Err(err.into());
        }

        let ticket = self.form.begin_submit()?;
        self.machine.transition(SessionEvent::Submit)?;
        Ok(SubmissionJob {
            session: ticket.session,
            attempt: ticket.attempt,
            draft: ticket.draft,
            client: Arc::clone(&self.client),
        })
    }

    pub fn complete_submission(&mut self, report: SubmissionReport) -> FormOutcome {
        let outcome = self
            .form
            .finish_submit(report.session, report.attempt, report.result);
        match &outcome {
            FormOutcome::Discarded => {
                tracing::debug!(session = %report.session, attempt = report.attempt, "late submission result discarded");
            }
            FormOutcome::Sent(_) => self.apply(SessionEvent::SubmissionSucceeded),
            FormOutcome::Failed(_) => self.apply(SessionEvent::SubmissionFailed),
        }
        outcome
    }

    /// Closes `session` if it is still the open one. Returns whether anything closed.
    pub fn close_session(&mut self, session: SessionId, reason: CloseReason) -> bool {
        if self.form.close(session).is_none() {
            tracing::debug!(%session, ?reason, "close ignored for inactive session");
            return false;
        }
        self.apply(SessionEvent::Close);
        tracing::info!(%session, ?reason, "ticket session closed");
        true
    }

    pub fn shutdown(&mut self) {
        if let Some(active) = self.form.close_any() {
            self.apply(SessionEvent::Close);
            tracing::info!(session = %active.id(), reason = ?CloseReason::Shutdown, "ticket session closed");
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        if let Err(err) = self.machine.transition(event) {
            tracing::error!(?err, "session state out of step with form");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::sync::mpsc;
    use std::sync::Mutex;

    use super::*;
    use crate::capture::{CaptureError, RawFrame};
    use crate::form::FormPhase;
    use crate::ticket::Priority;

    struct FakeScreenGrabber {
        calls: Cell<usize>,
        fail: Cell<bool>,
    }

    impl FakeScreenGrabber {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                fail: Cell::new(false),
            }
        }
    }

    impl ScreenGrabber for FakeScreenGrabber {
        fn grab_screen(&self) -> Result<RawFrame, CaptureError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                return Err(CaptureError::DisplayUnavailable);
            }
            Ok(RawFrame {
                width: 64,
                height: 36,
                rgba: vec![128; 64 * 36 * 4],
            })
        }
    }

    struct FakeHostProbe;

    impl HostProbe for FakeHostProbe {
        fn hostname(&self) -> Option<String> {
            Some("ws-042".to_string())
        }
        fn ip_address(&self) -> Option<std::net::IpAddr> {
            Some("10.0.0.42".parse().expect("valid ip"))
        }
        fn mac_address(&self) -> Option<String> {
            None
        }
        fn os_version(&self) -> Option<String> {
            Some("Windows 11 Pro".to_string())
        }
        fn username(&self) -> Option<String> {
            Some("jdoe".to_string())
        }
        fn cpu_percent(&self) -> Option<f32> {
            Some(12.5)
        }
        fn ram_percent(&self) -> Option<f32> {
            Some(48.0)
        }
        fn disk_percent(&self) -> Option<f32> {
            Some(55.0)
        }
    }

    #[derive(Debug, Clone)]
    struct SubmittedTicket {
        description: String,
        priority: Priority,
        image_size: (u32, u32),
    }

    #[derive(Default)]
    struct FakeSubmissionClient {
        submitted: Mutex<Vec<SubmittedTicket>>,
        scripted: Mutex<VecDeque<Result<TicketId, SubmissionError>>>,
    }

    impl FakeSubmissionClient {
        fn scripted(results: Vec<Result<TicketId, SubmissionError>>) -> Arc<Self> {
            Arc::new(Self {
                submitted: Mutex::new(Vec::new()),
                scripted: Mutex::new(results.into()),
            })
        }

        fn submitted(&self) -> Vec<SubmittedTicket> {
            self.submitted.lock().expect("submitted lock").clone()
        }
    }

    impl SubmissionClient for FakeSubmissionClient {
        fn submit(&self, draft: &TicketDraft) -> Result<TicketId, SubmissionError> {
            self.submitted
                .lock()
                .expect("submitted lock")
                .push(SubmittedTicket {
                    description: draft.description.clone(),
                    priority: draft.priority,
                    image_size: (draft.capture.width(), draft.capture.height()),
                });
            self.scripted
                .lock()
                .expect("scripted lock")
                .pop_front()
                .unwrap_or_else(|| Ok(TicketId::new("T-1")))
        }
    }

    /// Holds each submission until the test releases it.
    struct GatedSubmissionClient {
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl SubmissionClient for GatedSubmissionClient {
        fn submit(&self, _draft: &TicketDraft) -> Result<TicketId, SubmissionError> {
            self.release
                .lock()
                .expect("release lock")
                .recv()
                .map_err(|_| SubmissionError::network("gate dropped"))?;
            Ok(TicketId::new("T-late"))
        }
    }

    type TestCoordinator = Coordinator<FakeScreenGrabber, FakeHostProbe>;

    fn coordinator_with(client: Arc<dyn SubmissionClient>) -> TestCoordinator {
        Coordinator::new(FakeScreenGrabber::new(), FakeHostProbe, client, 32)
    }

    fn opened(coordinator: &mut TestCoordinator) -> SessionId {
        match coordinator.on_trigger(TriggerSource::Hotkey) {
            TriggerOutcome::Opened { session } => session,
            other => panic!("expected an open session, got {other:?}"),
        }
    }

    fn fill(coordinator: &mut TestCoordinator, description: &str, priority: &str) {
        coordinator
            .edit(FormEdit::Description(description.to_string()))
            .expect("description edit");
        coordinator
            .edit(FormEdit::Priority(priority.to_string()))
            .expect("priority edit");
    }

    #[test]
    fn trigger_opens_prefilled_form_with_capture() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        let session = opened(&mut coordinator);

        assert_eq!(coordinator.state(), SessionState::FormOpen);
        let form = coordinator.form().expect("form should be open");
        assert_eq!(form.id(), session);
        assert_eq!(form.fields().description, "");
        assert_eq!(form.fields().priority, "Normal");
        assert_eq!(form.host().hostname, "ws-042");
        assert_eq!((form.capture().width(), form.capture().height()), (64, 36));
        assert!(form.capture().thumbnail.width() <= 32);
    }

    #[test]
    fn second_trigger_while_form_open_is_ignored() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        let session = opened(&mut coordinator);

        assert_eq!(
            coordinator.on_trigger(TriggerSource::TrayMenu),
            TriggerOutcome::Ignored {
                state: SessionState::FormOpen
            }
        );
        assert_eq!(coordinator.form().map(FormSession::id), Some(session));
        assert_eq!(coordinator.grabber.calls.get(), 1);
    }

    #[test]
    fn trigger_while_submitting_is_ignored() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        opened(&mut coordinator);
        fill(&mut coordinator, "vpn down", "Low");
        let _job = coordinator.submit().expect("submit");

        assert_eq!(
            coordinator.on_trigger(TriggerSource::Hotkey),
            TriggerOutcome::Ignored {
                state: SessionState::Submitting
            }
        );
        assert_eq!(coordinator.grabber.calls.get(), 1);
    }

    #[test]
    fn capture_failure_returns_to_idle_without_form() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        coordinator.grabber.fail.set(true);

        assert_eq!(
            coordinator.on_trigger(TriggerSource::Hotkey),
            TriggerOutcome::CaptureFailed
        );
        assert_eq!(coordinator.state(), SessionState::Idle);
        assert!(coordinator.form().is_none());

        coordinator.grabber.fail.set(false);
        opened(&mut coordinator);
        assert_eq!(coordinator.state(), SessionState::FormOpen);
    }

    #[test]
    fn empty_description_keeps_session_open_without_client_call() {
        let client = FakeSubmissionClient::scripted(vec![]);
        let mut coordinator = coordinator_with(client.clone());
        opened(&mut coordinator);

        let err = coordinator
            .submit()
            .expect_err("empty description should not submit");
        assert!(matches!(err, CoordinatorError::Form(FormError::Validation(_))));
        assert_eq!(coordinator.state(), SessionState::FormOpen);
        assert!(coordinator
            .form()
            .and_then(FormSession::inline_error)
            .is_some());
        assert!(client.submitted().is_empty());
    }

    #[test]
    fn successful_submission_sends_full_image_and_closes_to_idle() {
        let client = FakeSubmissionClient::scripted(vec![Ok(TicketId::new("T-1001"))]);
        let mut coordinator = coordinator_with(client.clone());
        let session = opened(&mut coordinator);
        fill(&mut coordinator, "printer jam", "High");

        let job = coordinator.submit().expect("submit");
        assert_eq!(coordinator.state(), SessionState::Submitting);
        let outcome = coordinator.complete_submission(job.run());

        assert_eq!(outcome, FormOutcome::Sent(TicketId::new("T-1001")));
        assert_eq!(coordinator.state(), SessionState::FormOpen);
        assert_eq!(
            coordinator.form().map(FormSession::phase),
            Some(&FormPhase::Sent {
                ticket_id: TicketId::new("T-1001")
            })
        );

        let submitted = client.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].description, "printer jam");
        assert_eq!(submitted[0].priority, Priority::High);
        assert_eq!(submitted[0].image_size, (64, 36));

        assert!(coordinator.close_session(session, CloseReason::AutoClosed));
        assert_eq!(coordinator.state(), SessionState::Idle);
        assert!(coordinator.form().is_none());
    }

    #[test]
    fn network_failure_preserves_fields_and_allows_resubmit() {
        let client = FakeSubmissionClient::scripted(vec![
            Err(SubmissionError::network("connection refused")),
            Ok(TicketId::new("T-2")),
        ]);
        let mut coordinator = coordinator_with(client.clone());
        opened(&mut coordinator);
        fill(&mut coordinator, "no sound", "Urgent");

        let job = coordinator.submit().expect("submit");
        let outcome = coordinator.complete_submission(job.run());
        assert!(matches!(outcome, FormOutcome::Failed(SubmissionError::Network { .. })));
        assert_eq!(coordinator.state(), SessionState::FormOpen);

        let form = coordinator.form().expect("form stays open");
        assert_eq!(form.fields().description, "no sound");
        assert_eq!(form.fields().priority, "Urgent");

        let retry = coordinator.submit().expect("resubmit");
        assert_eq!(retry.attempt(), 2);
        assert_eq!(
            coordinator.complete_submission(retry.run()),
            FormOutcome::Sent(TicketId::new("T-2"))
        );
        assert_eq!(client.submitted().len(), 2);
    }

    #[test]
    fn submit_while_submitting_is_rejected() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        opened(&mut coordinator);
        fill(&mut coordinator, "disk full", "Normal");
        let _job = coordinator.submit().expect("submit");

        let err = coordinator.submit().expect_err("second submit");
        assert!(matches!(
            err,
            CoordinatorError::Form(FormError::SubmissionInFlight)
        ));
    }

    #[test]
    fn submit_without_session_is_rejected() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        let err = coordinator.submit().expect_err("nothing to submit");
        assert!(matches!(
            err,
            CoordinatorError::Form(FormError::NoActiveSession)
        ));
    }

    #[test]
    fn cancel_during_submission_is_processed_and_late_result_discarded() {
        let (release, gate) = mpsc::channel();
        let client = Arc::new(GatedSubmissionClient {
            release: Mutex::new(gate),
        });
        let mut coordinator = coordinator_with(client);
        let session = opened(&mut coordinator);
        fill(&mut coordinator, "screen flicker", "Normal");

        let job = coordinator.submit().expect("submit");
        let worker = std::thread::spawn(move || job.run());

        assert!(coordinator.close_session(session, CloseReason::Cancelled));
        assert_eq!(coordinator.state(), SessionState::Idle);

        release.send(()).expect("release submission");
        let report = worker.join().expect("worker thread");
        assert_eq!(report.result, Ok(TicketId::new("T-late")));

        assert_eq!(coordinator.complete_submission(report), FormOutcome::Discarded);
        assert_eq!(coordinator.state(), SessionState::Idle);
        assert!(coordinator.form().is_none());
    }

    #[test]
    fn late_result_does_not_leak_into_next_session() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        let first = opened(&mut coordinator);
        fill(&mut coordinator, "first", "Normal");
        let job = coordinator.submit().expect("submit");
        coordinator.close_session(first, CloseReason::Cancelled);

        let second = opened(&mut coordinator);
        assert_ne!(first, second);
        assert_eq!(coordinator.complete_submission(job.run()), FormOutcome::Discarded);
        assert_eq!(coordinator.state(), SessionState::FormOpen);
        assert_eq!(
            coordinator.form().map(FormSession::phase),
            Some(&FormPhase::Editing)
        );
    }

    #[test]
    fn close_of_stale_session_is_ignored() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        let first = opened(&mut coordinator);
        assert!(coordinator.close_session(first, CloseReason::Cancelled));
        let second = opened(&mut coordinator);

        assert!(!coordinator.close_session(first, CloseReason::AutoClosed));
        assert_eq!(coordinator.form().map(FormSession::id), Some(second));
    }

    #[test]
    fn shutdown_closes_active_session() {
        let mut coordinator = coordinator_with(FakeSubmissionClient::scripted(vec![]));
        opened(&mut coordinator);
        fill(&mut coordinator, "bye", "Low");
        let _job = coordinator.submit().expect("submit");

        coordinator.shutdown();
        assert_eq!(coordinator.state(), SessionState::Idle);
        assert!(coordinator.form().is_none());

        coordinator.shutdown();
        assert_eq!(coordinator.state(), SessionState::Idle);
    }
}
