use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use gtk4::prelude::*;
use gtk4::{glib, Application};

use crate::capture::SystemScreenGrabber;
use crate::config::AppConfig;
use crate::coordinator::{
    CloseReason, Coordinator, CoordinatorError, SubmissionReport, TriggerOutcome, TriggerSource,
};
use crate::error::{AppError, AppResult};
use crate::form::{FormEdit, FormError, FormOutcome};
use crate::host::SystemHostProbe;
use crate::notification;
use crate::state::SessionId;
use crate::submission::{HttpSubmissionClient, SubmissionClient, SubmissionError};
use crate::ui::{default_color_tokens, StyleTokens, LAYOUT_TOKENS};

mod hotkey;
mod runtime_css;
mod ticket_window;
mod tray;
mod worker;

use self::hotkey::HotkeyListener;
use self::runtime_css::install_runtime_css;
use self::ticket_window::{TicketWindow, TicketWindowActions};
use self::tray::TrayHandle;
use self::worker::spawn_worker_action;

const APPLICATION_ID: &str = "io.github.helpdesk_agent.HelpdeskAgent";
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const SUBMISSION_WORKER: &str = "ticket-submit";

type AgentCoordinator = Coordinator<SystemScreenGrabber, SystemHostProbe>;

/// Messages from listener threads into the GTK main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiEvent {
    Trigger(TriggerSource),
    ExitRequested,
    TrayUnavailable(String),
}

struct RuntimeInner {
    application: Application,
    coordinator: RefCell<AgentCoordinator>,
    window: RefCell<Option<TicketWindow>>,
    style: StyleTokens,
    success_close_delay: Duration,
    fatal: RefCell<Option<String>>,
}

/// Main-thread glue between the coordinator and the ticket window.
#[derive(Clone)]
struct AgentRuntime {
    inner: Rc<RuntimeInner>,
}

impl AgentRuntime {
    fn new(application: Application, coordinator: AgentCoordinator, config: &AppConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                application,
                coordinator: RefCell::new(coordinator),
                window: RefCell::new(None),
                style: LAYOUT_TOKENS,
                success_close_delay: Duration::from_millis(config.success_close_delay_ms),
                fatal: RefCell::new(None),
            }),
        }
    }

    fn install_event_pump(&self, events: mpsc::Receiver<UiEvent>) {
        let runtime = self.clone();
        glib::timeout_add_local(EVENT_POLL_INTERVAL, move || loop {
            match events.try_recv() {
                Ok(event) => {
                    if runtime.handle(event) == glib::ControlFlow::Break {
                        return glib::ControlFlow::Break;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => return glib::ControlFlow::Continue,
                Err(mpsc::TryRecvError::Disconnected) => {
                    tracing::warn!("all trigger sources disconnected");
                    return glib::ControlFlow::Break;
                }
            }
        });
    }

    fn handle(&self, event: UiEvent) -> glib::ControlFlow {
        match event {
            UiEvent::Trigger(source) => {
                self.trigger(source);
                glib::ControlFlow::Continue
            }
            UiEvent::ExitRequested => {
                tracing::info!("exit requested from tray");
                self.exit();
                glib::ControlFlow::Break
            }
            UiEvent::TrayUnavailable(message) => {
                tracing::error!(%message, "tray icon lost; shutting down");
                self.inner.fatal.replace(Some(message));
                self.exit();
                glib::ControlFlow::Break
            }
        }
    }

    fn trigger(&self, source: TriggerSource) {
        let outcome = self.inner.coordinator.borrow_mut().on_trigger(source);
        match outcome {
            TriggerOutcome::Opened { session } => self.open_window(session),
            TriggerOutcome::Ignored { state } => {
                tracing::debug!(?source, ?state, "trigger dropped");
            }
            TriggerOutcome::CaptureFailed => {}
        }
    }

    fn open_window(&self, session: SessionId) {
        let window = {
            let coordinator = self.inner.coordinator.borrow();
            let Some(form) = coordinator.form() else {
                return;
            };
            TicketWindow::build(
                &self.inner.application,
                form,
                self.inner.style,
                self.window_actions(session),
            )
        };
        window.present();
        if let Some(stale) = self.inner.window.replace(Some(window)) {
            tracing::warn!(session = %stale.session(), "replacing a window left from an earlier session");
            stale.close();
        }
    }

    fn window_actions(&self, session: SessionId) -> TicketWindowActions {
        let runtime = self.clone();
        let on_edit = Rc::new(move |edit: FormEdit| runtime.edit(session, edit));
        let runtime = self.clone();
        let on_submit = Rc::new(move || runtime.submit(session));
        let runtime = self.clone();
        let on_cancel = Rc::new(move || runtime.close(session, CloseReason::Cancelled));
        TicketWindowActions {
            on_edit,
            on_submit,
            on_cancel,
        }
    }

    fn edit(&self, session: SessionId, edit: FormEdit) {
        let edited = self.inner.coordinator.borrow_mut().edit(edit);
        if let Err(err) = edited {
            tracing::debug!(%session, %err, "edit ignored");
        }
        self.sync_window();
    }

    fn submit(&self, session: SessionId) {
        let submitted = self.inner.coordinator.borrow_mut().submit();
        match submitted {
            Ok(job) => {
                let attempt = job.attempt();
                let runtime = self.clone();
                spawn_worker_action(
                    SUBMISSION_WORKER,
                    move || job.run(),
                    move |report: Option<SubmissionReport>| {
                        let report = report.unwrap_or_else(|| SubmissionReport {
                            session,
                            attempt,
                            result: Err(SubmissionError::network(
                                "submission stopped unexpectedly",
                            )),
                        });
                        runtime.finish_submission(report);
                    },
                );
            }
            Err(CoordinatorError::Form(FormError::Validation(err))) => {
                tracing::debug!(%session, %err, "ticket not submitted");
            }
            Err(err) => {
                tracing::debug!(%session, %err, "submit ignored");
            }
        }
        self.sync_window();
    }

    fn finish_submission(&self, report: SubmissionReport) {
        let session = report.session;
        let outcome = self.inner.coordinator.borrow_mut().complete_submission(report);
        match outcome {
            FormOutcome::Discarded => return,
            FormOutcome::Sent(ticket_id) => {
                notification::ticket_submitted(&ticket_id);
                let runtime = self.clone();
                glib::timeout_add_local_once(self.inner.success_close_delay, move || {
                    runtime.close(session, CloseReason::AutoClosed);
                });
            }
            FormOutcome::Failed(_) => {}
        }
        self.sync_window();
    }

    fn close(&self, session: SessionId, reason: CloseReason) {
        self.inner
            .coordinator
            .borrow_mut()
            .close_session(session, reason);

        let window = {
            let mut slot = self.inner.window.borrow_mut();
            if slot.as_ref().map(TicketWindow::session) == Some(session) {
                slot.take()
            } else {
                None
            }
        };
        if let Some(window) = window {
            window.close();
        }
    }

    fn sync_window(&self) {
        let coordinator = self.inner.coordinator.borrow();
        let window = self.inner.window.borrow();
        if let (Some(form), Some(window)) = (coordinator.form(), window.as_ref()) {
            if form.id() == window.session() {
                window.sync(form);
            }
        }
    }

    fn shutdown(&self) {
        self.inner.coordinator.borrow_mut().shutdown();
        let window = self.inner.window.borrow_mut().take();
        if let Some(window) = window {
            window.close();
        }
    }

    fn exit(&self) {
        self.shutdown();
        self.inner.application.quit();
    }

    fn take_fatal(&self) -> Option<String> {
        self.inner.fatal.borrow_mut().take()
    }
}

pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn start(&mut self) -> AppResult<()> {
        let (events_tx, events_rx) = mpsc::channel::<UiEvent>();

        let hotkey = HotkeyListener::register(&self.config.hotkey, events_tx.clone())
            .map_err(|source| AppError::startup("global hotkey", source))?;
        let tray = match TrayHandle::spawn(&self.config.hotkey, events_tx) {
            Ok(tray) => tray,
            Err(source) => {
                hotkey.release();
                return Err(AppError::startup("tray icon", source));
            }
        };

        let client: Arc<dyn SubmissionClient> =
            Arc::new(HttpSubmissionClient::from_config(&self.config));
        let coordinator = Coordinator::new(
            SystemScreenGrabber,
            SystemHostProbe::default(),
            client,
            self.config.thumbnail_max_edge,
        );

        tracing::info!("starting gtk runtime");
        let application = Application::new(
            Some(APPLICATION_ID),
            gtk4::gio::ApplicationFlags::NON_UNIQUE,
        );
        let runtime = AgentRuntime::new(application.clone(), coordinator, &self.config);

        let events_rx = RefCell::new(Some(events_rx));
        let hold_guard = Rc::new(RefCell::new(None::<gtk4::gio::ApplicationHoldGuard>));
        let activate_once = Rc::new(Cell::new(false));
        {
            let runtime = runtime.clone();
            let hold_guard = hold_guard.clone();
            let hotkey_label = self.config.hotkey.clone();
            application.connect_activate(move |app| {
                if activate_once.replace(true) {
                    tracing::debug!("ignoring duplicate gtk activate signal");
                    return;
                }
                // The agent has no window between tickets.
                let guard =
                    <gtk4::Application as gtk4::gio::prelude::ApplicationExtManual>::hold(app);
                hold_guard.borrow_mut().replace(guard);

                install_runtime_css(LAYOUT_TOKENS, &default_color_tokens());
                if let Some(events) = events_rx.borrow_mut().take() {
                    runtime.install_event_pump(events);
                }
                notification::agent_started(&hotkey_label);
                tracing::info!(hotkey = %hotkey_label, "helpdesk agent ready");
            });
        }

        // Pass only argv[0] to GTK so unknown flags do not fail GTK parsing.
        let gtk_args = gtk_launch_args(std::env::args());
        application.run_with_args(&gtk_args);

        runtime.shutdown();
        hold_guard.borrow_mut().take();
        tray.shutdown();
        hotkey.release();

        if let Some(message) = runtime.take_fatal() {
            return Err(AppError::startup(
                "tray icon",
                anyhow::anyhow!("tray service stopped: {message}"),
            ));
        }
        Ok(())
    }
}

fn gtk_launch_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter().take(1).collect()
}
