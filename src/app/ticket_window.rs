use std::cell::Cell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{
    gdk, glib, Align, Application, ApplicationWindow, Box as GtkBox, Button, DropDown, Entry,
    Frame, Label, Orientation, Picture, ScrolledWindow, TextView, WrapMode,
};

use crate::capture::CaptureArtifact;
use crate::form::{FormEdit, FormPhase, FormSession};
use crate::state::SessionId;
use crate::ticket::{Priority, ValidationError};
use crate::ui::StyleTokens;

const WINDOW_TITLE: &str = "IT Helpdesk - New Ticket";
const STATUS_CLASSES: [&str; 3] = ["info", "error", "success"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
    Success,
}

impl StatusKind {
    fn css_class(self) -> &'static str {
        match self {
            StatusKind::Info => "info",
            StatusKind::Error => "error",
            StatusKind::Success => "success",
        }
    }
}

fn status_line(
    phase: &FormPhase,
    inline_error: Option<&ValidationError>,
) -> Option<(StatusKind, String)> {
    if let Some(err) = inline_error {
        return Some((StatusKind::Error, err.to_string()));
    }
    match phase {
        FormPhase::Editing => None,
        FormPhase::Sending { .. } => Some((StatusKind::Info, "Submitting ticket...".to_string())),
        FormPhase::Sent { ticket_id } => Some((
            StatusKind::Success,
            format!("Ticket {ticket_id} submitted. This window will close shortly."),
        )),
        FormPhase::Failed { message } => Some((StatusKind::Error, message.clone())),
    }
}

fn selected_priority_index(label: &str) -> u32 {
    label
        .parse::<Priority>()
        .unwrap_or_default()
        .index()
}

pub(super) struct TicketWindowActions {
    pub(super) on_edit: Rc<dyn Fn(FormEdit)>,
    pub(super) on_submit: Rc<dyn Fn()>,
    pub(super) on_cancel: Rc<dyn Fn()>,
}

/// The modal ticket form. Holds widgets only; all ticket state lives in the coordinator.
pub(super) struct TicketWindow {
    session: SessionId,
    window: ApplicationWindow,
    subject: Entry,
    description: TextView,
    priority: DropDown,
    status: Label,
    submit: Button,
    cancel: Button,
    close_guard: Rc<Cell<bool>>,
}

impl TicketWindow {
    pub(super) fn build(
        app: &Application,
        form: &FormSession,
        style: StyleTokens,
        actions: TicketWindowActions,
    ) -> Self {
        let window = ApplicationWindow::new(app);
        window.add_css_class("helpdesk-ticket");
        window.set_title(Some(WINDOW_TITLE));
        window.set_default_size(style.window_default_width, style.window_default_height);
        window.set_modal(true);

        let root = GtkBox::new(Orientation::Vertical, style.spacing_12);
        root.set_margin_top(style.spacing_16);
        root.set_margin_bottom(style.spacing_16);
        root.set_margin_start(style.spacing_16);
        root.set_margin_end(style.spacing_16);

        root.append(&thumbnail_frame(form.capture(), style));
        root.append(&host_panel(form, style));

        let fields = form.fields();
        let subject = Entry::new();
        subject.set_text(&fields.subject);
        root.append(&field_label("Subject"));
        root.append(&subject);

        let description = TextView::new();
        description.set_wrap_mode(WrapMode::WordChar);
        description.add_css_class("ticket-description");
        description.buffer().set_text(&fields.description);
        let description_scroll = ScrolledWindow::new();
        description_scroll.set_min_content_height(style.description_min_height);
        description_scroll.set_vexpand(true);
        description_scroll.set_child(Some(&description));
        root.append(&field_label("Describe the problem"));
        root.append(&description_scroll);

        let priority_labels: Vec<&str> = Priority::ALL.iter().map(|p| p.label()).collect();
        let priority = DropDown::from_strings(&priority_labels);
        priority.set_selected(selected_priority_index(&fields.priority));
        priority.set_halign(Align::Start);
        root.append(&field_label("Priority"));
        root.append(&priority);

        let status = Label::new(None);
        status.add_css_class("ticket-status");
        status.set_xalign(0.0);
        status.set_wrap(true);
        status.set_visible(false);
        root.append(&status);

        let buttons = GtkBox::new(Orientation::Horizontal, style.spacing_8);
        buttons.set_halign(Align::End);
        let cancel = Button::with_label("Cancel");
        let submit = Button::with_label("Submit");
        submit.add_css_class("ticket-submit");
        buttons.append(&cancel);
        buttons.append(&submit);
        root.append(&buttons);

        window.set_child(Some(&root));

        let ticket_window = Self {
            session: form.id(),
            window,
            subject,
            description,
            priority,
            status,
            submit,
            cancel,
            close_guard: Rc::new(Cell::new(false)),
        };
        ticket_window.connect_actions(actions);
        ticket_window.sync(form);
        ticket_window
    }

    fn connect_actions(&self, actions: TicketWindowActions) {
        let on_edit = actions.on_edit.clone();
        self.subject.connect_changed(move |entry| {
            on_edit(FormEdit::Subject(entry.text().to_string()));
        });

        let on_edit = actions.on_edit.clone();
        self.description.buffer().connect_changed(move |buffer| {
            let (start, end) = buffer.bounds();
            on_edit(FormEdit::Description(
                buffer.text(&start, &end, false).to_string(),
            ));
        });

        let on_edit = actions.on_edit;
        self.priority.connect_selected_notify(move |dropdown| {
            if let Some(priority) = Priority::from_index(dropdown.selected()) {
                on_edit(FormEdit::Priority(priority.label().to_string()));
            }
        });

        let on_submit = actions.on_submit;
        self.submit.connect_clicked(move |_| on_submit());

        let on_cancel = actions.on_cancel.clone();
        self.cancel.connect_clicked(move |_| on_cancel());

        // User-initiated closes are routed through cancel; guarded closes pass straight through.
        let on_cancel = actions.on_cancel;
        let close_guard = self.close_guard.clone();
        self.window.connect_close_request(move |_| {
            if close_guard.get() {
                return glib::Propagation::Proceed;
            }
            let on_cancel = on_cancel.clone();
            glib::idle_add_local_once(move || on_cancel());
            glib::Propagation::Stop
        });
    }

    pub(super) fn session(&self) -> SessionId {
        self.session
    }

    pub(super) fn present(&self) {
        self.window.present();
        self.description.grab_focus();
    }

    /// Re-renders status and control availability from the form model.
    pub(super) fn sync(&self, form: &FormSession) {
        for class in STATUS_CLASSES {
            self.status.remove_css_class(class);
        }
        match status_line(form.phase(), form.inline_error()) {
            Some((kind, text)) => {
                self.status.add_css_class(kind.css_class());
                self.status.set_text(&text);
                self.status.set_visible(true);
            }
            None => self.status.set_visible(false),
        }

        let sent = matches!(form.phase(), FormPhase::Sent { .. });
        self.submit.set_sensitive(form.can_submit());
        self.subject.set_sensitive(!sent);
        self.description.set_sensitive(!sent);
        self.priority.set_sensitive(!sent);
        self.cancel.set_label(if sent { "Close" } else { "Cancel" });

        match form.inline_error() {
            Some(ValidationError::EmptySubject) => {
                self.subject.grab_focus();
            }
            Some(ValidationError::EmptyDescription) => {
                self.description.grab_focus();
            }
            Some(ValidationError::InvalidPriority { .. }) => {
                self.priority.grab_focus();
            }
            None => {}
        }
    }

    pub(super) fn close(self) {
        self.close_guard.set(true);
        self.window.close();
    }
}

fn field_label(text: &str) -> Label {
    let label = Label::new(Some(text));
    label.add_css_class("ticket-field-label");
    label.set_xalign(0.0);
    label
}

fn thumbnail_frame(capture: &CaptureArtifact, style: StyleTokens) -> Frame {
    let thumbnail = &capture.thumbnail;
    let texture = gdk::MemoryTexture::new(
        thumbnail.width() as i32,
        thumbnail.height() as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &glib::Bytes::from_owned(thumbnail.as_raw().clone()),
        thumbnail.width() as usize * 4,
    );
    let picture = Picture::for_paintable(&texture);
    picture.set_can_shrink(true);
    picture.set_size_request(-1, style.thumbnail_min_height);

    let frame = Frame::new(None);
    frame.add_css_class("ticket-thumbnail");
    frame.set_child(Some(&picture));
    frame
}

fn host_panel(form: &FormSession, style: StyleTokens) -> GtkBox {
    let panel = GtkBox::new(Orientation::Vertical, style.spacing_4);
    panel.add_css_class("ticket-host");
    for line in form.host().summary_lines() {
        let label = Label::new(Some(line.as_str()));
        label.set_xalign(0.0);
        label.set_wrap(true);
        label.set_selectable(true);
        panel.append(&label);
    }
    panel
}
