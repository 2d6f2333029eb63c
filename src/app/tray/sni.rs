use std::sync::mpsc;

use anyhow::{Context, Result};
use ksni::menu::StandardItem;
use ksni::{MenuItem, Tray, TrayService};

use super::{
    make_icon_rgba, rgba_to_argb, tooltip_text, EXIT_LABEL, ICON_SIZE, NEW_TICKET_LABEL,
    TRAY_TITLE,
};
use crate::app::UiEvent;
use crate::coordinator::TriggerSource;

const TRAY_ID: &str = "helpdesk-agent";

struct AgentTray {
    tooltip: String,
    events: mpsc::Sender<UiEvent>,
}

impl AgentTray {
    fn send(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("tray event dropped; ui loop is gone");
        }
    }
}

impl Tray for AgentTray {
    fn id(&self) -> String {
        TRAY_ID.to_string()
    }

    fn title(&self) -> String {
        TRAY_TITLE.to_string()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        vec![ksni::Icon {
            width: ICON_SIZE as i32,
            height: ICON_SIZE as i32,
            data: rgba_to_argb(&make_icon_rgba()),
        }]
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: self.tooltip.clone(),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        vec![
            StandardItem {
                label: NEW_TICKET_LABEL.to_string(),
                activate: Box::new(|tray: &mut Self| {
                    tray.send(UiEvent::Trigger(TriggerSource::TrayMenu))
                }),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: EXIT_LABEL.to_string(),
                activate: Box::new(|tray: &mut Self| tray.send(UiEvent::ExitRequested)),
                ..Default::default()
            }
            .into(),
        ]
    }
}

/// StatusNotifierItem tray served over D-Bus from its own thread.
pub(crate) struct TrayHandle {
    handle: ksni::Handle<AgentTray>,
}

impl TrayHandle {
    pub(crate) fn spawn(hotkey: &str, events: mpsc::Sender<UiEvent>) -> Result<Self> {
        let service = TrayService::new(AgentTray {
            tooltip: tooltip_text(hotkey),
            events: events.clone(),
        });
        let handle = service.handle();

        std::thread::Builder::new()
            .name("tray-service".into())
            .spawn(move || {
                if let Err(err) = service.run() {
                    tracing::error!(%err, "tray service stopped");
                    let _ = events.send(UiEvent::TrayUnavailable(err.to_string()));
                }
            })
            .context("spawn tray service thread")?;

        tracing::info!("tray icon registered");
        Ok(Self { handle })
    }

    pub(crate) fn shutdown(self) {
        self.handle.shutdown();
    }
}
