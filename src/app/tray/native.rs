use std::sync::mpsc;

use anyhow::{Context, Result};
use tray_icon::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use super::{make_icon_rgba, tooltip_text, EXIT_LABEL, ICON_SIZE, NEW_TICKET_LABEL};
use crate::app::UiEvent;
use crate::coordinator::TriggerSource;

/// Native notification-area icon; menu clicks arrive through the global menu handler.
pub(crate) struct TrayHandle {
    _tray: TrayIcon,
}

impl TrayHandle {
    pub(crate) fn spawn(hotkey: &str, events: mpsc::Sender<UiEvent>) -> Result<Self> {
        let menu = Menu::new();
        let new_ticket = MenuItem::new(NEW_TICKET_LABEL, true, None);
        let exit = MenuItem::new(EXIT_LABEL, true, None);
        menu.append(&new_ticket).context("menu append new ticket")?;
        menu.append(&PredefinedMenuItem::separator())
            .context("menu append separator")?;
        menu.append(&exit).context("menu append exit")?;

        let new_ticket_id = new_ticket.id().clone();
        let exit_id = exit.id().clone();
        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            let ui_event = if event.id == new_ticket_id {
                UiEvent::Trigger(TriggerSource::TrayMenu)
            } else if event.id == exit_id {
                UiEvent::ExitRequested
            } else {
                return;
            };
            let _ = events.send(ui_event);
        }));

        let icon =
            Icon::from_rgba(make_icon_rgba(), ICON_SIZE, ICON_SIZE).context("build tray icon image")?;
        let tray = TrayIconBuilder::new()
            .with_icon(icon)
            .with_tooltip(tooltip_text(hotkey))
            .with_menu(Box::new(menu))
            .build()
            .context("build tray icon")?;

        tracing::info!("tray icon registered");
        Ok(Self { _tray: tray })
    }

    pub(crate) fn shutdown(self) {
        MenuEvent::set_event_handler(None::<fn(MenuEvent)>);
    }
}
