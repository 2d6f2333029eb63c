use std::sync::mpsc;

use anyhow::{Context, Result};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use super::UiEvent;
use crate::coordinator::TriggerSource;

pub(super) fn parse_hotkey(binding: &str) -> Result<HotKey> {
    binding
        .trim()
        .parse::<HotKey>()
        .with_context(|| format!("invalid hotkey '{binding}'"))
}

/// Only key-down fires; auto-repeat and release are dropped here.
fn is_trigger(event_id: u32, state: HotKeyState, registered_id: u32) -> bool {
    event_id == registered_id && state == HotKeyState::Pressed
}

/// System-wide hotkey that forwards presses into the UI event queue.
pub(super) struct HotkeyListener {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
}

impl HotkeyListener {
    pub(super) fn register(binding: &str, events: mpsc::Sender<UiEvent>) -> Result<Self> {
        let hotkey = parse_hotkey(binding)?;
        let manager = GlobalHotKeyManager::new().context("create global hotkey manager")?;
        manager
            .register(hotkey)
            .with_context(|| format!("register global hotkey {binding}"))?;

        let registered_id = hotkey.id();
        GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
            if is_trigger(event.id, event.state, registered_id) {
                let _ = events.send(UiEvent::Trigger(TriggerSource::Hotkey));
            }
        }));

        tracing::info!(hotkey = binding, "global hotkey registered");
        Ok(Self { manager, hotkey })
    }

    pub(super) fn release(self) {
        GlobalHotKeyEvent::set_event_handler(None::<fn(GlobalHotKeyEvent)>);
        if let Err(err) = self.manager.unregister(self.hotkey) {
            tracing::warn!(%err, "failed to unregister global hotkey");
        }
    }
}
