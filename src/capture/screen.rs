use xcap::Monitor;

use super::{CaptureError, RawFrame, ScreenGrabber};

/// Grabs the primary display through the OS capture API.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemScreenGrabber;

impl ScreenGrabber for SystemScreenGrabber {
    fn grab_screen(&self) -> Result<RawFrame, CaptureError> {
        let monitors = Monitor::all().map_err(|err| classify_backend_error(err.to_string()))?;
        let monitor = pick_monitor(monitors).ok_or(CaptureError::DisplayUnavailable)?;
        tracing::debug!(monitor = monitor.name(), "capturing monitor");

        let image = monitor
            .capture_image()
            .map_err(|err| classify_backend_error(err.to_string()))?;
        let (width, height) = (image.width(), image.height());
        Ok(RawFrame {
            width,
            height,
            rgba: image.into_raw(),
        })
    }
}

fn pick_monitor(monitors: Vec<Monitor>) -> Option<Monitor> {
    let mut fallback = None;
    for monitor in monitors {
        if monitor.is_primary() {
            return Some(monitor);
        }
        if fallback.is_none() {
            fallback = Some(monitor);
        }
    }
    fallback
}

fn classify_backend_error(message: String) -> CaptureError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") {
        CaptureError::PermissionDenied { message }
    } else {
        CaptureError::Backend { message }
    }
}
