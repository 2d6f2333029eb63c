#[cfg(not(target_os = "linux"))]
mod native;
#[cfg(target_os = "linux")]
mod sni;

#[cfg(not(target_os = "linux"))]
pub(super) use native::TrayHandle;
#[cfg(target_os = "linux")]
pub(super) use sni::TrayHandle;

pub(super) const ICON_SIZE: u32 = 64;
const ICON_INSET: u32 = 14;
const ICON_FILL: [u8; 4] = [0x1e, 0x63, 0xc8, 0xff];
const ICON_MARK: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

pub(super) const TRAY_TITLE: &str = "IT Helpdesk";
pub(super) const NEW_TICKET_LABEL: &str = "New Ticket";
pub(super) const EXIT_LABEL: &str = "Exit";

pub(super) fn tooltip_text(hotkey: &str) -> String {
    format!("{TRAY_TITLE} - press {hotkey}")
}

/// Solid blue square with a white inset, as RGBA8 rows.
pub(super) fn make_icon_rgba() -> Vec<u8> {
    let inner = ICON_INSET..ICON_SIZE - ICON_INSET;
    let mut rgba = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let pixel = if inner.contains(&x) && inner.contains(&y) {
                ICON_MARK
            } else {
                ICON_FILL
            };
            rgba.extend_from_slice(&pixel);
        }
    }
    rgba
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(super) fn rgba_to_argb(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|pixel| [pixel[3], pixel[0], pixel[1], pixel[2]])
        .collect()
}
