use crate::ui::{ColorTokens, StyleTokens};
use gtk4::CssProvider;

pub(super) fn install_runtime_css(tokens: StyleTokens, colors: &ColorTokens) {
    let css = runtime_css(tokens, colors);

    let provider = CssProvider::new();
    provider.load_from_data(&css);
    if let Some(display) = gtk4::gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    } else {
        tracing::warn!("no default display; ticket window styling skipped");
    }
}

fn runtime_css(tokens: StyleTokens, colors: &ColorTokens) -> String {
    format!(
        "
window.helpdesk-ticket {{
  color: {text_color};
}}
.ticket-thumbnail {{
  border-radius: {panel_radius}px;
  border: {border_width}px solid {border_color};
  background: {panel_background};
  padding: {spacing_4}px;
}}
.ticket-host {{
  border-radius: {control_radius}px;
  background: {panel_background};
  padding: {spacing_8}px {spacing_12}px;
}}
.ticket-host label {{
  color: {muted_text_color};
  font-size: 12px;
}}
.ticket-field-label {{
  font-weight: 600;
}}
.ticket-description {{
  border-radius: {control_radius}px;
  border: {border_width}px solid {border_color};
  padding: {spacing_4}px;
}}
button.ticket-submit {{
  background: {accent_color};
  color: {accent_text_color};
  border-color: transparent;
  font-weight: 600;
}}
button.ticket-submit:disabled {{
  opacity: 0.5;
}}
/* ── Status line ── */
.ticket-status.error {{
  color: {error_color};
}}
.ticket-status.success {{
  color: {success_color};
  font-weight: 600;
}}
.ticket-status.info {{
  color: {muted_text_color};
}}
",
        panel_radius = tokens.panel_radius,
        control_radius = tokens.control_radius,
        border_width = tokens.border_width,
        spacing_4 = tokens.spacing_4,
        spacing_8 = tokens.spacing_8,
        spacing_12 = tokens.spacing_12,
        border_color = colors.border_color,
        panel_background = colors.panel_background,
        text_color = colors.text_color,
        muted_text_color = colors.muted_text_color,
        accent_color = colors.accent_color,
        accent_text_color = colors.accent_text_color,
        error_color = colors.error_color,
        success_color = colors.success_color,
    )
}
