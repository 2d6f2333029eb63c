/// Compile-time layout tokens for the ticket window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTokens {
    pub spacing_4: i32,
    pub spacing_8: i32,
    pub spacing_12: i32,
    pub spacing_16: i32,
    pub panel_radius: u16,
    pub control_radius: u16,
    pub border_width: u16,
    pub window_default_width: i32,
    pub window_default_height: i32,
    pub description_min_height: i32,
    pub thumbnail_min_height: i32,
}

pub const LAYOUT_TOKENS: StyleTokens = StyleTokens {
    spacing_4: 4,
    spacing_8: 8,
    spacing_12: 12,
    spacing_16: 16,
    panel_radius: 12,
    control_radius: 8,
    border_width: 1,
    window_default_width: 520,
    window_default_height: 640,
    description_min_height: 140,
    thumbnail_min_height: 180,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTokens {
    pub panel_background: String,
    pub border_color: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub accent_color: String,
    pub accent_text_color: String,
    pub error_color: String,
    pub success_color: String,
}

pub fn default_color_tokens() -> ColorTokens {
    ColorTokens {
        panel_background: "rgba(0, 0, 0, 0.04)".to_string(),
        border_color: "rgba(0, 0, 0, 0.14)".to_string(),
        text_color: "inherit".to_string(),
        muted_text_color: "alpha(currentColor, 0.64)".to_string(),
        accent_color: "#1e63c8".to_string(),
        accent_text_color: "#ffffff".to_string(),
        error_color: "#c62828".to_string(),
        success_color: "#2e7d32".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_tokens_keep_window_larger_than_its_fixed_sections() {
        let tokens = LAYOUT_TOKENS;
        assert!(
            tokens.window_default_height
                > tokens.description_min_height + tokens.thumbnail_min_height
        );
        assert!(tokens.window_default_width >= 480);
    }

    #[test]
    fn default_color_tokens_distinguish_error_and_success() {
        let colors = default_color_tokens();
        assert_ne!(colors.error_color, colors.success_color);
        assert_ne!(colors.accent_color, colors.accent_text_color);
    }
}
