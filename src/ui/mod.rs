pub mod style;

pub use style::{default_color_tokens, ColorTokens, StyleTokens, LAYOUT_TOKENS};
