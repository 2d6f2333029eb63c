use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::capture::DEFAULT_THUMBNAIL_MAX_EDGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "helpdesk-agent";
const APP_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_HOTKEY: &str = "F8";
pub const DEFAULT_SUCCESS_CLOSE_DELAY_MS: u64 = 2_000;

/// Agent settings from `config.json`, with `HELPDESK_*` environment overrides on top.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub auth_code: Option<String>,
    pub contact_email: Option<String>,
    pub hotkey: String,
    pub success_close_delay_ms: u64,
    pub thumbnail_max_edge: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            auth_code: None,
            contact_email: None,
            hotkey: DEFAULT_HOTKEY.to_string(),
            success_close_delay_ms: DEFAULT_SUCCESS_CLOSE_DELAY_MS,
            thumbnail_max_edge: DEFAULT_THUMBNAIL_MAX_EDGE,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_code", &self.auth_code.as_ref().map(|_| "<redacted>"))
            .field("contact_email", &self.contact_email)
            .field("hotkey", &self.hotkey)
            .field("success_close_delay_ms", &self.success_close_delay_ms)
            .field("thumbnail_max_edge", &self.thumbnail_max_edge)
            .finish()
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home, app_data) = config_env_dirs();
    let mut config = load_app_config_with(
        xdg_config_home.as_deref(),
        home.as_deref(),
        app_data.as_deref(),
    );
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

fn load_app_config_with(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
    app_data: Option<&Path>,
) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home, app_data) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        tracing::debug!(?path, "no config.json; using defaults");
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(endpoint) = value("HELPDESK_ENDPOINT") {
        config.endpoint = Some(endpoint);
    }
    if let Some(api_key) = value("HELPDESK_API_KEY") {
        config.api_key = Some(api_key);
    }
    if let Some(auth_code) = value("HELPDESK_AUTH_CODE") {
        config.auth_code = Some(auth_code);
    }
    if let Some(email) = value("HELPDESK_CONTACT_EMAIL") {
        config.contact_email = Some(email);
    }
    if let Some(hotkey) = value("HELPDESK_HOTKEY") {
        config.hotkey = hotkey;
    }
}

fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
        std::env::var_os("APPDATA").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
    app_data: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home, app_data)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

/// `$XDG_CONFIG_HOME`, then `$HOME/.config`, then `%APPDATA%`.
fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
    app_data: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let usable = |path: &&Path| !path.as_os_str().is_empty();
    if let Some(xdg) = xdg_config_home.filter(usable) {
        return Ok(xdg.to_path_buf());
    }
    if let Some(home) = home.filter(usable) {
        return Ok(home.join(".config"));
    }
    app_data
        .filter(usable)
        .map(Path::to_path_buf)
        .ok_or(ConfigPathError::MissingHomeDirectory)
}
