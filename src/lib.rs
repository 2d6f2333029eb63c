pub mod app;
pub mod capture;
mod config;
pub mod coordinator;
pub mod error;
pub mod form;
pub mod host;
pub mod logging;
pub mod notification;
pub mod state;
pub mod submission;
pub mod ticket;
pub mod ui;
pub use error::{AppError, AppResult};

/// Entrypoint used by the binary: loads settings and runs the agent until exit.
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting helpdesk agent");

    let config = config::load_app_config();
    tracing::info!(?config, "configuration loaded");

    let mut app = app::App::new(config);
    app.start()?;

    tracing::info!("helpdesk agent stopped");
    Ok(())
}
