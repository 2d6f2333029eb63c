use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to start {component}: {source}")]
    Startup {
        component: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl AppError {
    pub fn startup(component: &'static str, source: anyhow::Error) -> Self {
        AppError::Startup {
            component,
            source: source.into(),
        }
    }
}
