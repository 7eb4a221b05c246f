use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} has already been started")]
    AlreadyStarted(String),

    #[error("{0} has already been stopped and cannot be restarted")]
    AlreadyStopped(String),

    #[error("{0} is not running")]
    NotRunning(String),

    #[error("{name} start hook failed: {source}")]
    StartHook {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{name} stop hook failed: {source}")]
    StopHook {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
