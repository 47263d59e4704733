pub mod affiliate;
mod app_config;
mod config;
pub mod models;
pub mod sources;

use thiserror::Error;

pub use affiliate::AffiliateLinkBuilder;
pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use models::{Candidate, ContentStyle, Region};
pub use sources::{load_sources, DealSource, SourcesFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("{0}")]
    Validation(String),
}
