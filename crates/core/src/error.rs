use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The query engine could not be reached or answered with garbage.
    #[error("Query transport error: {0}")]
    Transport(String),

    /// The query engine answered but reported GraphQL errors.
    #[error("GraphQL query failed: {0}")]
    Query(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Missing fragment file for component '{component}': {}", path.display())]
    MissingDescriptor { component: String, path: PathBuf },

    #[error("No renderer found for template '{template}': {}", path.display())]
    MissingTemplate { template: String, path: PathBuf },

    #[error("Skeleton error in {}: {message}", path.display())]
    Skeleton { path: PathBuf, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn skeleton(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Skeleton {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
