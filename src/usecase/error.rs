use thiserror::Error;

use crate::domain::error::{ClientParameterError, ConfigurationError};
use crate::usecase::ports::source::SourceError;

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    ClientParameter(#[from] ClientParameterError),
    #[error("data source error: {0}")]
    DataSource(#[from] SourceError),
    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}
