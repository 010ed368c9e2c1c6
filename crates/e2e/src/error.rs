//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] powerseq_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Entry form serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
