use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Job timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error(transparent)]
    Core(#[from] datapull_core::Error),

    #[error(transparent)]
    Places(#[from] datapull_places::Error),

    #[error(transparent)]
    Store(#[from] datapull_store::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
