use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Places API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Geocoding error: {0}")]
    Geocode(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] datapull_core::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
