use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid lead: {0}")]
    InvalidLead(String),

    #[error("Invalid fields requested: {invalid}. Valid fields are: {valid}")]
    InvalidFields { invalid: String, valid: String },

    #[error("Requested fields require the browser scraper, which is not available: {0}")]
    ScraperRequired(String),

    #[error("Insufficient tokens. Maximum required: {required}, Available: {available}")]
    InsufficientTokens { required: i64, available: i64 },

    #[error("Invalid job state: {0}")]
    InvalidJobState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
