use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("An error occurred deserializing rule definition: {0}.")]
    Deserializing(#[from] serde_json::Error),

    #[error("Invalid rule configuration: {0}.")]
    Configuration(String),

    #[error("Bad request: {0}.")]
    BadRequest(String),
}
