use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Duplicate entity id: {0}")]
    DuplicateId(String),

    #[error("Entity not found: {0}")]
    UnknownEntity(String),

    #[error("Invalid omission rule `{rule}`: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
