use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed document: no `return [` header found")]
    MalformedHeader,

    #[error("Unknown serialization strategy: {0}")]
    UnknownStrategy(String),

    #[error("Parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Model(#[from] routekit::v1::Error),

    #[error("Formatter error: {0}")]
    Format(String),
}
