use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
