use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventsError {
    #[error("Failed to decode trading event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to serialize trading event: {0}")]
    Serialization(String),
}
