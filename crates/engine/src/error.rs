use events::EventsError;
use reducer::StateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("State transition error: {0}")]
    State(#[from] StateError),

    #[error("Failed to decode event on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: EventsError,
    },

    #[error("I/O error while reading events: {0}")]
    Io(#[from] std::io::Error),

    #[error("The session's event channel was closed before the feed finished.")]
    ChannelClosed,
}
