use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaitError {
    #[error("Invalid history for ride '{ride_id}': {reason}")]
    InvalidHistory { ride_id: String, reason: String },

    #[error("Park '{0}' appears more than once")]
    DuplicatePark(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
