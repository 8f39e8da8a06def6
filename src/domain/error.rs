use crate::domain::models::RadioState;
use crate::domain::protocol::DecodeError;
use thiserror::Error;

/// Failures along the sensor link. None of them is retried or surfaced to the
/// user; they only end up in the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Bluetooth is not available (radio state: {0:?})")]
    RadioUnavailable(RadioState),
    #[error("device discovery failed: {0}")]
    Discovery(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("error discovering services: {0}")]
    ServiceDiscovery(String),
    #[error("error discovering characteristics: {0}")]
    ChannelDiscovery(String),
    #[error("error updating value for characteristic: {0}")]
    Notification(String),
    #[error("could not decode sensor payload: {0}")]
    Decode(#[from] DecodeError),
}
