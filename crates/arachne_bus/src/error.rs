//! Bus transport errors.

use arachne_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("bus is closed")]
    Closed,
}
