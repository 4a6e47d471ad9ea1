use snap_net::{PeerId, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("buddy {0:?} failed: {1}")]
    BuddyFailed(PeerId, String),
}
