//! Exposes the deimos error type

use thiserror::Error;

use crate::rhi::QueueType;

/// Error type that deimos can return.
#[derive(Error, Debug)]
pub enum Error {
    /// No queue of the requested type is exposed by the device. Submission needs at least
    /// one graphics queue.
    #[error("No {0:?} queue available for submission.")]
    NoCapableQueue(QueueType),
    /// Uncategorized error.
    #[error("Uncategorized error: `{0}`")]
    Uncategorized(&'static str),
}
