//! Error types for lock acquisition
//!
//! Two layers of errors exist here:
//!
//! - [`AcquireError`] is what an acquire collaborator reports. Its
//!   [`AcquireError::AlreadyLocked`] variant is the retry signal.
//! - [`Error`] is what [`Locker::acquire`](crate::Locker::acquire) surfaces to
//!   its caller once the retry loop has finished.

use thiserror::Error;

/// Boxed error produced by acquire/release collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for lock acquisition.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a single failed call to an acquire collaborator.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The resource is currently held by someone else.
    ///
    /// This is the only condition the locker retries.
    #[error("resource already locked")]
    AlreadyLocked,

    /// Any other failure. Never retried.
    #[error(transparent)]
    Failed(BoxError),
}

impl AcquireError {
    /// Wrap an arbitrary error as a non-retryable failure.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        AcquireError::Failed(err.into())
    }

    /// Returns `true` for the retryable already-locked condition.
    pub fn is_already_locked(&self) -> bool {
        matches!(self, AcquireError::AlreadyLocked)
    }
}

/// Terminal error returned by [`Locker::acquire`](crate::Locker::acquire).
#[derive(Debug, Error)]
pub enum Error {
    /// The acquire collaborator failed with something other than
    /// [`AcquireError::AlreadyLocked`].
    #[error("cannot acquire lock for key {key}: {source}")]
    AcquireFailed {
        /// Debug rendering of the key being locked
        key: String,
        /// Error returned by the collaborator
        #[source]
        source: BoxError,
    },

    /// Every attempt reported the resource as already locked.
    #[error("maximum attempts reached ({attempts})")]
    MaxAttemptsReached {
        /// Number of acquire attempts made
        attempts: u32,
    },

    /// The execution context was cancelled before the lock was obtained.
    #[error("lock acquisition cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if the attempt budget ran out.
    pub fn is_max_attempts_reached(&self) -> bool {
        matches!(self, Error::MaxAttemptsReached { .. })
    }

    /// Returns `true` if acquisition was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
