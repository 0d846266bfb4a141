#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry-driven lock acquisition.
//!
//! `locker` does not implement locking itself. It wraps caller-supplied
//! acquire and release functions, which may talk to a database, a
//! distributed lock service, the file system or an in-memory map, with a
//! uniform retry policy:
//!
//! - When the acquire function reports [`AcquireError::AlreadyLocked`], the
//!   [`Locker`] waits for the duration chosen by its [`Delay`] strategy and
//!   tries again, up to a bounded number of attempts.
//! - Any other acquire failure is returned immediately as
//!   [`Error::AcquireFailed`].
//! - Running out of attempts yields [`Error::MaxAttemptsReached`].
//! - Cancelling the [`CancellationToken`](tokio_util::sync::CancellationToken)
//!   passed to [`Locker::acquire`] ends any wait with [`Error::Cancelled`].
//!
//! A successful acquisition returns a [`Lock`] handle whose
//! [`release`](Lock::release) calls the release function with the same key.
//!
//! # Examples
//!
//! ```rust
//! use locker::prelude::*;
//! use std::collections::HashSet;
//! use std::sync::{Arc, Mutex};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let held = Arc::new(Mutex::new(HashSet::new()));
//!
//! let acquire = {
//!     let held = Arc::clone(&held);
//!     move |_ctx: CancellationToken, key: String| {
//!         let inserted = held.lock().unwrap().insert(key);
//!         async move {
//!             if inserted {
//!                 Ok(())
//!             } else {
//!                 Err(AcquireError::AlreadyLocked)
//!             }
//!         }
//!     }
//! };
//! let release = {
//!     let held = Arc::clone(&held);
//!     move |_ctx: CancellationToken, key: String| {
//!         held.lock().unwrap().remove(&key);
//!         async { Ok::<_, BoxError>(()) }
//!     }
//! };
//!
//! let locker = Locker::new(acquire, release);
//! let ctx = CancellationToken::new();
//!
//! let lock = locker.acquire(&ctx, "invoices/2024".to_string()).await?;
//! assert_eq!(lock.key(), "invoices/2024");
//! lock.release(&ctx).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod delay;
pub mod error;
pub mod lock;
mod locker;

pub use config::{DelayConfig, LockerConfig};
pub use delay::{Delay, ExponentialDelay, FixedDelay};
pub use error::{AcquireError, BoxError, Error, Result};
pub use lock::{Lock, LockOption};
pub use locker::{AcquireFn, DEFAULT_MAX_ATTEMPTS, Locker, LockerBuilder, ReleaseFn};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use locker::prelude::*;
/// ```
pub mod prelude {
    pub use crate::delay::{Delay, ExponentialDelay, FixedDelay};
    pub use crate::error::{AcquireError, BoxError, Error};
    pub use crate::lock::{Lock, LockOption, with_label, with_metadata};
    pub use crate::locker::{AcquireFn, Locker, ReleaseFn};
}
