//! Delay strategies used between acquisition attempts.
//!
//! # Key Types
//!
//! - [`Delay`] - Core trait producing successive wait durations
//! - [`FixedDelay`] - Always waits the same amount of time
//! - [`ExponentialDelay`] - Exponential growth with a cap and optional jitter
//!
//! # Examples
//!
//! ```rust
//! use locker::delay::{Delay, ExponentialDelay, FixedDelay};
//! use std::time::Duration;
//!
//! let mut fixed = FixedDelay::new(Duration::from_millis(10));
//! assert_eq!(fixed.next(), Duration::from_millis(10));
//!
//! let mut exp = ExponentialDelay::builder()
//!     .initial_delay(Duration::from_millis(10))
//!     .build();
//! assert_eq!(exp.next(), Duration::from_millis(10));
//! assert_eq!(exp.next(), Duration::from_millis(20));
//! ```

mod exponential;
mod fixed;

use std::time::Duration;

pub use exponential::{ExponentialDelay, ExponentialDelayBuilder};
pub use fixed::FixedDelay;

/// Produces the wait duration before the next acquisition attempt.
///
/// Implementations may keep state (an attempt counter, a growing window) and
/// advance it on every call. A delay instance is owned by a single
/// [`Locker`](crate::Locker); sharing one stateful instance between lockers
/// is not supported unless the implementation says otherwise.
pub trait Delay: Send {
    /// Return the duration to wait and advance internal state.
    fn next(&mut self) -> Duration;
}

impl<D: Delay + ?Sized> Delay for Box<D> {
    fn next(&mut self) -> Duration {
        (**self).next()
    }
}
