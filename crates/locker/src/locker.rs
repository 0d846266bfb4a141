//! Retry orchestration around caller-supplied acquire/release functions.

use crate::config::LockerConfig;
use crate::delay::{Delay, FixedDelay};
use crate::error::{AcquireError, BoxError, Error, Result};
use crate::lock::{Lock, LockOption};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Default number of acquire attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Takes exclusive ownership of a key.
///
/// Implementations must return [`AcquireError::AlreadyLocked`] when the
/// resource is held by someone else. Any other error is treated as fatal.
///
/// Closures of the shape `Fn(CancellationToken, K) -> impl Future<Output =
/// Result<(), AcquireError>>` implement this trait.
#[async_trait]
pub trait AcquireFn<K>: Send + Sync {
    /// Try to lock `key` once.
    async fn acquire(
        &self,
        ctx: &CancellationToken,
        key: &K,
    ) -> std::result::Result<(), AcquireError>;
}

/// Gives up ownership of a key.
///
/// Closures of the shape `Fn(CancellationToken, K) -> impl Future<Output =
/// Result<(), BoxError>>` implement this trait.
#[async_trait]
pub trait ReleaseFn<K>: Send + Sync {
    /// Unlock `key`.
    async fn release(
        &self,
        ctx: &CancellationToken,
        key: &K,
    ) -> std::result::Result<(), BoxError>;
}

#[async_trait]
impl<K, F, Fut> AcquireFn<K> for F
where
    K: Clone + Send + Sync + 'static,
    F: Fn(CancellationToken, K) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<(), AcquireError>> + Send + 'static,
{
    async fn acquire(
        &self,
        ctx: &CancellationToken,
        key: &K,
    ) -> std::result::Result<(), AcquireError> {
        (self)(ctx.clone(), key.clone()).await
    }
}

#[async_trait]
impl<K, F, Fut> ReleaseFn<K> for F
where
    K: Clone + Send + Sync + 'static,
    F: Fn(CancellationToken, K) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<(), BoxError>> + Send + 'static,
{
    async fn release(
        &self,
        ctx: &CancellationToken,
        key: &K,
    ) -> std::result::Result<(), BoxError> {
        (self)(ctx.clone(), key.clone()).await
    }
}

/// Acquires locks through an [`AcquireFn`], retrying while the resource is
/// already locked.
///
/// A `Locker` is fixed once built and can be shared between tasks; every
/// [`acquire`](Locker::acquire) call runs its own retry loop.
///
/// All calls draw from the same [`Delay`], which is never reset. A stateful
/// strategy such as [`ExponentialDelay`](crate::ExponentialDelay) keeps
/// growing across calls, so one caller's contention lengthens the next
/// caller's first wait. Build one locker per caller when that matters.
///
/// # Examples
///
/// ```rust
/// use locker::prelude::*;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let locker = Locker::builder(
///     |_ctx: CancellationToken, _key: String| async { Ok::<_, AcquireError>(()) },
///     |_ctx: CancellationToken, _key: String| async { Ok::<_, BoxError>(()) },
/// )
/// .delay(FixedDelay::new(Duration::from_millis(10)))
/// .max_attempts(3)
/// .build();
///
/// let ctx = CancellationToken::new();
/// let lock = locker.acquire(&ctx, "jobs/nightly".to_string()).await?;
/// lock.release(&ctx).await?;
/// # Ok(())
/// # }
/// ```
pub struct Locker<K> {
    acquire: Arc<dyn AcquireFn<K>>,
    release: Arc<dyn ReleaseFn<K>>,
    delay: Mutex<Box<dyn Delay>>,
    max_attempts: u32,
}

impl<K> Locker<K>
where
    K: fmt::Debug + Send + Sync + 'static,
{
    /// Create a locker with a 5ms fixed delay and 6 attempts.
    pub fn new<A, R>(acquire: A, release: R) -> Self
    where
        A: AcquireFn<K> + 'static,
        R: ReleaseFn<K> + 'static,
    {
        Self::builder(acquire, release).build()
    }

    /// Start configuring a locker.
    pub fn builder<A, R>(acquire: A, release: R) -> LockerBuilder<K>
    where
        A: AcquireFn<K> + 'static,
        R: ReleaseFn<K> + 'static,
    {
        LockerBuilder {
            acquire: Arc::new(acquire),
            release: Arc::new(release),
            delay: None,
            max_attempts: None,
        }
    }

    /// Create a locker whose retry policy comes from `config`.
    pub fn from_config<A, R>(config: &LockerConfig, acquire: A, release: R) -> Self
    where
        A: AcquireFn<K> + 'static,
        R: ReleaseFn<K> + 'static,
    {
        Self::builder(acquire, release)
            .delay(config.delay.build_delay())
            .max_attempts(config.max_attempts)
            .build()
    }

    /// Maximum number of acquire attempts per call.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Acquire a lock for `key`.
    ///
    /// See [`acquire_with`](Locker::acquire_with).
    pub async fn acquire(&self, ctx: &CancellationToken, key: K) -> Result<Lock<K>> {
        self.acquire_with(ctx, key, Vec::new()).await
    }

    /// Acquire a lock for `key`, then apply `options` to the handle in order.
    ///
    /// The acquire function is called at most `max_attempts` times. When it
    /// reports [`AcquireError::AlreadyLocked`] and attempts remain, the call
    /// waits for the next delay before trying again. After the last attempt
    /// it returns without waiting, so an exhausted budget of `n` attempts
    /// takes `n - 1` delays.
    ///
    /// # Errors
    ///
    /// - [`Error::AcquireFailed`] as soon as the acquire function fails with
    ///   anything but `AlreadyLocked`
    /// - [`Error::MaxAttemptsReached`] when every attempt was `AlreadyLocked`
    /// - [`Error::Cancelled`] when `ctx` is cancelled before an attempt or
    ///   during a wait
    pub async fn acquire_with<I>(
        &self,
        ctx: &CancellationToken,
        key: K,
        options: I,
    ) -> Result<Lock<K>>
    where
        I: IntoIterator<Item = LockOption<K>>,
    {
        let mut attempt = 0;

        while attempt < self.max_attempts {
            if ctx.is_cancelled() {
                debug!(key = ?key, attempt, "lock acquisition cancelled");
                return Err(Error::Cancelled);
            }
            attempt += 1;

            match self.acquire.acquire(ctx, &key).await {
                Ok(()) => {
                    debug!(key = ?key, attempt, "lock acquired");
                    let mut lock = Lock::new(key, Arc::clone(&self.release), attempt);
                    for option in options {
                        option(&mut lock);
                    }
                    return Ok(lock);
                }
                Err(AcquireError::AlreadyLocked) => {
                    if attempt == self.max_attempts {
                        break;
                    }
                    let delay = self.next_delay();
                    trace!(
                        key = ?key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "resource already locked, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => {
                            debug!(key = ?key, attempt, "lock acquisition cancelled");
                            return Err(Error::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(AcquireError::Failed(source)) => {
                    return Err(Error::AcquireFailed {
                        key: format!("{:?}", key),
                        source,
                    });
                }
            }
        }

        debug!(key = ?key, attempts = attempt, "maximum attempts reached");
        Err(Error::MaxAttemptsReached { attempts: attempt })
    }

    fn next_delay(&self) -> Duration {
        // The guard never spans an await; a poisoned strategy is still usable.
        self.delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }
}

impl<K> fmt::Debug for Locker<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locker")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Locker`].
///
/// Unset values fall back to a 5ms [`FixedDelay`] and
/// [`DEFAULT_MAX_ATTEMPTS`].
pub struct LockerBuilder<K> {
    acquire: Arc<dyn AcquireFn<K>>,
    release: Arc<dyn ReleaseFn<K>>,
    delay: Option<Box<dyn Delay>>,
    max_attempts: Option<u32>,
}

impl<K> LockerBuilder<K> {
    /// Use `delay` to decide how long to wait between attempts.
    pub fn delay(mut self, delay: impl Delay + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    /// Set the maximum number of acquire attempts.
    ///
    /// Default: 6
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Build the [`Locker`].
    pub fn build(self) -> Locker<K> {
        Locker {
            acquire: self.acquire,
            release: self.release,
            delay: Mutex::new(
                self.delay
                    .unwrap_or_else(|| Box::new(FixedDelay::default()) as Box<dyn Delay>),
            ),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

impl<K> fmt::Debug for LockerBuilder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockerBuilder")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
