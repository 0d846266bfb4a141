//! Exponential delay with jitter.

use super::Delay;
use super::fixed::DEFAULT_FIXED_DELAY;
use std::time::Duration;

/// Exponential delay strategy with configurable cap and jitter.
///
/// Each call to [`Delay::next`] returns `initial_delay * multiplier^n`, where
/// `n` counts previous calls, capped at `max_delay`. Jitter spreads the value
/// symmetrically so that contending callers do not retry in lockstep.
///
/// # Formula
///
/// ```text
/// base_delay   = initial_delay * (multiplier ^ n)
/// jittered     = base_delay + base_delay * jitter * random(-1.0, +1.0)
/// final_delay  = min(jittered, max_delay)
/// ```
///
/// # Examples
///
/// ```rust
/// use locker::delay::{Delay, ExponentialDelay};
/// use std::time::Duration;
///
/// let mut delay = ExponentialDelay::builder()
///     .initial_delay(Duration::from_millis(10))
///     .max_delay(Duration::from_millis(50))
///     .build();
///
/// assert_eq!(delay.next(), Duration::from_millis(10));
/// assert_eq!(delay.next(), Duration::from_millis(20));
/// assert_eq!(delay.next(), Duration::from_millis(40));
/// assert_eq!(delay.next(), Duration::from_millis(50));
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialDelay {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: f64,
    attempt: u32,
}

impl ExponentialDelay {
    /// Create a new builder for configuring exponential delay.
    pub fn builder() -> ExponentialDelayBuilder {
        ExponentialDelayBuilder::default()
    }

    /// Number of delays handed out so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Start the sequence over from `initial_delay`.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base = self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent);

        let jittered = if self.jitter > 0.0 {
            // base * jitter * random(-1.0, +1.0)
            let jitter_amount = base * self.jitter * (rand::random::<f64>() - 0.5) * 2.0;
            base + jitter_amount
        } else {
            base
        };

        let capped = jittered.min(self.max_delay.as_nanos() as f64);
        // Float to int casts saturate, so NaN and negatives land on zero.
        Duration::from_nanos(capped.round() as u64)
    }
}

impl Default for ExponentialDelay {
    /// Defaults:
    /// - `initial_delay`: 5ms
    /// - `max_delay`: 1s
    /// - `multiplier`: 2.0
    /// - `jitter`: 0.0
    fn default() -> Self {
        ExponentialDelayBuilder::default().build()
    }
}

impl Delay for ExponentialDelay {
    fn next(&mut self) -> Duration {
        let delay = self.delay_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }
}

/// Builder for configuring [`ExponentialDelay`].
///
/// # Examples
///
/// ```rust
/// use locker::delay::ExponentialDelay;
/// use std::time::Duration;
///
/// let delay = ExponentialDelay::builder()
///     .initial_delay(Duration::from_millis(20))
///     .max_delay(Duration::from_secs(2))
///     .multiplier(1.5)
///     .jitter(0.2)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ExponentialDelayBuilder {
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
}

impl ExponentialDelayBuilder {
    /// Set the first delay returned.
    ///
    /// Default: 5ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the upper bound for any single delay.
    ///
    /// Default: 1s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the growth factor, clamped to at least 1.0.
    ///
    /// Default: 2.0
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier.max(1.0));
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// A jitter of 0.1 lets each delay vary by ±10%.
    ///
    /// Default: 0.0
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter.clamp(0.0, 1.0));
        self
    }

    /// Build the [`ExponentialDelay`], using defaults for unset values.
    pub fn build(self) -> ExponentialDelay {
        ExponentialDelay {
            initial_delay: self.initial_delay.unwrap_or(DEFAULT_FIXED_DELAY),
            max_delay: self.max_delay.unwrap_or(Duration::from_secs(1)),
            multiplier: self.multiplier.unwrap_or(2.0),
            jitter: self.jitter.unwrap_or(0.0),
            attempt: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_growth() {
        let mut delay = ExponentialDelay::builder()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(10))
            .build();

        assert_eq!(delay.next(), Duration::from_millis(100));
        assert_eq!(delay.next(), Duration::from_millis(200));
        assert_eq!(delay.next(), Duration::from_millis(400));
        assert_eq!(delay.next(), Duration::from_millis(800));
        assert_eq!(delay.attempt(), 4);
    }

    #[test]
    fn test_max_delay_cap() {
        let mut delay = ExponentialDelay::builder()
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(5))
            .multiplier(10.0)
            .build();

        for _ in 0..10 {
            let d = delay.next();
            assert!(d <= Duration::from_secs(5), "delay {:?} exceeded max_delay", d);
        }
        assert_eq!(delay.next(), Duration::from_secs(5));
    }

    #[test]
    fn test_reset() {
        let mut delay = ExponentialDelay::builder()
            .initial_delay(Duration::from_millis(10))
            .build();

        delay.next();
        delay.next();
        delay.reset();

        assert_eq!(delay.attempt(), 0);
        assert_eq!(delay.next(), Duration::from_millis(10));
    }

    #[test]
    fn test_jitter_bounds() {
        let mut delays = Vec::new();
        for _ in 0..20 {
            let mut delay = ExponentialDelay::builder()
                .initial_delay(Duration::from_secs(1))
                .max_delay(Duration::from_secs(60))
                .jitter(0.5)
                .build();
            delays.push(delay.next());
        }

        for d in &delays {
            let millis = d.as_millis();
            assert!(
                (500..=1500).contains(&millis),
                "delay with 50% jitter should be in [500ms, 1500ms], got {}ms",
                millis
            );
        }

        let all_same = delays.windows(2).all(|w| w[0] == w[1]);
        assert!(!all_same, "with randomization, delays should vary");
    }

    #[test]
    fn test_builder_defaults() {
        let delay = ExponentialDelay::default();

        assert_eq!(delay.initial_delay, Duration::from_millis(5));
        assert_eq!(delay.max_delay, Duration::from_secs(1));
        assert_eq!(delay.multiplier, 2.0);
        assert_eq!(delay.jitter, 0.0);
        assert_eq!(delay.attempt, 0);
    }

    #[test]
    fn test_builder_clamps() {
        let delay = ExponentialDelay::builder().jitter(2.0).multiplier(0.5).build();
        assert_eq!(delay.jitter, 1.0);
        assert_eq!(delay.multiplier, 1.0);

        let delay = ExponentialDelay::builder().jitter(-0.5).build();
        assert_eq!(delay.jitter, 0.0);
    }

    #[test]
    fn test_attempt_counter_saturates() {
        let mut delay = ExponentialDelay::builder()
            .initial_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(3))
            .build();
        delay.attempt = u32::MAX;

        assert_eq!(delay.next(), Duration::from_millis(3));
        assert_eq!(delay.attempt(), u32::MAX);
    }
}
