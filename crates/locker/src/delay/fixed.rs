//! Fixed-duration delay.

use super::Delay;
use std::time::Duration;

/// Default wait between attempts.
pub(crate) const DEFAULT_FIXED_DELAY: Duration = Duration::from_millis(5);

/// A delay that always returns the same duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    duration: Duration,
}

impl FixedDelay {
    /// Create a delay that always waits `duration`.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// The configured duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for FixedDelay {
    /// 5 milliseconds.
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_DELAY)
    }
}

impl Delay for FixedDelay {
    fn next(&mut self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_is_five_millis() {
        assert_eq!(FixedDelay::default().duration(), Duration::from_millis(5));
    }

    #[test]
    fn test_zero_duration() {
        let mut delay = FixedDelay::new(Duration::ZERO);
        assert_eq!(delay.next(), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn prop_fixed_delay_never_changes(millis in 0u64..100_000, calls in 1usize..64) {
            let d = Duration::from_millis(millis);
            let mut delay = FixedDelay::new(d);
            for _ in 0..calls {
                prop_assert_eq!(delay.next(), d);
            }
        }
    }
}
