use std::time::Duration;

/// Connect retry budget: a fixed number of attempts with a fixed delay
/// between failures.
///
/// The budget counts attempts, not elapsed time. It exists to absorb the
/// startup race where the destination listener (typically behind an
/// out-of-band port-forwarding step) is not yet bound when the session
/// starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum connect attempts. Zero is treated as one.
    pub max_attempts: u32,
    /// Sleep between failed attempts. No sleep follows the final failure.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// The effective attempt count, with zero normalized to one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_attempts_normalized_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(50));
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn positive_attempts_unchanged() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.attempts(), 5);
    }

    #[test]
    fn default_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 5);
        assert_eq!(policy.delay, Duration::from_millis(100));
    }
}
