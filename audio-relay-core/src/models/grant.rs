use std::time::{Duration, Instant};

/// Opaque capture authorization issued by the host platform's consent flow.
///
/// Single-use by construction: the grant is not `Clone` and is consumed by
/// value when a capture source opens. A grant may carry a time-to-live;
/// sources check `is_expired` at open time and reject stale grants.
#[derive(Debug)]
pub struct CaptureGrant {
    issued_at: Instant,
    ttl: Option<Duration>,
}

impl CaptureGrant {
    /// Issue a grant with no expiry.
    pub fn issue() -> Self {
        Self {
            issued_at: Instant::now(),
            ttl: None,
        }
    }

    /// Issue a grant valid for `ttl` from now.
    pub fn issue_with_ttl(ttl: Duration) -> Self {
        Self {
            issued_at: Instant::now(),
            ttl: Some(ttl),
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.issued_at.elapsed() >= ttl,
            None => false,
        }
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_grant_never_expires() {
        let grant = CaptureGrant::issue();
        assert!(!grant.is_expired());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let grant = CaptureGrant::issue_with_ttl(Duration::ZERO);
        assert!(grant.is_expired());
    }

    #[test]
    fn generous_ttl_still_valid() {
        let grant = CaptureGrant::issue_with_ttl(Duration::from_secs(3600));
        assert!(!grant.is_expired());
    }
}
