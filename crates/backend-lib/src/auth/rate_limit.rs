// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Lockout after repeated failed logins.
//!
//! Attempts are tracked per account (normalized email) rather than per
//! client address, so one abusive client cannot lock out a whole NAT.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of failed attempts before lockout
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (5 minutes)
const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(5 * 60);

/// Entries without a failure for this long are dropped by `cleanup`
const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct AttemptEntry {
    failed_attempts: u32,
    last_failure: Instant,
    lockout_expiry: Option<Instant>,
}

impl AttemptEntry {
    fn is_locked(&self, now: Instant) -> bool {
        self.lockout_expiry.is_some_and(|expiry| now < expiry)
    }
}

/// Tracks failed login attempts per account.
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<String, AttemptEntry>>,
    max_attempts: u32,
    lockout_duration: Duration,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_DURATION)
    }
}

impl AuthRateLimiter {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts: max_attempts.max(1),
            lockout_duration,
        }
    }

    /// Record a failed login for `account`
    pub fn record_failed_attempt(&self, account: &str) {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(account.to_string())
            .or_insert_with(|| AttemptEntry {
                failed_attempts: 0,
                last_failure: now,
                lockout_expiry: None,
            });

        // expired lockout starts a fresh count
        if entry.lockout_expiry.is_some_and(|expiry| now >= expiry) {
            entry.failed_attempts = 0;
            entry.lockout_expiry = None;
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts && entry.lockout_expiry.is_none() {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            tracing::warn!(
                account,
                attempts = entry.failed_attempts,
                lockout_secs = self.lockout_duration.as_secs(),
                "account locked after repeated login failures"
            );
        }
    }

    /// Forget failures after a successful login
    pub fn record_success(&self, account: &str) {
        self.attempts.remove(account);
    }

    /// Whether `account` may attempt to log in now
    pub fn check_rate_limit(&self, account: &str) -> bool {
        self.attempts
            .get(account)
            .map_or(true, |entry| !entry.is_locked(Instant::now()))
    }

    /// Drop expired lockouts and stale counters
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.attempts.retain(|_, entry| {
            if let Some(expiry) = entry.lockout_expiry {
                return now < expiry;
            }
            now.duration_since(entry.last_failure) < STALE_AFTER
        });
    }

    pub fn tracked_accounts(&self) -> usize {
        self.attempts.len()
    }
}
