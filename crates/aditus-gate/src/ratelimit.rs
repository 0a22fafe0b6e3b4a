//! Per-operator sliding-window limiter for the scan path.
//!
//! Advisory and in-process only: a malfunctioning scanner is throttled at
//! this instance's boundary before it can flood the ledger with
//! unidentified attempts. Cross-process correctness never depends on it —
//! that is the ledger constraint's job.

use std::{
  collections::HashMap,
  sync::Mutex,
  time::{Duration, Instant},
};

const WINDOW: Duration = Duration::from_secs(60);

pub struct RateLimiter {
  max_per_window: u32,
  hits:           Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
  pub fn new(max_per_window: u32) -> Self {
    Self { max_per_window, hits: Mutex::new(HashMap::new()) }
  }

  /// Register one attempt for `key`; `false` means the caller is over the
  /// limit and the attempt must be rejected without side effects.
  pub fn allow(&self, key: &str) -> bool {
    let now = Instant::now();
    let mut hits = self
      .hits
      .lock()
      .unwrap_or_else(std::sync::PoisonError::into_inner);

    let entry = hits.entry(key.to_string()).or_default();
    entry.retain(|t| now.duration_since(*t) < WINDOW);

    if entry.len() as u32 >= self.max_per_window {
      return false;
    }
    entry.push(now);
    true
  }
}
