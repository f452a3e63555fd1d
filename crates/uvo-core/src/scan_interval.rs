//! Validated polling interval

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Shortest accepted scan interval (minutes)
pub const SCAN_INTERVAL_MIN_MINUTES: u32 = 1;

/// Longest accepted scan interval (minutes)
pub const SCAN_INTERVAL_MAX_MINUTES: u32 = 999;

/// Scan interval used when the account has no explicit option set (minutes)
pub const DEFAULT_SCAN_INTERVAL_MINUTES: u32 = 30;

/// Error for an out-of-range scan interval
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("scan interval must be between {SCAN_INTERVAL_MIN_MINUTES} and {SCAN_INTERVAL_MAX_MINUTES} minutes, got {0}")]
pub struct ScanIntervalError(pub u32);

/// How often a vehicle coordinator polls the owners service
///
/// Kept in whole minutes, matching the account option the setup flow
/// collects. Construction validates the 1-999 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ScanInterval(u32);

impl ScanInterval {
    /// Create a validated scan interval
    pub fn new(minutes: u32) -> Result<Self, ScanIntervalError> {
        if !(SCAN_INTERVAL_MIN_MINUTES..=SCAN_INTERVAL_MAX_MINUTES).contains(&minutes) {
            return Err(ScanIntervalError(minutes));
        }
        Ok(Self(minutes))
    }

    /// Interval length in minutes
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Interval length as a Duration
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0) * 60)
    }
}

impl Default for ScanInterval {
    fn default() -> Self {
        Self(DEFAULT_SCAN_INTERVAL_MINUTES)
    }
}

impl TryFrom<u32> for ScanInterval {
    type Error = ScanIntervalError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<ScanInterval> for u32 {
    fn from(interval: ScanInterval) -> u32 {
        interval.0
    }
}
