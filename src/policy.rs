//! Capping policy configuration.

use crate::error::{CappingError, Result};
use crate::fare::Fare;
use chrono::Duration;

/// Default number of paid trips allowed per window.
pub const DEFAULT_CAP_LIMIT: usize = 12;

/// Default window length in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// What the engine does when a rider's tap is earlier than their previous tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// Fail the run with `CappingError::OutOfOrderInput`.
    #[default]
    Reject,

    /// Log a warning and evict using the tap's own window start.
    Tolerate,
}

/// Parameters of the rolling-window fare cap.
///
/// # Window boundary
///
/// For a tap at `t`, a stored paid tap `p` still counts against the cap when
/// `p >= t - window`. A paid tap exactly `window` old is therefore still
/// counted; it is evicted once it is strictly older.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CappingPolicy {
    /// Maximum number of paid trips within any trailing window.
    pub cap_limit: usize,

    /// Length of the trailing window.
    pub window: Duration,

    /// Fare charged for a non-capped trip.
    pub base_fare: Fare,

    /// Handling of per-rider out-of-order taps.
    pub ordering: OrderingPolicy,
}

impl CappingPolicy {
    /// Creates a validated policy.
    ///
    /// `cap_limit` is signed so that caller mistakes surface as
    /// `InvalidConfiguration` instead of wrapping.
    pub fn new(cap_limit: i64, window: Duration, base_fare: Fare) -> Result<Self> {
        if cap_limit <= 0 {
            return Err(CappingError::InvalidConfiguration(format!(
                "cap_limit must be positive, got {}",
                cap_limit
            )));
        }
        let cap_limit = usize::try_from(cap_limit).map_err(|_| {
            CappingError::InvalidConfiguration(format!("cap_limit {} is too large", cap_limit))
        })?;

        let policy = CappingPolicy {
            cap_limit,
            window,
            base_fare,
            ordering: OrderingPolicy::default(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Sets the out-of-order handling.
    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    /// Checks every parameter. Called by the engine before any tap is seen.
    pub fn validate(&self) -> Result<()> {
        if self.cap_limit == 0 {
            return Err(CappingError::InvalidConfiguration(
                "cap_limit must be positive, got 0".to_string(),
            ));
        }
        if self.window <= Duration::zero() {
            return Err(CappingError::InvalidConfiguration(format!(
                "window must be positive, got {}",
                self.window
            )));
        }
        if self.base_fare.is_negative() {
            return Err(CappingError::InvalidConfiguration(format!(
                "base_fare must not be negative, got {}",
                self.base_fare
            )));
        }
        Ok(())
    }
}

impl Default for CappingPolicy {
    fn default() -> Self {
        CappingPolicy {
            cap_limit: DEFAULT_CAP_LIMIT,
            window: Duration::days(DEFAULT_WINDOW_DAYS),
            base_fare: Fare::standard(),
            ordering: OrderingPolicy::default(),
        }
    }
}
