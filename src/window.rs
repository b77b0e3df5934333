//! Per-rider sliding window of paid taps.
//!
//! Only paid taps occupy cap slots. Capped (free) taps are remembered solely
//! as the rider's most recent activity for ordering checks.

use chrono::{Duration, NaiveDateTime};
use std::collections::VecDeque;

/// Window state for a single rider.
///
/// # Invariants
///
/// - After `evict_before(start)`, every stored timestamp is `>= start`
/// - `paid` never grows past the `cap_limit` passed to `charge`
/// - `sorted` is `true` while `paid` is in non-decreasing order
#[derive(Debug, Clone)]
pub struct RiderWindow {
    /// Timestamps of paid taps still inside the trailing window.
    paid: VecDeque<NaiveDateTime>,

    /// Most recent tap timestamp seen for this rider, paid or free.
    last_tap: Option<NaiveDateTime>,

    sorted: bool,
}

impl RiderWindow {
    /// Creates an empty window.
    pub fn new() -> Self {
        RiderWindow {
            paid: VecDeque::new(),
            last_tap: None,
            sorted: true,
        }
    }

    /// Number of paid taps currently counted against the cap.
    pub fn paid_count(&self) -> usize {
        self.paid.len()
    }

    /// The rider's previous tap, if any.
    pub fn last_tap(&self) -> Option<NaiveDateTime> {
        self.last_tap
    }

    /// Removes every paid tap strictly earlier than `window_start`.
    pub fn evict_before(&mut self, window_start: NaiveDateTime) {
        if self.sorted {
            while let Some(&front) = self.paid.front() {
                if front < window_start {
                    self.paid.pop_front();
                } else {
                    break;
                }
            }
        } else {
            self.paid.retain(|&t| t >= window_start);
            self.sorted = self.paid.iter().zip(self.paid.iter().skip(1)).all(|(a, b)| a <= b);
        }
    }

    /// Records a tap and decides whether it is charged.
    ///
    /// Returns `true` and occupies a cap slot when fewer than `cap_limit`
    /// paid taps remain in the window. Otherwise the tap is free and the
    /// window is left untouched.
    pub fn charge(&mut self, timestamp: NaiveDateTime, cap_limit: usize) -> bool {
        self.last_tap = Some(self.last_tap.map_or(timestamp, |last| last.max(timestamp)));

        if self.paid.len() >= cap_limit {
            return false;
        }

        if let Some(&back) = self.paid.back() {
            if timestamp < back {
                self.sorted = false;
            }
        }
        self.paid.push_back(timestamp);
        true
    }

    /// Returns `true` if the rider has not tapped at all, paid or free,
    /// within the window ending at `now`.
    pub fn is_idle_at(&self, now: NaiveDateTime, window: Duration) -> bool {
        let Some(window_start) = now.checked_sub_signed(window) else {
            return false;
        };
        // last_tap is the latest tap, so it bounds every stored paid tap
        self.last_tap.map_or(true, |t| t < window_start)
    }
}

impl Default for RiderWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 9, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + Duration::days(d)
    }

    #[test]
    fn test_new_window_is_empty() {
        let window = RiderWindow::new();
        assert_eq!(window.paid_count(), 0);
        assert!(window.last_tap().is_none());
    }

    #[test]
    fn test_charge_until_cap() {
        let mut window = RiderWindow::new();
        assert!(window.charge(day(0), 2));
        assert!(window.charge(day(1), 2));
        assert!(!window.charge(day(2), 2));

        assert_eq!(window.paid_count(), 2);
        assert_eq!(window.last_tap(), Some(day(2)));
    }

    #[test]
    fn test_evict_keeps_exact_boundary() {
        let mut window = RiderWindow::new();
        window.charge(day(0), 5);
        window.charge(day(1), 5);

        window.evict_before(day(0));
        assert_eq!(window.paid_count(), 2);

        window.evict_before(day(0) + Duration::seconds(1));
        assert_eq!(window.paid_count(), 1);
    }

    #[test]
    fn test_evict_unsorted_buffer() {
        let mut window = RiderWindow::new();
        window.charge(day(5), 5);
        window.charge(day(1), 5);
        window.charge(day(3), 5);

        window.evict_before(day(2));
        assert_eq!(window.paid_count(), 2);

        window.evict_before(day(4));
        assert_eq!(window.paid_count(), 1);
    }

    #[test]
    fn test_last_tap_never_moves_backwards() {
        let mut window = RiderWindow::new();
        window.charge(day(3), 5);
        window.charge(day(1), 5);
        assert_eq!(window.last_tap(), Some(day(3)));
    }

    #[test]
    fn test_idle_detection() {
        let mut window = RiderWindow::new();
        window.charge(day(0), 5);

        let week = Duration::days(7);
        assert!(!window.is_idle_at(day(7), week));
        assert!(window.is_idle_at(day(7) + Duration::seconds(1), week));
    }

    #[test]
    fn test_recent_free_tap_keeps_rider_active() {
        let mut window = RiderWindow::new();
        assert!(window.charge(day(0), 1));
        assert!(!window.charge(day(6), 1));

        let week = Duration::days(7);
        assert!(!window.is_idle_at(day(8), week));
        assert!(window.is_idle_at(day(13) + Duration::seconds(1), week));
    }

    #[test]
    fn test_default_window_is_sorted_and_empty() {
        let mut window = RiderWindow::default();
        window.charge(day(0), 5);
        window.charge(day(2), 5);
        window.evict_before(day(1));
        assert_eq!(window.paid_count(), 1);
    }
}
