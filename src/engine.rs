//! Core fare-capping engine.
//!
//! Processes taps in chronological order and keeps one sliding window of paid
//! taps per rider. Every tap produces exactly one fare record, in input order.

use crate::error::{CappingError, Result};
use crate::fare::Fare;
use crate::policy::{CappingPolicy, OrderingPolicy};
use crate::tap::{FareRecord, Tap, TapRecord};
use crate::window::RiderWindow;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::num::NonZeroUsize;

/// Counters describing a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CappingStats {
    /// Taps processed.
    pub taps: u64,

    /// Taps charged the base fare.
    pub paid: u64,

    /// Taps that were free because the rider hit the cap.
    pub capped: u64,

    /// Riders currently holding window state.
    pub riders_tracked: usize,

    /// Riders dropped by idle sweeps.
    pub riders_evicted: u64,
}

/// The fare-capping engine.
///
/// Owns the per-rider state store. Input is assumed to be sorted by
/// timestamp; a rider tapping earlier than their previous tap is handled
/// according to the policy's [`OrderingPolicy`].
pub struct CappingEngine {
    policy: CappingPolicy,

    /// Window state indexed by rider id.
    windows: HashMap<String, RiderWindow>,

    stats: CappingStats,

    /// Sweep idle riders every `n` taps, if set.
    idle_sweep_every: Option<NonZeroUsize>,

    /// Latest timestamp seen across all riders.
    stream_time: Option<NaiveDateTime>,
}

impl CappingEngine {
    /// Creates an engine, rejecting an invalid policy before any tap is seen.
    pub fn new(policy: CappingPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(CappingEngine {
            policy,
            windows: HashMap::new(),
            stats: CappingStats::default(),
            idle_sweep_every: None,
            stream_time: None,
        })
    }

    /// Enables dropping riders that have not tapped for a full window,
    /// checked every `every` taps.
    pub fn with_idle_sweep(mut self, every: NonZeroUsize) -> Self {
        self.idle_sweep_every = Some(every);
        self
    }

    /// The policy this engine charges under.
    pub fn policy(&self) -> &CappingPolicy {
        &self.policy
    }

    /// Returns a snapshot of the run counters.
    pub fn stats(&self) -> CappingStats {
        CappingStats {
            riders_tracked: self.windows.len(),
            ..self.stats
        }
    }

    /// Number of paid taps currently counted against a rider's cap.
    pub fn paid_in_window(&self, rider_id: &str) -> usize {
        self.windows
            .get(rider_id)
            .map(|w| w.paid_count())
            .unwrap_or(0)
    }

    /// Processes a single tap and returns its fare record.
    pub fn process_tap(&mut self, tap: Tap) -> Result<FareRecord> {
        let window = self.windows.entry(tap.rider_id.clone()).or_default();

        if let Some(previous) = window.last_tap() {
            if tap.timestamp < previous {
                match self.policy.ordering {
                    OrderingPolicy::Reject => {
                        return Err(CappingError::OutOfOrderInput {
                            rider_id: tap.rider_id,
                            previous,
                            timestamp: tap.timestamp,
                        });
                    }
                    OrderingPolicy::Tolerate => {
                        warn!(
                            "Rider {}: tap at {} is earlier than previous tap {}, charging against its own window",
                            tap.rider_id, tap.timestamp, previous
                        );
                    }
                }
            }
        }

        let window_start = tap
            .timestamp
            .checked_sub_signed(self.policy.window)
            .unwrap_or(NaiveDateTime::MIN);
        window.evict_before(window_start);

        let fare = if window.charge(tap.timestamp, self.policy.cap_limit) {
            self.stats.paid += 1;
            self.policy.base_fare
        } else {
            self.stats.capped += 1;
            Fare::ZERO
        };

        debug!(
            "Rider {} at {}: fare {} ({} paid in window)",
            tap.rider_id,
            tap.timestamp,
            fare,
            window.paid_count()
        );

        self.stats.taps += 1;
        self.stream_time = Some(
            self.stream_time
                .map_or(tap.timestamp, |t| t.max(tap.timestamp)),
        );
        self.maybe_sweep();

        Ok(FareRecord {
            rider_id: tap.rider_id,
            timestamp: tap.timestamp,
            fare,
        })
    }

    /// Processes a whole tap stream, one record per tap in input order.
    pub fn process<I>(&mut self, taps: I) -> Result<Vec<FareRecord>>
    where
        I: IntoIterator<Item = Tap>,
    {
        let taps = taps.into_iter();
        let mut records = Vec::with_capacity(taps.size_hint().0);
        for tap in taps {
            records.push(self.process_tap(tap)?);
        }
        Ok(records)
    }

    /// Streams taps from a CSV reader and writes fare records to `writer`.
    ///
    /// Rows that cannot be read as taps are logged at warn level and skipped.
    /// The header `payee_id,tap_time,fare` is always written.
    pub fn process_csv<R: Read, W: Write>(&mut self, reader: R, writer: W) -> Result<CappingStats> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);

        csv_writer.write_record(["payee_id", "tap_time", "fare"])?;

        for (row_idx, result) in csv_reader.deserialize::<TapRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => {
                    if let Some(tap) = record.parse() {
                        let fare_record = self.process_tap(tap)?;
                        csv_writer.serialize(&fare_record)?;
                    } else {
                        warn!("Row {}: Failed to parse tap record", row_num);
                    }
                }
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        csv_writer.flush()?;

        let stats = self.stats();
        info!(
            "Processed {} taps: {} paid, {} capped, {} riders tracked",
            stats.taps, stats.paid, stats.capped, stats.riders_tracked
        );
        Ok(stats)
    }

    /// Drops every rider with no tap, paid or free, in the window ending at
    /// `now`.
    ///
    /// Returns the number of riders removed. Sound only while input stays
    /// sorted; a later tap earlier than `now` would see a fresh window.
    pub fn evict_idle(&mut self, now: NaiveDateTime) -> usize {
        let window = self.policy.window;
        let before = self.windows.len();
        self.windows.retain(|_, w| !w.is_idle_at(now, window));
        let evicted = before - self.windows.len();

        if evicted > 0 {
            debug!("Evicted {} idle riders as of {}", evicted, now);
        }
        self.stats.riders_evicted += evicted as u64;
        evicted
    }

    fn maybe_sweep(&mut self) {
        let (Some(every), Some(now)) = (self.idle_sweep_every, self.stream_time) else {
            return;
        };
        if self.stats.taps % every.get() as u64 == 0 {
            self.evict_idle(now);
        }
    }
}

/// Applies `policy` to a tap stream.
///
/// Convenience wrapper around a fresh [`CappingEngine`].
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use fare_capping::{process, CappingPolicy, Tap};
///
/// let t = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let records = process(vec![Tap::new("r1", t)], &CappingPolicy::default()).unwrap();
/// assert_eq!(records[0].fare.to_string(), "2.90");
/// ```
pub fn process<I>(taps: I, policy: &CappingPolicy) -> Result<Vec<FareRecord>>
where
    I: IntoIterator<Item = Tap>,
{
    CappingEngine::new(policy.clone())?.process(taps)
}
