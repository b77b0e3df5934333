//! # Fare Capping
//!
//! A streaming fare engine that applies a rolling-window fare cap to a
//! time-ordered stream of rider taps.
//!
//! ## Design Principles
//!
//! - **Sliding window**: a tap is free once the rider has `cap_limit` paid
//!   taps within the trailing window; free taps never occupy cap slots
//! - **Fixed-point money**: fares use 2 decimal places via `rust_decimal`
//! - **Order preserving**: one fare record per tap, in input order
//! - **Explicit ordering contract**: per-rider out-of-order taps are rejected
//!   unless the policy opts into tolerating them
//!
//! ## Example
//!
//! ```no_run
//! use fare_capping::{CappingEngine, CappingPolicy};
//! use std::io::Cursor;
//!
//! let csv = "payee_id,tap_time\nr1,2023-09-01 08:00:00\n";
//! let mut engine = CappingEngine::new(CappingPolicy::default()).unwrap();
//! engine.process_csv(Cursor::new(csv), std::io::stdout()).unwrap();
//! ```

pub mod engine;
pub mod error;
pub mod fare;
pub mod policy;
pub mod shard;
pub mod tap;
pub mod window;

pub use engine::{process, CappingEngine, CappingStats};
pub use error::{CappingError, Result};
pub use fare::Fare;
pub use policy::{CappingPolicy, OrderingPolicy};
pub use shard::process_sharded;
pub use tap::{FareRecord, Tap, TapRecord};
pub use window::RiderWindow;
