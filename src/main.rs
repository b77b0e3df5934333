//! Fare Capping CLI
//!
//! Reads a time-ordered tap CSV (`payee_id,tap_time`) and writes one fare
//! record per tap (`payee_id,tap_time,fare`) to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- taps.csv > fares.csv
//! cargo run -- taps.csv 12 7 2.90 > fares.csv
//! ```
//!
//! Optional positional arguments override `cap_limit`, the window length in
//! days and the base fare, in that order.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `info`, `debug` or `warn` to control logging verbosity

use chrono::Duration;
use fare_capping::{CappingEngine, CappingError, CappingPolicy, Fare, Result};
use rust_decimal::Decimal;
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::process;
use std::str::FromStr;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(CappingError::MissingArgument);
    }

    let policy = policy_from_args(&args[2..])?;
    let mut engine = CappingEngine::new(policy)?;

    let input_path = &args[1];
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let stdout = io::stdout();
    let handle = BufWriter::new(stdout.lock());
    engine.process_csv(reader, handle)?;

    Ok(())
}

/// Builds the policy from `[cap_limit] [window_days] [base_fare]`.
fn policy_from_args(args: &[String]) -> Result<CappingPolicy> {
    let defaults = CappingPolicy::default();

    let cap_limit = match args.first() {
        Some(raw) => parse_arg("cap_limit", raw, |s| i64::from_str(s).ok())?,
        None => defaults.cap_limit as i64,
    };
    let window = match args.get(1) {
        Some(raw) => parse_arg("window_days", raw, |s| {
            i64::from_str(s).ok().and_then(Duration::try_days)
        })?,
        None => defaults.window,
    };
    let base_fare = match args.get(2) {
        Some(raw) => Fare::exact(parse_arg("base_fare", raw, |s| Decimal::from_str(s).ok())?)?,
        None => defaults.base_fare,
    };

    CappingPolicy::new(cap_limit, window, base_fare)
}

fn parse_arg<T>(name: &'static str, raw: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
    parse(raw.trim()).ok_or_else(|| CappingError::InvalidArgument {
        name,
        value: raw.to_string(),
    })
}
