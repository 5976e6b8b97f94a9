//! Scheduling of the instant at which a new ballot becomes countable.
//!
//! A ballot is held back by a random blind in `[0, refresh_interval)` plus one full
//! interval, and the result is aligned down on the interval grid. Observers only ever
//! see ballots appear on grid boundaries, and cannot tell when within the previous
//! intervals a ballot was actually cast.

use log::debug;
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use snafu::prelude::*;

use crate::config::*;

/// Computes the viewable time of a ballot cast at `now`, using the operating system
/// random source for the blind.
pub fn schedule(now: Timestamp, refresh_interval: RefreshInterval) -> Result<Timestamp, TallyError> {
    schedule_with_rng(&mut OsRng, now, refresh_interval)
}

/// Same as [schedule], with an explicit cryptographic random source.
pub fn schedule_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    now: Timestamp,
    refresh_interval: RefreshInterval,
) -> Result<Timestamp, TallyError> {
    let interval = refresh_interval.as_nanos();
    ensure!(
        interval > 0,
        InvalidConfigSnafu {
            refresh_interval: interval
        }
    );
    let blind = rng.gen_range(0..interval);
    let viewable = align(now, blind, interval)?;
    debug!(
        "schedule: now: {} interval: {} viewable: {}",
        now, interval, viewable
    );
    Ok(viewable)
}

// floor(now + blind + interval) on the interval grid. Requires interval > 0.
fn align(now: Timestamp, blind: i64, interval: i64) -> Result<Timestamp, TallyError> {
    let raw = now
        .as_nanos()
        .checked_add(blind)
        .and_then(|t| t.checked_add(interval))
        .context(TimestampOverflowSnafu {})?;
    Ok(Timestamp::from_nanos(raw - raw.rem_euclid(interval)))
}
