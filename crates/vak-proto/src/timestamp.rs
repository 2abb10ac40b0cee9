// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime timestamp decoding.
//!
//! Two encodings are in use. Older servers send plain microseconds since the
//! Unix epoch. Newer servers pack a Modified Julian Date in the top 24 bits
//! and microseconds since midnight in the low 40 bits. Values below
//! [`MJD_THRESHOLD`] are taken to be plain microseconds; no plausible MJD
//! encoding is that small.

/// Boundary between the two encodings.
pub const MJD_THRESHOLD: u64 = 30_000_000_000_000_000;

/// Sentinel meaning "no time available".
pub const NO_TIME: u64 = u64::MAX;

/// Modified Julian Date of 1970-01-01.
pub const MJD_UNIX_EPOCH: i64 = 40_587;

const SECONDS_PER_DAY: i64 = 86_400;
const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_OF_DAY_MASK: u64 = 0xff_ffff_ffff;

/// Decode a timestamp into microseconds since the Unix epoch.
///
/// Returns `None` for [`NO_TIME`].
pub fn to_unix_micros(value: u64) -> Option<i64> {
    if value == NO_TIME {
        return None;
    }
    if value < MJD_THRESHOLD {
        return Some(value as i64);
    }
    let mjd = (value >> 40) as i64;
    let micros_of_day = (value & MICROS_OF_DAY_MASK) as i64;
    Some((mjd - MJD_UNIX_EPOCH) * SECONDS_PER_DAY * MICROS_PER_SECOND + micros_of_day)
}

/// Decode a timestamp into fractional seconds since the Unix epoch.
pub fn to_unix_seconds(value: u64) -> Option<f64> {
    if value == NO_TIME {
        return None;
    }
    if value < MJD_THRESHOLD {
        return Some(value as f64 / 1e6);
    }
    let mjd = (value >> 40) as i64;
    let micros_of_day = value & MICROS_OF_DAY_MASK;
    Some(((mjd - MJD_UNIX_EPOCH) * SECONDS_PER_DAY) as f64 + micros_of_day as f64 / 1e6)
}

/// Encode Unix microseconds in the MJD form.
pub fn from_unix_micros(micros: i64) -> u64 {
    let day_micros = SECONDS_PER_DAY * MICROS_PER_SECOND;
    let days = micros.div_euclid(day_micros);
    let micros_of_day = micros.rem_euclid(day_micros);
    (((days + MJD_UNIX_EPOCH) as u64) << 40) | micros_of_day as u64
}
