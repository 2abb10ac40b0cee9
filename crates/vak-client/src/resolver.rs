// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Turning query results into a clock adjustment.
//!
//! Each reply becomes a [`Measurement`]: how far the local clock is from the
//! server's, give or take half the round trip plus the server's radius. The
//! [`Resolver`] feeds these intervals to an [`Overlap`] engine until a large
//! enough majority agrees.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use crate::client::{QueryResult, RoughtimeClient};
use crate::error::VakError;
use crate::overlap::{InvalidRange, OptimizedOverlap, Overlap};
use crate::server::ServerDescriptor;

/// Default number of agreeing servers required.
pub const DEFAULT_QUORUM: usize = 10;

/// Default largest acceptable uncertainty.
pub const DEFAULT_MAX_UNCERTAINTY: Duration = Duration::from_secs(2);

/// Offset of the local clock from one server, in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    /// Server label.
    pub server: String,
    /// Local time halfway through the exchange, as Unix seconds.
    pub local_time: f64,
    /// Server midpoint as Unix seconds.
    pub remote_time: f64,
    /// Round-trip time in seconds.
    pub rtt: f64,
    /// Amount to add to the local clock.
    pub adjustment: f64,
    /// Half the round trip plus the server's radius.
    pub uncertainty: f64,
}

fn unix_seconds(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

impl Measurement {
    /// Build from a verified reply. `None` when the reply carries no time.
    pub fn from_result(result: &QueryResult) -> Option<Measurement> {
        let remote_time = result.midpoint_seconds()?;
        let rtt = result.rtt.as_secs_f64();
        let local_time = unix_seconds(result.sent_at) + rtt / 2.0;
        Some(Measurement {
            server: result.server.clone(),
            local_time,
            remote_time,
            rtt,
            adjustment: remote_time - local_time,
            uncertainty: rtt / 2.0 + result.radius_seconds(),
        })
    }

    /// `(adjustment - uncertainty, adjustment + uncertainty)`.
    pub fn interval(&self) -> (f64, f64) {
        (
            self.adjustment - self.uncertainty,
            self.adjustment + self.uncertainty,
        )
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<38} adj {:9.0} us rtt {:7.0} us unc {:7.0} us",
            self.server,
            self.adjustment * 1e6,
            self.rtt * 1e6,
            self.uncertainty * 1e6
        )
    }
}

/// When the resolver may stop.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Agreeing servers required, in addition to a strict majority.
    pub quorum: usize,
    /// Largest acceptable half-width of the agreed region.
    pub max_uncertainty: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            quorum: DEFAULT_QUORUM,
            max_uncertainty: DEFAULT_MAX_UNCERTAINTY,
        }
    }
}

/// An accepted clock adjustment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    /// Seconds to add to the local clock.
    pub adjustment: f64,
    /// Half the width of the agreed region, in seconds.
    pub uncertainty: f64,
    /// Servers whose intervals contain the region.
    pub count: usize,
    /// Replies taken into account.
    pub responses: usize,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} clocks agree: adjust {:+.0} us, uncertainty {:.0} us",
            self.count,
            self.responses,
            self.adjustment * 1e6,
            self.uncertainty * 1e6
        )
    }
}

/// Accumulates measurements until enough servers agree.
#[derive(Debug)]
pub struct Resolver<O = OptimizedOverlap> {
    config: ResolverConfig,
    engine: O,
    responses: usize,
    last_count: usize,
}

impl Resolver<OptimizedOverlap> {
    /// Resolver using the incremental overlap engine.
    pub fn new(config: ResolverConfig) -> Self {
        Resolver::with_engine(config, OptimizedOverlap::new())
    }
}

impl<O: Overlap> Resolver<O> {
    /// Resolver using `engine`.
    pub fn with_engine(config: ResolverConfig, engine: O) -> Self {
        Resolver {
            config,
            engine,
            responses: 0,
            last_count: 0,
        }
    }

    /// Replies accepted so far.
    pub fn responses(&self) -> usize {
        self.responses
    }

    /// Add one measurement and check whether the servers now agree.
    pub fn record(&mut self, measurement: &Measurement) -> Result<Option<Resolution>, InvalidRange> {
        let (lo, hi) = measurement.interval();
        self.engine.add(lo, hi)?;
        self.responses += 1;

        let (count, lo, hi) = self.engine.find();
        let (Some(lo), Some(hi)) = (lo, hi) else {
            return Ok(None);
        };
        let uncertainty = (hi - lo) / 2.0;
        if count <= self.responses / 2
            || count < self.config.quorum
            || uncertainty > self.config.max_uncertainty.as_secs_f64()
        {
            debug!(
                "resolver: {}/{} agree on [{:.6}, {:.6}], not yet accepted",
                count, self.responses, lo, hi
            );
            return Ok(None);
        }

        // More replies can only widen agreement.
        debug_assert!(self.last_count <= count);
        self.last_count = count;
        Ok(Some(Resolution {
            adjustment: (hi + lo) / 2.0,
            uncertainty,
            count,
            responses: self.responses,
        }))
    }

    /// Query `servers` in order until enough of them agree.
    ///
    /// Servers that fail are logged and skipped. Returns `None` when the list
    /// runs out first.
    pub fn run(&mut self, client: &mut RoughtimeClient, servers: &[ServerDescriptor]) -> Option<Resolution> {
        self.run_with(servers, |server| client.query(server))
    }

    /// Like [`Resolver::run`] with a caller-supplied query function.
    pub fn run_with<F>(&mut self, servers: &[ServerDescriptor], mut query: F) -> Option<Resolution>
    where
        F: FnMut(&ServerDescriptor) -> Result<QueryResult, VakError>,
    {
        for server in servers {
            let result = match query(server) {
                Ok(r) => r,
                Err(e) => {
                    info!("resolver: skipping {}: {}", server.label(), e);
                    continue;
                }
            };
            let Some(measurement) = Measurement::from_result(&result) else {
                info!("resolver: skipping {}: reply carries no time", server.label());
                continue;
            };
            debug!("resolver: {}", measurement);

            match self.record(&measurement) {
                Ok(Some(resolution)) => {
                    info!("resolver: success with {}", resolution);
                    return Some(resolution);
                }
                Ok(None) => {}
                Err(e) => warn!("resolver: rejected interval from {}: {}", server.label(), e),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(adjustment: f64, uncertainty: f64) -> Measurement {
        Measurement {
            server: "test".into(),
            local_time: 0.0,
            remote_time: adjustment,
            rtt: 0.0,
            adjustment,
            uncertainty,
        }
    }

    fn config(quorum: usize) -> ResolverConfig {
        ResolverConfig {
            quorum,
            ..ResolverConfig::default()
        }
    }

    #[test]
    fn test_interval() {
        assert_eq!(measurement(1.0, 0.25).interval(), (0.75, 1.25));
    }

    #[test]
    fn test_from_result() {
        let result = QueryResult {
            server: "a".into(),
            peer: "127.0.0.1:2002".parse().unwrap(),
            midpoint: 1_000_500_000,
            radius: 100_000,
            mint: 0,
            maxt: u64::MAX - 1,
            path_len: 0,
            dtai: None,
            leap: None,
            sent_at: UNIX_EPOCH + Duration::from_secs(1000),
            rtt: Duration::from_millis(200),
        };
        let m = Measurement::from_result(&result).unwrap();
        assert!((m.local_time - 1000.1).abs() < 1e-9);
        assert!((m.adjustment - 0.4).abs() < 1e-9);
        assert!((m.uncertainty - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_quorum_and_majority() {
        let mut r = Resolver::new(config(2));
        assert_eq!(r.record(&measurement(0.5, 0.1)).unwrap(), None);
        // Two agree out of two.
        let res = r.record(&measurement(0.55, 0.1)).unwrap().unwrap();
        assert_eq!(res.count, 2);
        assert_eq!(res.responses, 2);
        assert!((res.adjustment - 0.525).abs() < 1e-9);
        assert!((res.uncertainty - 0.075).abs() < 1e-9);
    }

    #[test]
    fn test_falsetickers_block_majority() {
        let mut r = Resolver::new(config(1));
        // 1/1 agrees with itself.
        assert!(r.record(&measurement(0.0, 0.1)).unwrap().is_some());
        // Two disjoint intervals: 1 of 2 is not a majority.
        assert_eq!(r.record(&measurement(5.0, 0.1)).unwrap(), None);
        let res = r.record(&measurement(0.05, 0.1)).unwrap().unwrap();
        assert_eq!((res.count, res.responses), (2, 3));
    }

    #[test]
    fn test_uncertainty_limit() {
        let mut r = Resolver::new(ResolverConfig {
            quorum: 1,
            max_uncertainty: Duration::from_millis(100),
        });
        assert_eq!(r.record(&measurement(0.0, 1.0)).unwrap(), None);
        assert!(r.record(&measurement(0.0, 0.05)).unwrap().is_some());
    }

    #[test]
    fn test_invalid_interval_is_not_counted() {
        let mut r = Resolver::new(config(1));
        assert!(r.record(&measurement(0.0, -1.0)).is_err());
        assert_eq!(r.responses(), 0);
    }

    #[test]
    fn test_run_with_skips_failures() {
        use crate::error::TimeoutError;

        let servers: Vec<ServerDescriptor> = (0..4)
            .map(|i| ServerDescriptor::new(format!("s{i}"), 2002, [0u8; 32]))
            .collect();
        let mut r = Resolver::new(config(2));
        let mut calls = 0;
        let res = r.run_with(&servers, |server| {
            calls += 1;
            if server.address == "s0" {
                return Err(TimeoutError::Query.into());
            }
            Ok(QueryResult {
                server: server.label(),
                peer: "127.0.0.1:2002".parse().unwrap(),
                midpoint: 1_000_000_000,
                radius: 10_000,
                mint: 0,
                maxt: u64::MAX - 1,
                path_len: 0,
                dtai: None,
                leap: None,
                sent_at: UNIX_EPOCH + Duration::from_secs(1000),
                rtt: Duration::ZERO,
            })
        });
        let res = res.unwrap();
        assert_eq!(calls, 3);
        assert_eq!((res.count, res.responses), (2, 2));
        assert!(res.adjustment.abs() < 1e-9);
    }
}
