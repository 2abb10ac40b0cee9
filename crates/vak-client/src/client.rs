// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime client with reply chaining.
//!
//! Every request's nonce commits to the previous reply, so the client's
//! history forms a chain that can later be audited: if a server answers with
//! a time earlier than a reply it provably came after, the pair shows up in
//! [`RoughtimeClient::verify_replies`].
//!
//! ```no_run
//! # fn main() -> Result<(), vak_client::error::VakError> {
//! use vak_client::{RoughtimeClient, ServerDescriptor};
//!
//! let server = ServerDescriptor::with_base64_key(
//!     "roughtime.cloudflare.com",
//!     2003,
//!     "0GD7c3yP8xEc4Zl2zeuN2SlLvDVVocjsPSL8/Rl/7zg=",
//! )?;
//! let mut client = RoughtimeClient::new();
//! let result = client.query(&server)?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rand::RngCore;
use vak_proto::request::BLIND_LEN;
use vak_proto::verify::midpoint_and_radius;
use vak_proto::{
    Ed25519Verifier, Packet, ProtocolVersion, Request, SignatureVerifier, timestamp,
    verify_reply_bytes,
};

use crate::error::VakError;
use crate::server::{ServerDescriptor, TransportProtocol};
use crate::transport::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_QUERY_TIMEOUT, TcpTransport, Transport, UdpTransport, resolve,
};

/// Default number of replies kept for chaining and auditing.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Radii below this many microseconds are shown in milliseconds.
const RADIUS_MS_DISPLAY_LIMIT: u64 = 10_000;

/// Client settings.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Replies kept; the oldest is dropped first.
    pub max_history: usize,
    /// How long one receive waits before the deadline is checked again.
    pub attempt_timeout: Duration,
    /// Deadline for a whole query.
    pub query_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            max_history: DEFAULT_MAX_HISTORY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// A verified reply kept for chaining and auditing.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    /// Nonce sent in the request.
    pub nonce: Vec<u8>,
    /// Blinding value the nonce was derived from.
    pub blind: [u8; BLIND_LEN],
    /// Reply bytes as received.
    pub reply: Vec<u8>,
    /// Variant the reply was framed in.
    pub version: ProtocolVersion,
}

/// Result of a successful query.
#[derive(Clone, Debug)]
pub struct QueryResult {
    /// Label of the server that answered.
    pub server: String,
    /// Endpoint that answered.
    pub peer: SocketAddr,
    /// Raw `MIDP`.
    pub midpoint: u64,
    /// `RADI` in microseconds.
    pub radius: u64,
    /// Raw `MINT` of the delegation.
    pub mint: u64,
    /// Raw `MAXT` of the delegation.
    pub maxt: u64,
    /// Levels in the Merkle audit path.
    pub path_len: usize,
    /// `DTAI`, if sent.
    pub dtai: Option<u64>,
    /// `LEAP` day numbers, if sent.
    pub leap: Option<Vec<u32>>,
    /// Local wall-clock time when the request went out.
    pub sent_at: SystemTime,
    /// Round-trip time.
    pub rtt: Duration,
}

impl QueryResult {
    /// Midpoint as fractional Unix seconds.
    pub fn midpoint_seconds(&self) -> Option<f64> {
        timestamp::to_unix_seconds(self.midpoint)
    }

    /// Radius in fractional seconds.
    pub fn radius_seconds(&self) -> f64 {
        self.radius as f64 / 1e6
    }

    /// Midpoint as a UTC timestamp.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.midpoint)
    }

    /// Start of the delegation's validity window.
    pub fn mint_datetime(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.mint)
    }

    /// End of the delegation's validity window.
    pub fn maxt_datetime(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.maxt)
    }
}

fn to_datetime(value: u64) -> Option<DateTime<Utc>> {
    timestamp::to_unix_micros(value).and_then(DateTime::from_timestamp_micros)
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.6f UTC"))?,
            None => write!(f, "unknown time")?,
        }
        if self.radius < RADIUS_MS_DISPLAY_LIMIT {
            write!(f, " (+/- {:.3} ms)", self.radius as f64 / 1e3)
        } else {
            write!(f, " (+/- {:.3} s)", self.radius_seconds())
        }
    }
}

/// Roughtime client owning the reply history.
pub struct RoughtimeClient {
    config: ClientConfig,
    history: VecDeque<HistoryEntry>,
    verifier: Box<dyn SignatureVerifier + Send>,
}

impl fmt::Debug for RoughtimeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoughtimeClient")
            .field("config", &self.config)
            .field("history_len", &self.history.len())
            .finish()
    }
}

impl Default for RoughtimeClient {
    fn default() -> Self {
        RoughtimeClient::new()
    }
}

impl RoughtimeClient {
    /// Client with default settings.
    pub fn new() -> Self {
        RoughtimeClient::with_config(ClientConfig::default())
    }

    /// Client with explicit settings.
    pub fn with_config(config: ClientConfig) -> Self {
        RoughtimeClient {
            config,
            history: VecDeque::new(),
            verifier: Box::new(Ed25519Verifier),
        }
    }

    /// Replace the signature verifier.
    pub fn with_verifier(mut self, verifier: impl SignatureVerifier + Send + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    /// Current settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Verified replies, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// Query `server` over the transport its descriptor names.
    pub fn query(&mut self, server: &ServerDescriptor) -> Result<QueryResult, VakError> {
        match server.transport {
            TransportProtocol::Udp => self.query_with(server, &UdpTransport),
            TransportProtocol::Tcp => self.query_with(server, &TcpTransport::new(server.version)),
        }
    }

    /// Query `server` over `transport`.
    ///
    /// Nothing is retried: any transport, format or verification failure is
    /// returned and the history is left untouched.
    pub fn query_with(
        &mut self,
        server: &ServerDescriptor,
        transport: &dyn Transport,
    ) -> Result<QueryResult, VakError> {
        let version = server.version;
        let mut blind = [0u8; BLIND_LEN];
        rand::rng().fill_bytes(&mut blind);

        let previous = self.history.back().map(|e| e.reply.as_slice());
        let pad = server.transport == TransportProtocol::Udp;
        let request = Request::chained(version, previous, &blind, pad)?;
        let request_bytes = request.to_bytes();

        let endpoints = resolve(server)?;
        debug!(
            "roughtime: querying {} ({} variant, {} endpoints)",
            server.label(),
            version,
            endpoints.len()
        );
        let exchange = transport.send_and_receive(
            &request_bytes,
            &endpoints,
            self.config.attempt_timeout,
            self.config.query_timeout,
        )?;

        let verified = verify_reply_bytes(
            &exchange.reply,
            request.nonce(),
            &server.public_key,
            version,
            self.verifier.as_ref(),
        )
        .map_err(|e| {
            if e.is_verification() {
                warn!("roughtime: reply from {} failed verification: {}", server.label(), e);
            } else {
                debug!("roughtime: malformed reply from {}: {}", server.label(), e);
            }
            VakError::from(e)
        })?;

        self.push_history(HistoryEntry {
            nonce: request.nonce().to_vec(),
            blind,
            reply: exchange.reply,
            version,
        });

        Ok(QueryResult {
            server: server.label(),
            peer: exchange.peer,
            midpoint: verified.midpoint,
            radius: verified.radius,
            mint: verified.mint,
            maxt: verified.maxt,
            path_len: verified.path_len,
            dtai: verified.dtai,
            leap: verified.leap,
            sent_at: exchange.sent_at,
            rtt: exchange.rtt,
        })
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_back(entry);
        while self.history.len() > self.config.max_history {
            self.history.pop_front();
        }
    }

    /// Find causality violations in the history.
    ///
    /// Returns every `(i, k)` with `i < k` where reply `i`'s earliest possible
    /// time is after reply `k`'s latest possible time. Since reply `k` was
    /// requested with a nonce chained onto reply `i`, such a pair proves one
    /// of the two servers wrong.
    pub fn verify_replies(&self) -> Vec<(usize, usize)> {
        let bounds: Vec<Option<(i128, i128)>> = self.history.iter().map(reply_bounds).collect();

        let mut invalid = Vec::new();
        for (i, earlier) in bounds.iter().enumerate() {
            let Some((earliest_i, _)) = earlier else {
                continue;
            };
            for (k, later) in bounds.iter().enumerate().skip(i + 1) {
                if let Some((_, latest_k)) = later {
                    if earliest_i > latest_k {
                        invalid.push((i, k));
                    }
                }
            }
        }
        invalid
    }
}

/// `(midpoint - radius, midpoint + radius)` in Unix microseconds.
fn reply_bounds(entry: &HistoryEntry) -> Option<(i128, i128)> {
    let packet = Packet::from_bytes(&entry.reply, entry.version.uses_envelope()).ok()?;
    let (midpoint, radius) = midpoint_and_radius(&packet).ok()?;
    let midpoint = i128::from(timestamp::to_unix_micros(midpoint)?);
    let radius = i128::from(radius);
    Some((midpoint - radius, midpoint + radius))
}
