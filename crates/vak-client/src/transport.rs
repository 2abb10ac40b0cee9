// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Moving request bytes to a server and reply bytes back.
//!
//! A [`Transport`] knows nothing about the packet format beyond what it needs
//! to frame a stream. The client picks [`UdpTransport`] or [`TcpTransport`]
//! from the server descriptor; tests substitute their own.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant, SystemTime};

use log::debug;
use vak_proto::ProtocolVersion;
use vak_proto::packet::{ENVELOPE_HEADER_LEN, ENVELOPE_MAGIC};

use crate::error::{ConfigError, TimeoutError, VakError};
use crate::server::ServerDescriptor;

/// Default time to wait on one endpoint before polling the deadline again.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(100);

/// Default deadline for a whole query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest UDP payload, so no datagram is truncated on receipt.
const RECV_BUF_SIZE: usize = 65_535;

/// Largest stream reply body accepted.
const MAX_STREAM_REPLY: usize = 64 * 1024;

/// Reply bytes plus the timing needed to turn them into an offset.
#[derive(Clone, Debug)]
pub struct Exchange {
    /// Raw reply, including the envelope when the variant uses one.
    pub reply: Vec<u8>,
    /// Wall-clock time immediately before the request was sent.
    pub sent_at: SystemTime,
    /// Time from send to receipt of the reply.
    pub rtt: Duration,
    /// Endpoint that answered.
    pub peer: SocketAddr,
}

/// Sends one request and waits for its reply.
pub trait Transport {
    /// Try `endpoints` in order until one answers.
    ///
    /// Must fail with [`TimeoutError`] when nothing usable arrives within
    /// `overall_timeout`.
    fn send_and_receive(
        &self,
        request: &[u8],
        endpoints: &[SocketAddr],
        per_attempt_timeout: Duration,
        overall_timeout: Duration,
    ) -> Result<Exchange, VakError>;
}

/// Resolve a server to socket addresses, IPv6 first.
pub fn resolve(server: &ServerDescriptor) -> Result<Vec<SocketAddr>, VakError> {
    let addrs: Vec<SocketAddr> = (server.address.as_str(), server.port)
        .to_socket_addrs()?
        .collect();
    let addrs = prefer_addresses(addrs);
    if addrs.is_empty() {
        return Err(ConfigError::NoAddresses {
            address: format!("{}:{}", server.address, server.port),
        }
        .into());
    }
    Ok(addrs)
}

/// Wildcard local address of the same family as `target`.
pub(crate) fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}

/// Order resolved addresses IPv6 first, keeping the resolver's order within
/// each family.
pub(crate) fn prefer_addresses(addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    let (mut v6, v4): (Vec<SocketAddr>, Vec<SocketAddr>) =
        addrs.into_iter().partition(|a| a.is_ipv6());
    v6.extend(v4);
    v6
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Share of the remaining budget for the endpoint at `position`.
fn endpoint_budget(deadline: Instant, position: usize, total: usize) -> Duration {
    let remaining = deadline.saturating_duration_since(Instant::now());
    let left = (total - position).max(1) as u32;
    remaining / left
}

/// One datagram each way.
#[derive(Clone, Copy, Debug, Default)]
pub struct UdpTransport;

impl UdpTransport {
    fn attempt(
        &self,
        request: &[u8],
        target: SocketAddr,
        per_attempt_timeout: Duration,
        attempt_deadline: Instant,
    ) -> Result<Option<Exchange>, VakError> {
        let sock = UdpSocket::bind(bind_addr_for(&target))?;

        let sent_at = SystemTime::now();
        let start = Instant::now();
        let sz = match sock.send_to(request, target) {
            Ok(sz) => sz,
            Err(e) => {
                debug!("roughtime: send to {:?} failed: {}", target, e);
                return Ok(None);
            }
        };
        debug!("roughtime: sent {} bytes to {:?}", sz, target);

        let mut recv_buf = vec![0u8; RECV_BUF_SIZE];
        loop {
            // Foreign datagrams must not extend the wait past the deadline.
            let remaining = attempt_deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            sock.set_read_timeout(Some(per_attempt_timeout.min(remaining)))?;

            match sock.recv_from(&mut recv_buf) {
                Ok((recv_len, src_addr)) => {
                    if src_addr != target {
                        debug!(
                            "roughtime: discarding {} bytes from unexpected source {:?}",
                            recv_len, src_addr
                        );
                        continue;
                    }
                    let rtt = start.elapsed();
                    debug!("roughtime: recv {} bytes from {:?} after {:?}", recv_len, src_addr, rtt);
                    return Ok(Some(Exchange {
                        reply: recv_buf[..recv_len].to_vec(),
                        sent_at,
                        rtt,
                        peer: target,
                    }));
                }
                Err(e) if is_timeout(&e) => continue,
                Err(e) => {
                    debug!("roughtime: recv from {:?} failed: {}", target, e);
                    return Ok(None);
                }
            }
        }
    }
}

impl Transport for UdpTransport {
    fn send_and_receive(
        &self,
        request: &[u8],
        endpoints: &[SocketAddr],
        per_attempt_timeout: Duration,
        overall_timeout: Duration,
    ) -> Result<Exchange, VakError> {
        let deadline = Instant::now() + overall_timeout;
        for (i, &target) in endpoints.iter().enumerate() {
            let budget = endpoint_budget(deadline, i, endpoints.len());
            if budget.is_zero() {
                break;
            }
            let attempt_deadline = Instant::now() + budget;
            let poll = per_attempt_timeout.min(budget);
            if let Some(exchange) = self.attempt(request, target, poll, attempt_deadline)? {
                return Ok(exchange);
            }
        }
        Err(TimeoutError::Query.into())
    }
}

/// A stream connection per query.
///
/// IETF replies are framed by the envelope length; legacy replies run until
/// the server closes the connection.
///
/// There is no per-attempt split: the connect is bounded by the endpoint's
/// share of the overall deadline and the read by whatever remains of it, so
/// `per_attempt_timeout` is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpTransport {
    version: ProtocolVersion,
}

impl TcpTransport {
    /// Transport reading replies framed for `version`.
    pub fn new(version: ProtocolVersion) -> Self {
        TcpTransport { version }
    }

    fn read_reply(&self, stream: &mut TcpStream) -> io::Result<Vec<u8>> {
        if !self.version.uses_envelope() {
            let mut reply = Vec::new();
            stream
                .take(MAX_STREAM_REPLY as u64 + 1)
                .read_to_end(&mut reply)?;
            if reply.len() > MAX_STREAM_REPLY {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "reply too large"));
            }
            return Ok(reply);
        }

        let mut header = [0u8; ENVELOPE_HEADER_LEN];
        stream.read_exact(&mut header)?;
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&header[..8]);
        if u64::from_le_bytes(magic) != ENVELOPE_MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid envelope magic"));
        }
        let mut len = [0u8; 4];
        len.copy_from_slice(&header[8..]);
        let body_len = u32::from_le_bytes(len) as usize;
        if body_len > MAX_STREAM_REPLY {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "reply too large"));
        }
        let mut reply = Vec::with_capacity(ENVELOPE_HEADER_LEN + body_len);
        reply.extend_from_slice(&header);
        reply.resize(ENVELOPE_HEADER_LEN + body_len, 0);
        stream.read_exact(&mut reply[ENVELOPE_HEADER_LEN..])?;
        Ok(reply)
    }
}

impl Transport for TcpTransport {
    fn send_and_receive(
        &self,
        request: &[u8],
        endpoints: &[SocketAddr],
        _per_attempt_timeout: Duration,
        overall_timeout: Duration,
    ) -> Result<Exchange, VakError> {
        let deadline = Instant::now() + overall_timeout;
        let mut last_err: Option<VakError> = None;

        for (i, &target) in endpoints.iter().enumerate() {
            let budget = endpoint_budget(deadline, i, endpoints.len());
            if budget.is_zero() {
                break;
            }
            let sent_at = SystemTime::now();
            let start = Instant::now();
            let mut stream = match TcpStream::connect_timeout(&target, budget) {
                Ok(s) => s,
                Err(e) => {
                    debug!("roughtime: connect to {:?} failed: {}", target, e);
                    last_err = Some(if is_timeout(&e) {
                        TimeoutError::Query.into()
                    } else {
                        e.into()
                    });
                    continue;
                }
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            stream.set_read_timeout(Some(remaining))?;
            stream.set_write_timeout(Some(remaining))?;

            stream.write_all(request)?;
            debug!("roughtime: sent {} bytes to {:?}", request.len(), target);

            let reply = match self.read_reply(&mut stream) {
                Ok(r) => r,
                Err(e) if is_timeout(&e) => return Err(TimeoutError::Read.into()),
                Err(e) => return Err(e.into()),
            };
            let rtt = start.elapsed();
            debug!("roughtime: recv {} bytes from {:?} after {:?}", reply.len(), target, rtt);
            return Ok(Exchange {
                reply,
                sent_at,
                rtt,
                peer: target,
            });
        }

        Err(last_err.unwrap_or(VakError::Timeout(TimeoutError::Query)))
    }
}
