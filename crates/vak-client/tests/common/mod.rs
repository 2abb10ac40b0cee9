// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests: a signing Roughtime server that can
//! answer through a mock transport or on a loopback socket.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but clippy flags them as unreachable outside the crate.
#![allow(dead_code, unreachable_pub)]

use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use vak_client::error::VakError;
use vak_client::transport::{Exchange, Transport};
use vak_client::{ServerDescriptor, TransportProtocol};
use vak_proto::signature::{CERTIFICATE_CONTEXT, RESPONSE_CONTEXT, signed_message};
use vak_proto::{Packet, ProtocolVersion, Tag, merkle, tag};

pub fn keypair() -> Ed25519KeyPair {
    let rng = SystemRandom::new();
    let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
    Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap()
}

/// What the server puts into the signed parts of its reply.
#[derive(Clone, Debug)]
pub struct ReplyParams {
    pub midpoint: u64,
    pub radius: u32,
    pub dtai: Option<u32>,
    pub leap: Option<Vec<u32>>,
    /// Echo the request nonce when the variant expects it.
    pub echo_nonce: bool,
}

impl Default for ReplyParams {
    fn default() -> ReplyParams {
        ReplyParams {
            midpoint: 1_700_000_000_000_000,
            radius: 1_000_000,
            dtai: None,
            leap: None,
            echo_nonce: true,
        }
    }
}

impl ReplyParams {
    /// Midpoint at `secs` Unix seconds with a radius of `radius_ms`.
    pub fn at(secs: f64, radius_ms: u32) -> ReplyParams {
        ReplyParams {
            midpoint: (secs * 1e6) as u64,
            radius: radius_ms * 1000,
            ..ReplyParams::default()
        }
    }
}

/// Signs single-request replies.
pub struct TestServer {
    pub version: ProtocolVersion,
    long_term: Ed25519KeyPair,
    delegated: Ed25519KeyPair,
}

impl TestServer {
    pub fn new(version: ProtocolVersion) -> TestServer {
        TestServer {
            version,
            long_term: keypair(),
            delegated: keypair(),
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.long_term.public_key().as_ref().try_into().unwrap()
    }

    /// Descriptor pointing at `addr` with this server's key and variant.
    pub fn descriptor(&self, addr: SocketAddr, transport: TransportProtocol) -> ServerDescriptor {
        ServerDescriptor::new(addr.ip().to_string(), addr.port(), self.public_key())
            .transport(transport)
            .version(self.version)
    }

    /// The nonce carried by a request.
    pub fn request_nonce(&self, request: &[u8]) -> Vec<u8> {
        let packet = Packet::from_bytes(request, self.version.uses_envelope()).unwrap();
        packet.bytes(&tag::NONC).unwrap().to_vec()
    }

    /// Signed reply bytes for `nonce`.
    pub fn reply(&self, nonce: &[u8], params: &ReplyParams) -> Vec<u8> {
        let node = self.version.node_size();

        let mut srep = Packet::from_tags([
            Tag::new(tag::ROOT, merkle::leaf_hash(nonce, node)).unwrap(),
            Tag::from_u64(tag::MIDP, params.midpoint),
            Tag::from_u32(tag::RADI, params.radius),
        ])
        .unwrap();
        if let Some(dtai) = params.dtai {
            srep.add(Tag::from_u32(tag::DTAI, dtai)).unwrap();
        }
        if let Some(leap) = &params.leap {
            let bytes = leap.iter().flat_map(|l| l.to_le_bytes()).collect();
            srep.add(Tag::new(tag::LEAP, bytes).unwrap()).unwrap();
        }
        let sig = self
            .delegated
            .sign(&signed_message(RESPONSE_CONTEXT, &srep.encode()));

        let dele = Packet::from_tags([
            Tag::new(tag::PUBK, self.delegated.public_key().as_ref().to_vec()).unwrap(),
            Tag::from_u64(tag::MINT, 0),
            Tag::from_u64(tag::MAXT, u64::MAX - 1),
        ])
        .unwrap();
        let cert_sig = self
            .long_term
            .sign(&signed_message(CERTIFICATE_CONTEXT, &dele.encode()));
        let cert = Packet::from_tags([
            Tag::new(tag::SIG, cert_sig.as_ref().to_vec()).unwrap(),
            Tag::nested(tag::DELE, dele),
        ])
        .unwrap();

        let mut reply = Packet::from_tags([
            Tag::new(tag::SIG, sig.as_ref().to_vec()).unwrap(),
            Tag::nested(tag::SREP, srep),
            Tag::nested(tag::CERT, cert),
            Tag::from_u32(tag::INDX, 0),
            Tag::new(tag::PATH, Vec::new()).unwrap(),
        ])
        .unwrap();
        if self.version.echoes_nonce() && params.echo_nonce {
            reply.add(Tag::new(tag::NONC, nonce.to_vec()).unwrap()).unwrap();
        }
        reply.to_bytes(self.version.uses_envelope())
    }

    /// Signed reply to raw request bytes.
    pub fn answer(&self, request: &[u8], params: &ReplyParams) -> Vec<u8> {
        self.reply(&self.request_nonce(request), params)
    }
}

/// Answers in-process, without sockets.
pub struct MockTransport {
    pub server: TestServer,
    pub params: ReplyParams,
    pub rtt: Duration,
    /// Every request seen, in order.
    pub requests: RefCell<Vec<Vec<u8>>>,
    /// Rewrites the reply before it is returned.
    pub tamper: Option<fn(&mut Vec<u8>)>,
}

impl MockTransport {
    pub fn new(server: TestServer, params: ReplyParams) -> MockTransport {
        MockTransport {
            server,
            params,
            rtt: Duration::from_millis(20),
            requests: RefCell::new(Vec::new()),
            tamper: None,
        }
    }

    pub fn descriptor(&self) -> ServerDescriptor {
        self.server
            .descriptor("127.0.0.1:2002".parse().unwrap(), TransportProtocol::Udp)
    }
}

impl Transport for MockTransport {
    fn send_and_receive(
        &self,
        request: &[u8],
        endpoints: &[SocketAddr],
        _per_attempt_timeout: Duration,
        _overall_timeout: Duration,
    ) -> Result<Exchange, VakError> {
        self.requests.borrow_mut().push(request.to_vec());
        let mut reply = self.server.answer(request, &self.params);
        if let Some(tamper) = self.tamper {
            tamper(&mut reply);
        }
        Ok(Exchange {
            reply,
            sent_at: SystemTime::now(),
            rtt: self.rtt,
            peer: endpoints[0],
        })
    }
}

/// Serve one UDP request on loopback.
pub fn spawn_udp_server(server: TestServer, params: ReplyParams) -> (SocketAddr, JoinHandle<TestServer>) {
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = sock.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut buf = [0u8; 2048];
        let (n, src) = sock.recv_from(&mut buf).unwrap();
        let reply = server.answer(&buf[..n], &params);
        sock.send_to(&reply, src).unwrap();
        server
    });
    (addr, handle)
}

/// Serve one TCP request on loopback.
///
/// Legacy requests are read until the client's fixed-size request is
/// complete; the connection is then closed after the reply.
pub fn spawn_tcp_server(server: TestServer, params: ReplyParams) -> (SocketAddr, JoinHandle<TestServer>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let request = read_request(&mut conn, server.version);
        let reply = server.answer(&request, &params);
        conn.write_all(&reply).unwrap();
        server
    });
    (addr, handle)
}

fn read_request(conn: &mut impl Read, version: ProtocolVersion) -> Vec<u8> {
    if version.uses_envelope() {
        let mut header = [0u8; 12];
        conn.read_exact(&mut header).unwrap();
        let len = u32::from_le_bytes(header[8..12].try_into().unwrap()) as usize;
        let mut request = header.to_vec();
        request.resize(12 + len, 0);
        conn.read_exact(&mut request[12..]).unwrap();
        request
    } else {
        // Unpadded legacy request: one NONC tag, 4 + 4 + 64 bytes.
        let mut request = vec![0u8; 8 + version.nonce_len()];
        conn.read_exact(&mut request).unwrap();
        request
    }
}
