// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

#![no_main]
use libfuzzer_sys::fuzz_target;
use vak_proto::Packet;
use vak_proto::tag;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode or fail cleanly, with or without an envelope.
    let _ = Packet::from_bytes(data, true);
    if let Ok(packet) = Packet::decode(data) {
        let _ = packet.require_packet(&tag::SREP);
        let _ = packet.bytes(&tag::SIG);
        // A decoded packet re-encodes to something that decodes to itself.
        let again = Packet::decode(&packet.encode()).expect("re-encoding must decode");
        assert_eq!(packet, again);
    }
});
