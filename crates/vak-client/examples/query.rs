// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Query one Roughtime server for authenticated coarse time.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example query
//! cargo run --example query -- roughtime.int08h.com 2002 AW5uAoTSTDfG5NfY1bTh08GUnOqlRb+HVhbJ3ODJvsE= legacy
//! ```

use vak_client::{ProtocolVersion, RoughtimeClient, ServerDescriptor};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let host = args.first().map_or("roughtime.cloudflare.com", String::as_str);
    let port: u16 = args.get(1).and_then(|p| p.parse().ok()).unwrap_or(2003);
    let key = args
        .get(2)
        .map_or("0GD7c3yP8xEc4Zl2zeuN2SlLvDVVocjsPSL8/Rl/7zg=", String::as_str);
    let version = match args.get(3).map(String::as_str) {
        Some("legacy") => ProtocolVersion::Legacy,
        _ => ProtocolVersion::Ietf,
    };

    let server = ServerDescriptor::with_base64_key(host, port, key)
        .expect("invalid public key")
        .version(version);

    println!("Querying Roughtime server: {}", server.label());

    let mut client = RoughtimeClient::new();
    match client.query(&server) {
        Ok(result) => {
            println!("Time:      {result}");
            println!("Midpoint:  {:?} seconds since Unix epoch", result.midpoint_seconds());
            println!("RTT:       {:?}", result.rtt);
            println!("Path:      {} levels", result.path_len);
            if let (Some(mint), Some(maxt)) = (result.mint_datetime(), result.maxt_datetime()) {
                println!("Delegated: {mint} .. {maxt}");
            }
            if let Some(dtai) = result.dtai {
                println!("DTAI:      {dtai}");
            }
        }
        Err(e) => {
            eprintln!("Roughtime request failed: {e}");
            std::process::exit(1);
        }
    }
}
