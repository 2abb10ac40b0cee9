// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Query every server in an `ecosystem.json` list until a majority agrees,
//! then print the clock adjustment and audit the reply chain.
//!
//! # Usage
//!
//! ```sh
//! RUST_LOG=info cargo run --example resolve -- ecosystem.json 3
//! ```
//!
//! The second argument is the quorum (default 10).

use vak_client::RoughtimeClient;
use vak_client::ecosystem::load_ecosystem;
use vak_client::overlap::CrossCheck;
use vak_client::resolver::{Resolver, ResolverConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = args.first().map_or("ecosystem.json", String::as_str);
    let mut config = ResolverConfig::default();
    if let Some(quorum) = args.get(1).and_then(|q| q.parse().ok()) {
        config.quorum = quorum;
    }

    let servers = match load_ecosystem(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot load {path}: {e}");
            std::process::exit(1);
        }
    };
    println!("Loaded {} servers from {path}", servers.len());

    let mut client = RoughtimeClient::new();
    let mut resolver = Resolver::with_engine(config, CrossCheck::new());

    match resolver.run(&mut client, &servers) {
        Some(res) => println!("success: {res}"),
        None => println!(
            "no agreement after {} replies from {} servers",
            resolver.responses(),
            servers.len()
        ),
    }

    for (i, k) in client.verify_replies() {
        println!("causality violation: reply {k} predates reply {i}");
    }
}
