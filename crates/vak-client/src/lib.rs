// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Roughtime client with reply chaining and Byzantine-tolerant interval overlap.

Queries servers for authenticated coarse time, keeps the chain of replies so
misbehaving servers can be caught after the fact, and combines many replies
into one clock adjustment that a minority of lying servers cannot move.

# Example
Load the public server list, query until ten servers and a majority agree,
and print the adjustment.

```rust,no_run
use vak_client::ecosystem::load_ecosystem;
use vak_client::resolver::{Resolver, ResolverConfig};
use vak_client::RoughtimeClient;

fn main() -> Result<(), vak_client::error::VakError> {
    let servers = load_ecosystem("ecosystem.json")?;
    let mut client = RoughtimeClient::new();
    let mut resolver = Resolver::new(ResolverConfig::default());
    match resolver.run(&mut client, &servers) {
        Some(res) => println!("adjust clock by {:+.6} s (+/- {:.6} s)", res.adjustment, res.uncertainty),
        None => println!("servers did not agree"),
    }
    for (i, k) in client.verify_replies() {
        println!("reply {k} claims a time before reply {i}");
    }
    Ok(())
}
```
*/

#![warn(missing_docs)]

pub use vak_proto::ProtocolVersion;

/// Reply history, queries and the causality audit.
pub mod client;

/// Loading `ecosystem.json` server lists.
pub mod ecosystem;

/// Error types for the Roughtime client.
pub mod error;

/// Interval overlap engines.
pub mod overlap;

/// Measurements and the resolving loop.
pub mod resolver;

/// Server descriptors.
pub mod server;

/// UDP and TCP transports.
pub mod transport;

pub use client::{ClientConfig, HistoryEntry, QueryResult, RoughtimeClient};
pub use server::{ServerDescriptor, TransportProtocol};
