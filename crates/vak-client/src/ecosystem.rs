// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Loading server lists in the `ecosystem.json` format.
//!
//! ```json
//! {
//!   "servers": [
//!     {
//!       "name": "Cloudflare-Roughtime-2",
//!       "publicKeyType": "ed25519",
//!       "publicKey": "0GD7c3yP8xEc4Zl2zeuN2SlLvDVVocjsPSL8/Rl/7zg=",
//!       "newver": true,
//!       "addresses": [{ "protocol": "udp", "address": "roughtime.cloudflare.com:2003" }]
//!     }
//!   ]
//! }
//! ```
//!
//! Only the first address of each entry is used. `newver` selects the IETF
//! framing and defaults to `false`.

use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use vak_proto::ProtocolVersion;

use crate::error::{ConfigError, VakError};
use crate::server::{ServerDescriptor, TransportProtocol, decode_public_key};

const ED25519: &str = "ed25519";

#[derive(Debug, Deserialize)]
struct EcosystemFile {
    servers: Vec<EcosystemEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EcosystemEntry {
    #[serde(default)]
    name: Option<String>,
    public_key_type: String,
    public_key: String,
    addresses: Vec<EcosystemAddress>,
    #[serde(default)]
    newver: bool,
}

#[derive(Debug, Deserialize)]
struct EcosystemAddress {
    protocol: String,
    address: String,
}

/// Parse a server list from JSON text.
pub fn parse_ecosystem(json: &str) -> Result<Vec<ServerDescriptor>, ConfigError> {
    let file: EcosystemFile =
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidServerList {
            detail: e.to_string(),
        })?;
    file.servers.into_iter().map(entry_to_descriptor).collect()
}

/// Read and parse a server list file.
pub fn load_ecosystem(path: impl AsRef<Path>) -> Result<Vec<ServerDescriptor>, VakError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let servers = parse_ecosystem(&text)?;
    debug!("ecosystem: loaded {} servers from {}", servers.len(), path.display());
    Ok(servers)
}

fn entry_to_descriptor(entry: EcosystemEntry) -> Result<ServerDescriptor, ConfigError> {
    if !entry.public_key_type.eq_ignore_ascii_case(ED25519) {
        return Err(ConfigError::UnsupportedKeyType {
            key_type: entry.public_key_type,
        });
    }
    let first = entry
        .addresses
        .first()
        .ok_or_else(|| ConfigError::NoAddresses {
            address: entry.name.clone().unwrap_or_default(),
        })?;
    let transport: TransportProtocol = first.protocol.parse()?;
    let (host, port) = split_host_port(&first.address)?;

    let mut server = ServerDescriptor::new(host, port, decode_public_key(&entry.public_key)?)
        .transport(transport)
        .version(ProtocolVersion::from_newver(entry.newver));
    server.name = entry.name;
    Ok(server)
}

/// Split `host:port`, accepting `[v6]:port`.
fn split_host_port(address: &str) -> Result<(String, u16), ConfigError> {
    let invalid = || ConfigError::InvalidServerList {
        detail: format!("address must be host:port, got {address:?}"),
    };
    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}
