// Copyright 2019 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The peer address tagged union (§3, §9).

use std::net::{Ipv6Addr, SocketAddrV4};

/// A constrained-stack link-layer address: a short hardware address plus a port,
/// used by the non-IP transport profile mentioned in §3.
#[derive(Debug, Copy, Eq, PartialEq, Hash, Clone)]
pub struct LinkLayerAddr {
    /// Raw link-layer address bytes (e.g. an IEEE 802.15.4 short or extended address).
    pub addr: [u8; 8],
    /// Length, in bytes, of the address actually populated in `addr`.
    pub len: u8,
}

impl LinkLayerAddr {
    /// Returns the populated address bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.addr[..self.len as usize]
    }
}

/// A discriminated remote peer address (§3, §9). Equality and hashing differ per
/// variant:
/// - `V4`: the entire sockaddr (address and port) is compared.
/// - `V6` / `LinkLayer`: only `(address, port)` is compared.
#[derive(Debug, Copy, Clone)]
pub enum PeerAddress {
    /// An IPv4 socket address.
    V4(SocketAddrV4),

    /// An IPv6 address and port, compared without regard to flow info or scope id.
    V6 {
        /// The IPv6 address.
        addr: Ipv6Addr,
        /// The UDP port.
        port: u16,
    },

    /// A link-layer address and port, for the constrained-stack transport profile.
    LinkLayer {
        /// The link-layer address.
        addr: LinkLayerAddr,
        /// The logical port (profile-defined; often unused but kept for symmetry).
        port: u16,
    },
}

impl PeerAddress {
    /// Returns the bytes this address contributes to the transaction-id hash (§4.1):
    /// for IPv4 the full sockaddr bytes; for IPv6 and link-layer, port followed by
    /// address bytes.
    pub fn hash_bytes(&self, out: &mut Vec<u8>) {
        match self {
            PeerAddress::V4(sock) => {
                out.extend_from_slice(&sock.ip().octets());
                out.extend_from_slice(&sock.port().to_be_bytes());
            }
            PeerAddress::V6 { addr, port } => {
                out.extend_from_slice(&port.to_be_bytes());
                out.extend_from_slice(&addr.octets());
            }
            PeerAddress::LinkLayer { addr, port } => {
                out.extend_from_slice(&port.to_be_bytes());
                out.extend_from_slice(addr.as_bytes());
            }
        }
    }
}

impl PartialEq for PeerAddress {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PeerAddress::V4(a), PeerAddress::V4(b)) => a == b,
            (PeerAddress::V6 { addr: a, port: ap }, PeerAddress::V6 { addr: b, port: bp }) => {
                a == b && ap == bp
            }
            (
                PeerAddress::LinkLayer { addr: a, port: ap },
                PeerAddress::LinkLayer { addr: b, port: bp },
            ) => a == b && ap == bp,
            _ => false,
        }
    }
}

impl Eq for PeerAddress {}
