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

//! Transaction-id computation (§4.1): folds a peer address and a message token
//! into a single 16-bit key used to correlate retransmissions and responses
//! with their originating request, independent of message id.

use super::addr::PeerAddress;
use super::message::Token;

/// A folded 16-bit transaction identifier.
pub type TransactionId = u16;

/// Mixes one byte into a running FNV-1a style accumulator.
fn mix(acc: u32, byte: u8) -> u32 {
    (acc ^ byte as u32).wrapping_mul(16_777_619)
}

/// Folds a 32-bit accumulator down into 16 bits by XORing its halves (§4.1).
fn fold16(acc: u32) -> u16 {
    ((acc >> 16) ^ (acc & 0xFFFF)) as u16
}

/// Computes the transaction id for a peer address and token, per §4.1: the address
/// bytes are hashed first, then the token bytes, and the accumulator is folded to
/// 16 bits. The exact internal mixing function is not wire-visible and is free to
/// differ from any reference implementation as long as it is a pure function of
/// `(peer, token)`.
pub fn transaction_id(peer: &PeerAddress, token: &Token) -> TransactionId {
    let mut bytes = Vec::with_capacity(24);
    peer.hash_bytes(&mut bytes);

    let mut acc: u32 = 0x811C_9DC5;
    for &b in &bytes {
        acc = mix(acc, b);
    }
    for &b in token.as_bytes() {
        acc = mix(acc, b);
    }

    fold16(acc)
}
