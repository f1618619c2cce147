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

//! Module defining various CoAP-related constants.

/// The standard default IP port number used for CoAP-over-UDP.
pub const DEFAULT_PORT_COAP_UDP: u16 = 5683;

/// Maximum size, in bytes, of a single CoAP PDU this engine will read or build.
pub const MAX_PDU_SIZE: usize = 1152;

/// Number of ticks per second used by the default clock. The tick unit is milliseconds.
pub const TICKS_PER_SECOND: u64 = 1000;

/// Base ACK timeout, in ticks, before the first retransmission of a confirmable message.
pub const RESPONSE_TIMEOUT_TICKS: u64 = 2 * TICKS_PER_SECOND;

/// Maximum number of retransmissions attempted for a confirmable message.
pub const MAX_RETRANSMIT: u8 = 4;

/// Default well-known resource-discovery path.
pub const DEFAULT_WELLKNOWN_URI: &str = ".well-known/core";

/// Sentinel value for an invalid/absent transaction id.
pub const INVALID_TRANSACTION_ID: u16 = 0;
