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

//! The host-provided callback surface (§6): a response handler invoked for
//! incoming responses, and the per-resource method handlers registered through
//! [`crate::resource::ResourceRegistry`].

use crate::addr::PeerAddress;
use crate::message::Pdu;
use crate::txid::TransactionId;

/// Invoked by the dispatcher when a response (message code ≥ 64) is received and
/// matched against an outstanding request (§4.6, §6). `sent` is the original
/// request PDU if it was still tracked in the send queue (absent for a
/// late/duplicate response whose node was already retired).
///
/// Neither PDU may be retained past the call — both are freed by the dispatcher
/// immediately afterward.
pub type ResponseHandler = fn(remote: PeerAddress, sent: Option<&Pdu>, received: &Pdu, tid: TransactionId);

/// A [`ResponseHandler`] that does nothing, for hosts that only serve requests
/// and never issue their own.
pub fn ignore_response(_remote: PeerAddress, _sent: Option<&Pdu>, _received: &Pdu, _tid: TransactionId) {}
