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

//! Drains the receive queue, one node at a time, routing requests and
//! matching responses against the send queue (§4.6).

use crate::addr::PeerAddress;
use crate::callbacks::ResponseHandler;
use crate::clock::Clock;
use crate::critical::{check_critical, KnownOptionsBitmap};
use crate::message::{MsgCode, MsgType, Pdu, COAP_VERSION};
use crate::queue::{Queue, QueueNode};
use crate::resource::ResourceRegistry;
use crate::response::new_error_response;
use crate::retransmit::send;
use crate::router::route_request;
use crate::socket::RawSocket;
use crate::txid::TransactionId;
use log::{trace, warn};

/// Pops and dispatches every node currently in `receive_queue` (§4.6). New
/// nodes filed by a handler's own reads are not visited in the same pass —
/// only the nodes present when `dispatch` was called.
pub fn dispatch(
    socket: &impl RawSocket,
    clock: &impl Clock,
    send_queue: &mut Queue,
    receive_queue: &mut Queue,
    known_options: &KnownOptionsBitmap,
    registry: &ResourceRegistry,
    response_handler: ResponseHandler,
) {
    while let Some(node) = receive_queue.pop_front() {
        dispatch_one(socket, clock, send_queue, known_options, registry, response_handler, node);
    }
}

fn dispatch_one(
    socket: &impl RawSocket,
    _clock: &impl Clock,
    send_queue: &mut Queue,
    known_options: &KnownOptionsBitmap,
    registry: &ResourceRegistry,
    response_handler: ResponseHandler,
    rcvd: Box<QueueNode>,
) {
    if rcvd.pdu.header().version != COAP_VERSION {
        trace!("dispatch: dropping PDU with unsupported version");
        return;
    }

    let peer = rcvd.peer;
    let tid = rcvd.tid;

    match rcvd.pdu.msg_type() {
        MsgType::Ack => {
            // An ACK echoes the original CON's wire message id, not necessarily
            // its Token (a separate-response placeholder ACK carries an empty
            // Token), so the send-queue lookup must key on message id.
            let sent = send_queue.remove_by_message_id(peer, rcvd.pdu.message_id());
            if rcvd.pdu.code().is_empty() {
                return;
            }
            response_handler(peer, sent.as_ref().map(|n| &n.pdu), &rcvd.pdu, tid);
        }
        MsgType::Rst => {
            // Same reasoning as ACK above: RST carries no Token at all.
            let _sent = send_queue.remove_by_message_id(peer, rcvd.pdu.message_id());
            trace!("dispatch: peer {:?} reset transaction {}", peer, tid);
        }
        MsgType::Non => {
            let mut unknown = KnownOptionsBitmap::new();
            if !check_critical(&rcvd.pdu, known_options, &mut unknown) {
                trace!("dispatch: dropping NON with unrecognized critical option");
                return;
            }
            route_or_respond(socket, send_queue, registry, response_handler, peer, &rcvd.pdu, tid);
        }
        MsgType::Con => {
            let mut unknown = KnownOptionsBitmap::new();
            if !check_critical(&rcvd.pdu, known_options, &mut unknown) {
                match new_error_response(&rcvd.pdu, MsgCode::ClientErrorBadOption, &unknown) {
                    Ok(response) => {
                        send(socket, peer, &response);
                    }
                    Err(err) => warn!("dispatch: failed to build Bad Option response: {:?}", err),
                }
                return;
            }
            route_or_respond(socket, send_queue, registry, response_handler, peer, &rcvd.pdu, tid);
        }
    }
}

fn route_or_respond(
    socket: &impl RawSocket,
    send_queue: &mut Queue,
    registry: &ResourceRegistry,
    response_handler: ResponseHandler,
    peer: PeerAddress,
    pdu: &Pdu,
    tid: TransactionId,
) {
    let code = pdu.code();
    if code.is_method() {
        route_request(socket, send_queue, registry, peer, pdu);
    } else if code.is_response() {
        response_handler(peer, None, pdu, tid);
    } else {
        warn!("dispatch: dropping PDU with invalid code {:?}", code);
    }
}
