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

//! The confirmable-message retransmission scheduler (§4.4, §4.9).

use crate::addr::PeerAddress;
use crate::clock::{Clock, Prng};
use crate::consts::{INVALID_TRANSACTION_ID, MAX_RETRANSMIT, RESPONSE_TIMEOUT_TICKS};
use crate::message::Pdu;
use crate::queue::{by_tick_ascending, Queue, QueueNode};
use crate::socket::RawSocket;
use crate::txid::{transaction_id, TransactionId};
use log::warn;

/// Writes `pdu` to `dst` over `socket`, logging (not propagating) any I/O error —
/// per §7, a send failure on the unconfirmed path is logged and the PDU is
/// dropped either way.
fn transmit(socket: &impl RawSocket, dst: PeerAddress, pdu: &Pdu) {
    let addr = match dst {
        PeerAddress::V4(sock) => std::net::SocketAddr::V4(sock),
        PeerAddress::V6 { addr, port } => std::net::SocketAddr::new(addr.into(), port),
        PeerAddress::LinkLayer { .. } => {
            warn!("cannot transmit to a link-layer peer over a UDP socket");
            return;
        }
    };

    if let Err(err) = socket.send_to(pdu.as_bytes(), addr) {
        warn!("send_to {} failed: {}", addr, err);
    }
}

/// Sends `pdu` once, unconfirmed, and frees it unconditionally (§4.9's `send`).
/// Returns the TID this message was filed under (not tracked anywhere — NON
/// messages are fire-and-forget).
pub fn send(socket: &impl RawSocket, dst: PeerAddress, pdu: &Pdu) -> TransactionId {
    transmit(socket, dst, pdu);
    transaction_id(&dst, &pdu.token())
}

/// Schedules `pdu` for confirmable delivery to `dst` (§4.4's `send_confirmed`):
/// transmits it once immediately, then files a [`QueueNode`] in `send_queue` so a
/// later `tick` call retransmits it if no ACK/RST arrives in time.
///
/// Returns [`INVALID_TRANSACTION_ID`] if the PDU carries no computable identity
/// (this never actually happens for an owned in-memory PDU — allocation is the
/// only OOM case per §4.4 step 1, and this implementation's `Pdu`/`QueueNode` are
/// heap-allocated `Vec`/`Box` values that panic rather than silently fail on OOM,
/// consistent with §5's memory model).
pub fn send_confirmed(
    socket: &impl RawSocket,
    clock: &impl Clock,
    prng: &mut Prng,
    send_queue: &mut Queue,
    dst: PeerAddress,
    pdu: Pdu,
) -> TransactionId {
    let tid = transaction_id(&dst, &pdu.token());
    let message_id = pdu.message_id();
    let timeout = prng.jitter_timeout(RESPONSE_TIMEOUT_TICKS);
    let t = clock.now_ticks() + timeout;

    transmit(socket, dst, &pdu);

    let node = Box::new(QueueNode::new(t, timeout, tid, message_id, dst, pdu));
    send_queue.insert(node, by_tick_ascending);
    tid
}

/// Re-transmits or retires `node`, per §4.4's `retransmit`. If the retry budget
/// remains, re-sends the PDU, doubles the backoff (`timeout << retransmit_count`),
/// reinserts into `send_queue`, and returns its TID. Otherwise the node (and its
/// PDU) is dropped and [`INVALID_TRANSACTION_ID`] is returned.
pub fn retransmit(socket: &impl RawSocket, clock: &impl Clock, send_queue: &mut Queue, mut node: Box<QueueNode>) -> TransactionId {
    if node.retransmit_count < MAX_RETRANSMIT {
        node.retransmit_count += 1;
        node.t = clock.now_ticks() + (node.base_timeout << node.retransmit_count);
        transmit(socket, node.peer, &node.pdu);
        let tid = node.tid;
        send_queue.insert(node, by_tick_ascending);
        tid
    } else {
        INVALID_TRANSACTION_ID
    }
}

/// Drains every node whose scheduled tick has arrived, retransmitting or retiring
/// each. Intended to be driven by a host's periodic timer.
pub fn tick(socket: &impl RawSocket, clock: &impl Clock, send_queue: &mut Queue) {
    let now = clock.now_ticks();
    loop {
        match send_queue.peek_front() {
            Some(head) if head.t <= now => {}
            _ => break,
        }
        let node = send_queue.pop_front().expect("peeked Some above");
        retransmit(socket, clock, send_queue, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::message::{MsgCode, MsgType, PduBuilder};
    use crate::socket::LoopbackSocket;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn peer() -> PeerAddress {
        PeerAddress::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 5683))
    }

    fn con_pdu(msg_id: u16) -> Pdu {
        PduBuilder::new(16, MsgType::Con, MsgCode::MethodGet, msg_id).finish(b"").unwrap()
    }

    #[test]
    fn send_confirmed_schedules_a_node() {
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let clock = ManualClock::new();
        let mut prng = Prng::new(1);
        let mut queue = Queue::new();

        let tid = send_confirmed(&socket, &clock, &mut prng, &mut queue, peer(), con_pdu(1));
        assert_ne!(tid, INVALID_TRANSACTION_ID);
        assert!(!queue.is_empty());
        assert_eq!(queue.peek_front().unwrap().tid, tid);
    }

    #[test]
    fn retransmit_doubles_backoff_until_exhausted() {
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let clock = ManualClock::new();
        let mut queue = Queue::new();

        let node = Box::new(QueueNode::new(0, 1000, 42, 42, peer(), con_pdu(42)));
        queue.insert(node, by_tick_ascending);

        for expected_count in 1..=MAX_RETRANSMIT {
            let node = queue.pop_front().unwrap();
            let tid = retransmit(&socket, &clock, &mut queue, node);
            assert_ne!(tid, INVALID_TRANSACTION_ID);
            assert_eq!(queue.peek_front().unwrap().retransmit_count, expected_count);
        }

        let node = queue.pop_front().unwrap();
        let tid = retransmit(&socket, &clock, &mut queue, node);
        assert_eq!(tid, INVALID_TRANSACTION_ID);
        assert!(queue.is_empty());
    }

    #[test]
    fn tick_only_fires_due_nodes() {
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let clock = ManualClock::new();
        let mut queue = Queue::new();

        queue.insert(Box::new(QueueNode::new(100, 50, 1, 1, peer(), con_pdu(1))), by_tick_ascending);
        queue.insert(Box::new(QueueNode::new(200, 50, 2, 2, peer(), con_pdu(2))), by_tick_ascending);

        tick(&socket, &clock, &mut queue);
        assert_eq!(queue.peek_front().unwrap().tid, 1, "nothing due yet at t=0");

        clock.advance(150);
        tick(&socket, &clock, &mut queue);
        // node 1 retransmitted and reinserted with a later t; node 2 still due-soon but not yet.
        assert!(!queue.is_empty());
    }
}
