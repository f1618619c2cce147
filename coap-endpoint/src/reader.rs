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

//! Drains one UDP datagram into the receive queue (§4.5).

use crate::addr::PeerAddress;
use crate::clock::Clock;
use crate::consts::MAX_PDU_SIZE;
use crate::message::Pdu;
use crate::queue::{by_arrival_order, Queue, QueueNode};
use crate::socket::RawSocket;
use crate::txid::transaction_id;
use log::debug;

fn peer_from_sockaddr(addr: std::net::SocketAddr) -> PeerAddress {
    match addr {
        std::net::SocketAddr::V4(v4) => PeerAddress::V4(v4),
        std::net::SocketAddr::V6(v6) => PeerAddress::V6 {
            addr: *v6.ip(),
            port: v6.port(),
        },
    }
}

/// Reads one datagram off `socket` and, if it parses as a well-formed CoAP PDU,
/// files it into `receive_queue`. Returns `true` on success, `false` if the
/// datagram was rejected (I/O failure, too short, or wrong version) — matching
/// §4.5's `0|-1` contract, spelled as a bool in this idiom.
pub fn read(socket: &impl RawSocket, clock: &impl Clock, receive_queue: &mut Queue) -> bool {
    let mut buf = [0u8; MAX_PDU_SIZE];

    let (len, src) = match socket.recv_from(&mut buf) {
        Ok(pair) => pair,
        Err(err) => {
            debug!("read: recv_from failed: {}", err);
            return false;
        }
    };

    let pdu = match Pdu::parse(&buf[..len]) {
        Ok(pdu) => pdu,
        Err(err) => {
            debug!("read: rejecting malformed datagram from {}: {}", src, err);
            return false;
        }
    };

    let peer = peer_from_sockaddr(src);
    let tid = transaction_id(&peer, &pdu.token());
    let message_id = pdu.message_id();
    let t = clock.now_ticks();

    let node = Box::new(QueueNode::new(t, 0, tid, message_id, peer, pdu));
    receive_queue.insert(node, by_arrival_order);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::message::{MsgCode, MsgType, PduBuilder};
    use crate::socket::LoopbackSocket;

    #[test]
    fn read_files_a_well_formed_datagram() {
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let clock = ManualClock::new();
        let mut queue = Queue::new();

        let pdu = PduBuilder::new(16, MsgType::Con, MsgCode::MethodGet, 7).finish(b"").unwrap();
        socket.inject(pdu.as_bytes(), "127.0.0.1:9000".parse().unwrap());

        assert!(read(&socket, &clock, &mut queue));
        assert!(!queue.is_empty());
        assert_eq!(queue.peek_front().unwrap().pdu.message_id(), 7);
    }

    #[test]
    fn read_rejects_short_frame() {
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let clock = ManualClock::new();
        let mut queue = Queue::new();

        socket.inject(&[0x40, 0x01], "127.0.0.1:9000".parse().unwrap());
        assert!(!read(&socket, &clock, &mut queue));
        assert!(queue.is_empty());
    }

    #[test]
    fn read_rejects_when_inbox_empty() {
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let clock = ManualClock::new();
        let mut queue = Queue::new();
        assert!(!read(&socket, &clock, &mut queue));
    }
}
