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

//! The endpoint lifecycle (§6): owns the socket, both queues, the resource
//! registry, and the known-options bitmap, and exposes the three entry points
//! a host's event loop drives — `read`, `dispatch`, and `tick`.

use crate::addr::PeerAddress;
use crate::callbacks::ResponseHandler;
use crate::clock::{Clock, Prng, SystemClock};
use crate::critical::KnownOptionsBitmap;
use crate::dispatch;
use crate::error::Error;
use crate::message::Pdu;
use crate::queue::Queue;
use crate::reader;
use crate::resource::ResourceRegistry;
use crate::retransmit;
use crate::socket::{RawSocket, StdUdpSocket};
use crate::txid::TransactionId;
use std::net::SocketAddr;

/// Folds a [`SocketAddr`]'s bytes into a `u64`, used only to seed the PRNG
/// (§6) — not a security-sensitive hash.
fn addr_bits(addr: SocketAddr) -> u64 {
    let mut acc: u64 = 0xcbf2_9ce4_8422_2325;
    let mut fold = |byte: u8| acc = (acc ^ byte as u64).wrapping_mul(0x0000_0100_0000_01B3);
    match addr {
        SocketAddr::V4(v4) => v4.ip().octets().iter().copied().for_each(&mut fold),
        SocketAddr::V6(v6) => v6.ip().octets().iter().copied().for_each(&mut fold),
    }
    addr.port().to_be_bytes().iter().copied().for_each(fold);
    acc
}

/// An owned CoAP endpoint: socket, queues, registry, known-options bitmap, and
/// the jitter source, generic over the socket and clock implementations so
/// tests can substitute [`crate::socket::LoopbackSocket`] and
/// [`crate::clock::ManualClock`] (§5, §6).
pub struct EndpointContext<S: RawSocket, C: Clock> {
    socket: S,
    clock: C,
    prng: Prng,
    send_queue: Queue,
    receive_queue: Queue,
    known_options: KnownOptionsBitmap,
    registry: ResourceRegistry,
    response_handler: ResponseHandler,
}

impl<S: RawSocket, C: Clock> EndpointContext<S, C> {
    /// Assembles a context from already-constructed parts. Used by
    /// [`new_context`] for the production `StdUdpSocket`/`SystemClock` profile,
    /// and directly by tests wiring up a `LoopbackSocket`/`ManualClock` pair.
    pub fn with_parts(socket: S, clock: C, prng: Prng, response_handler: ResponseHandler) -> EndpointContext<S, C> {
        EndpointContext {
            socket,
            clock,
            prng,
            send_queue: Queue::new(),
            receive_queue: Queue::new(),
            known_options: KnownOptionsBitmap::default_known(),
            registry: ResourceRegistry::new(),
            response_handler,
        }
    }

    /// The resource registry, mutable only between event-loop iterations (§5).
    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    /// The address this context's socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.socket.local_addr()
    }

    /// Direct access to the underlying socket, mainly so tests can inject
    /// datagrams into a [`crate::socket::LoopbackSocket`].
    pub fn socket(&self) -> &S {
        &self.socket
    }

    /// Reads one datagram, filing it into the receive queue (§4.5).
    pub fn read(&mut self) -> bool {
        reader::read(&self.socket, &self.clock, &mut self.receive_queue)
    }

    /// Drains the receive queue, routing requests and matching responses (§4.6).
    pub fn dispatch(&mut self) {
        dispatch::dispatch(
            &self.socket,
            &self.clock,
            &mut self.send_queue,
            &mut self.receive_queue,
            &self.known_options,
            &self.registry,
            self.response_handler,
        );
    }

    /// Retransmits or retires every send-queue node whose deadline has passed
    /// (§4.4). Intended to be driven by a host's periodic timer.
    pub fn tick(&mut self) {
        retransmit::tick(&self.socket, &self.clock, &mut self.send_queue);
    }

    /// Sends `pdu` once, unconfirmed (§4.9).
    pub fn send(&mut self, dst: PeerAddress, pdu: &Pdu) -> TransactionId {
        retransmit::send(&self.socket, dst, pdu)
    }

    /// Sends `pdu` confirmed, scheduling retransmission if unacknowledged (§4.9).
    pub fn send_confirmed(&mut self, dst: PeerAddress, pdu: Pdu) -> TransactionId {
        retransmit::send_confirmed(&self.socket, &self.clock, &mut self.prng, &mut self.send_queue, dst, pdu)
    }

    /// True when both queues are empty (§5, §6's exit predicate).
    pub fn can_exit(&self) -> bool {
        self.send_queue.is_empty() && self.receive_queue.is_empty()
    }
}

/// Opens a UDP socket bound to `listen_addr` with `SO_REUSEADDR`, seeds the
/// PRNG from the listen address XOR a clock offset, and registers the default
/// critical-option set (§4.3, §6).
pub fn new_context(
    listen_addr: SocketAddr,
    response_handler: ResponseHandler,
) -> Result<EndpointContext<StdUdpSocket, SystemClock>, Error> {
    let socket = StdUdpSocket::bind(listen_addr)?;
    let clock = SystemClock::new();
    let seed = addr_bits(listen_addr) ^ clock.now_ticks();
    let prng = Prng::new(seed);

    Ok(EndpointContext::with_parts(socket, clock, prng, response_handler))
}

/// Drains both queues, freeing every outstanding node (§6). On the general-
/// purpose profile this targets, there is no process-wide singleton to release
/// and dropping `ctx` afterward closes the socket.
pub fn free_context<S: RawSocket, C: Clock>(mut ctx: EndpointContext<S, C>) {
    ctx.send_queue.delete_all();
    ctx.receive_queue.delete_all();
}

/// True when `ctx` has no outstanding send or receive nodes (§6).
pub fn can_exit<S: RawSocket, C: Clock>(ctx: &EndpointContext<S, C>) -> bool {
    ctx.can_exit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::ignore_response;
    use crate::clock::ManualClock;
    use crate::message::{MsgCode, MsgType, PduBuilder};
    use crate::option::{OptionInsert, OptionInsertExt};
    use crate::resource::{Method, Resource};
    use crate::socket::LoopbackSocket;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn local() -> SocketAddr {
        "127.0.0.1:5683".parse().unwrap()
    }

    fn test_ctx() -> EndpointContext<LoopbackSocket, ManualClock> {
        let socket = LoopbackSocket::new(local());
        let clock = ManualClock::new();
        EndpointContext::with_parts(socket, clock, Prng::new(7), ignore_response)
    }

    #[test]
    fn fresh_context_can_exit() {
        let ctx = test_ctx();
        assert!(ctx.can_exit());
        assert!(can_exit(&ctx));
    }

    #[test]
    fn send_confirmed_blocks_exit_until_acked() {
        let mut ctx = test_ctx();
        let peer = PeerAddress::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000));
        let pdu = PduBuilder::new(16, MsgType::Con, MsgCode::MethodGet, 1).finish(b"").unwrap();

        ctx.send_confirmed(peer, pdu);
        assert!(!ctx.can_exit());
    }

    #[test]
    fn addr_bits_differ_for_different_ports() {
        let a = addr_bits("127.0.0.1:1".parse().unwrap());
        let b = addr_bits("127.0.0.1:2".parse().unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn end_to_end_echo_via_context() {
        fn echo_handler(_reg: &ResourceRegistry, _key: crate::resource::ResourceKey, _peer: PeerAddress, pdu: &Pdu, socket: &dyn RawSocket, _q: &mut Queue) {
            let reply = PduBuilder::new(32, MsgType::Ack, MsgCode::SuccessContent, pdu.message_id())
                .finish(b"ok")
                .unwrap();
            socket.send_to(reply.as_bytes(), "127.0.0.1:9000".parse().unwrap()).unwrap();
        }

        let mut ctx = test_ctx();
        let mut resource = Resource::new("a");
        resource.set_handler(Method::Get, echo_handler);
        ctx.registry_mut().register(resource);

        let mut builder = PduBuilder::new(32, MsgType::Con, MsgCode::MethodGet, 0x1234);
        builder.insert_option(crate::option::URI_PATH, "a").unwrap();
        builder.insert_option_with_bytes(crate::option::OptionNumber::TOKEN, &[0x42]).unwrap();
        let request = builder.finish(b"").unwrap();

        ctx.socket().inject(request.as_bytes(), "127.0.0.1:9000".parse().unwrap());
        assert!(ctx.read());
        ctx.dispatch();

        let mut buf = [0u8; 32];
        let (len, _) = ctx.socket().recv_from(&mut buf).unwrap();
        let response = Pdu::parse(&buf[..len]).unwrap();
        assert_eq!(response.code(), MsgCode::SuccessContent);
        assert_eq!(response.payload(), b"ok");
        assert_eq!(response.token().as_bytes(), &[0x42]);
        assert!(ctx.can_exit());
    }
}
