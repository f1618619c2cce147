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

//! A synchronous raw UDP socket abstraction (§4.12, ambient) plus two
//! implementations: [`StdUdpSocket`] for a real OS socket, and [`LoopbackSocket`],
//! an in-process test double modeled on the teacher crate's own null/loopback
//! sockets (`async-coap/src/datagram/null_socket.rs`).

use crate::error::Error;
use std::net::{SocketAddr, UdpSocket};

/// A blocking, address-generic UDP-like socket. `bind`, `send_to`, `recv_from`,
/// `local_addr` is the entire surface this engine needs (§4.12).
pub trait RawSocket {
    /// Binds to `addr`.
    fn bind(addr: SocketAddr) -> Result<Self, Error>
    where
        Self: Sized;

    /// Sends `buf` to `dst`, returning the number of bytes written.
    fn send_to(&self, buf: &[u8], dst: SocketAddr) -> Result<usize, Error>;

    /// Blocks until a datagram is available, then copies it into `buf`, returning
    /// its length and the sender's address.
    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Error>;

    /// Returns the address this socket is bound to.
    fn local_addr(&self) -> Result<SocketAddr, Error>;
}

/// A thin wrapper around [`std::net::UdpSocket`]. Binds via the `socket2` crate so
/// `SO_REUSEADDR` can be set before bind, then converts the `socket2::Socket` into
/// a standard library socket for the actual I/O (§4.12).
#[derive(Debug)]
pub struct StdUdpSocket {
    inner: UdpSocket,
}

impl RawSocket for StdUdpSocket {
    fn bind(addr: SocketAddr) -> Result<Self, Error> {
        use socket2::{Domain, Socket, Type};

        let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
        let socket = Socket::new(domain, Type::DGRAM, None)?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;

        Ok(StdUdpSocket { inner: socket.into() })
    }

    fn send_to(&self, buf: &[u8], dst: SocketAddr) -> Result<usize, Error> {
        Ok(self.inner.send_to(buf, dst)?)
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Error> {
        Ok(self.inner.recv_from(buf)?)
    }

    fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.inner.local_addr()?)
    }
}

/// An in-process test double: datagrams handed to [`LoopbackSocket::send_to`] are
/// queued and replayed back out of [`LoopbackSocket::recv_from`] in FIFO order,
/// letting scenario tests drive the full read/dispatch/send pipeline without a
/// real OS socket.
#[derive(Debug)]
pub struct LoopbackSocket {
    local: SocketAddr,
    inbox: std::cell::RefCell<std::collections::VecDeque<(Vec<u8>, SocketAddr)>>,
}

impl LoopbackSocket {
    /// Creates a new loopback socket claiming `local` as its bound address.
    pub fn new(local: SocketAddr) -> LoopbackSocket {
        LoopbackSocket {
            local,
            inbox: std::cell::RefCell::new(std::collections::VecDeque::new()),
        }
    }

    /// Injects a datagram as if it had arrived from `src`, to be returned by the
    /// next `recv_from`.
    pub fn inject(&self, data: &[u8], src: SocketAddr) {
        self.inbox.borrow_mut().push_back((data.to_vec(), src));
    }
}

impl RawSocket for LoopbackSocket {
    fn bind(addr: SocketAddr) -> Result<Self, Error> {
        Ok(LoopbackSocket::new(addr))
    }

    fn send_to(&self, buf: &[u8], dst: SocketAddr) -> Result<usize, Error> {
        self.inbox.borrow_mut().push_back((buf.to_vec(), dst));
        Ok(buf.len())
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), Error> {
        let (data, src) = self
            .inbox
            .borrow_mut()
            .pop_front()
            .ok_or(Error::IOError)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok((len, src))
    }

    fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn loopback_echoes_sent_datagrams() {
        let sock = LoopbackSocket::new(addr(5683));
        sock.send_to(b"hello", addr(9999)).unwrap();

        let mut buf = [0u8; 16];
        let (len, src) = sock.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"hello");
        assert_eq!(src, addr(9999));
    }

    #[test]
    fn loopback_injected_datagram_is_received() {
        let sock = LoopbackSocket::new(addr(5683));
        sock.inject(b"ping", addr(1111));

        let mut buf = [0u8; 16];
        let (len, src) = sock.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(src, addr(1111));
    }

    #[test]
    fn loopback_empty_inbox_errors() {
        let sock = LoopbackSocket::new(addr(5683));
        let mut buf = [0u8; 16];
        assert!(sock.recv_from(&mut buf).is_err());
    }

    #[test]
    fn loopback_preserves_fifo_order() {
        let sock = LoopbackSocket::new(addr(5683));
        sock.inject(b"first", addr(1));
        sock.inject(b"second", addr(2));

        let mut buf = [0u8; 16];
        let (len, _) = sock.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"first");
        let (len, _) = sock.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"second");
    }
}
