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

//! Routes an incoming request to a registered resource's handler, or
//! synthesizes well-known-discovery / 4.04 / 4.05 responses (§4.8).

use crate::addr::PeerAddress;
use crate::consts::DEFAULT_WELLKNOWN_URI;
use crate::critical::KnownOptionsBitmap;
use crate::message::{MsgCode, Pdu};
use crate::option::OptionNumber;
use crate::queue::Queue;
use crate::resource::{Method, ResourceKey, ResourceRegistry};
use crate::response::{new_error_response, wellknown_response};
use crate::retransmit::send;
use crate::socket::RawSocket;
use log::warn;
use std::sync::OnceLock;

/// The resource key for `.well-known/core`, computed once and cached for the
/// life of the process (§4.8).
fn wellknown_key() -> ResourceKey {
    static KEY: OnceLock<ResourceKey> = OnceLock::new();
    *KEY.get_or_init(|| ResourceKey::from_path_segments(DEFAULT_WELLKNOWN_URI.split('/').filter(|s| !s.is_empty())))
}

/// Hashes the Uri-Path option sequence of `pdu` into a [`ResourceKey`] (§3).
fn request_key(pdu: &Pdu) -> Result<ResourceKey, crate::error::Error> {
    let mut segments = Vec::new();
    for entry in pdu.options() {
        let (num, bytes) = entry?;
        if num == OptionNumber::URI_PATH {
            segments.push(std::str::from_utf8(bytes).map_err(|_| crate::error::Error::ParseFailure)?);
        }
    }
    Ok(ResourceKey::from_path_segments(segments.into_iter()))
}

fn send_synthesized(socket: &impl RawSocket, peer: PeerAddress, result: Result<Pdu, crate::error::Error>) {
    match result {
        Ok(pdu) => {
            send(socket, peer, &pdu);
        }
        Err(err) => warn!("router: failed to build response: {:?}", err),
    }
}

/// Routes `pdu` (already known to carry a method code) to its resource's
/// handler, or synthesizes the appropriate fallback response (§4.8).
pub fn route_request(
    socket: &impl RawSocket,
    send_queue: &mut Queue,
    registry: &ResourceRegistry,
    peer: PeerAddress,
    pdu: &Pdu,
) {
    let key = match request_key(pdu) {
        Ok(key) => key,
        Err(err) => {
            warn!("router: malformed Uri-Path options: {:?}", err);
            return;
        }
    };
    let method = Method::from_msg_code(pdu.code());

    let resource = registry.get(key);
    let handler = resource.and_then(|r| method.and_then(|m| r.handler(m)));

    if let Some(handler) = handler {
        handler(registry, key, peer, pdu, socket, send_queue);
        return;
    }

    if method == Some(Method::Get) && key == wellknown_key() {
        send_synthesized(socket, peer, wellknown_response(pdu, registry));
        return;
    }

    let code = if resource.is_none() && method == Some(Method::Get) {
        MsgCode::ClientErrorNotFound
    } else {
        MsgCode::ClientErrorMethodNotAllowed
    };
    send_synthesized(socket, peer, new_error_response(pdu, code, &KnownOptionsBitmap::new()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MsgType, PduBuilder};
    use crate::option;
    use crate::option::OptionInsert;
    use crate::resource::Resource;
    use crate::socket::LoopbackSocket;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn peer() -> PeerAddress {
        PeerAddress::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000))
    }

    fn get_request(path: &str) -> Pdu {
        let mut builder = PduBuilder::new(64, MsgType::Con, MsgCode::MethodGet, 1);
        for seg in path.split('/').filter(|s| !s.is_empty()) {
            builder.insert_option(option::URI_PATH, seg).unwrap();
        }
        builder.finish(b"").unwrap()
    }

    fn noop_handler(_reg: &ResourceRegistry, _key: ResourceKey, _peer: PeerAddress, _pdu: &Pdu, socket: &dyn RawSocket, _q: &mut Queue) {
        socket.send_to(b"handled", "127.0.0.1:9000".parse().unwrap()).unwrap();
    }

    #[test]
    fn routes_to_registered_handler() {
        let mut registry = ResourceRegistry::new();
        let mut resource = Resource::new("a");
        resource.set_handler(Method::Get, noop_handler);
        registry.register(resource);

        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let mut queue = Queue::new();
        route_request(&socket, &mut queue, &registry, peer(), &get_request("a"));

        let mut buf = [0u8; 16];
        let (len, _) = socket.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"handled");
    }

    #[test]
    fn missing_resource_get_yields_not_found() {
        let registry = ResourceRegistry::new();
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let mut queue = Queue::new();
        route_request(&socket, &mut queue, &registry, peer(), &get_request("missing"));

        let mut buf = [0u8; 64];
        let (len, _) = socket.recv_from(&mut buf).unwrap();
        let response = Pdu::parse(&buf[..len]).unwrap();
        assert_eq!(response.code(), MsgCode::ClientErrorNotFound);
    }

    #[test]
    fn resource_without_handler_for_method_yields_method_not_allowed() {
        let mut registry = ResourceRegistry::new();
        registry.register(Resource::new("a"));
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let mut queue = Queue::new();
        route_request(&socket, &mut queue, &registry, peer(), &get_request("a"));

        let mut buf = [0u8; 64];
        let (len, _) = socket.recv_from(&mut buf).unwrap();
        let response = Pdu::parse(&buf[..len]).unwrap();
        assert_eq!(response.code(), MsgCode::ClientErrorMethodNotAllowed);
    }

    #[test]
    fn well_known_core_get_is_synthesized_without_registration() {
        let mut registry = ResourceRegistry::new();
        registry.register(Resource::new("sensors/temp"));
        let socket = LoopbackSocket::new("127.0.0.1:5683".parse().unwrap());
        let mut queue = Queue::new();
        route_request(&socket, &mut queue, &registry, peer(), &get_request(".well-known/core"));

        let mut buf = [0u8; 128];
        let (len, _) = socket.recv_from(&mut buf).unwrap();
        let response = Pdu::parse(&buf[..len]).unwrap();
        assert_eq!(response.code(), MsgCode::SuccessContent);
        assert_eq!(response.payload(), b"</sensors/temp>");
    }
}
