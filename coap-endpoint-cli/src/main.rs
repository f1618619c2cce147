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

mod config;

use coap_endpoint::callbacks::ignore_response;
use coap_endpoint::context::new_context;
use coap_endpoint::resource::{Method, Resource};
use config::Config;

/// Registers a small demonstration resource tree: a discoverable sensor
/// reading and a static `.well-known/core` entry provided automatically by
/// the engine itself.
fn register_demo_resources(ctx: &mut coap_endpoint::EndpointContext<coap_endpoint::socket::StdUdpSocket, coap_endpoint::clock::SystemClock>) {
    let mut temp = Resource::new("sensors/temp");
    temp.set_handler(Method::Get, demo_handlers::read_temperature);
    ctx.registry_mut().register(temp);
}

mod demo_handlers {
    use coap_endpoint::addr::PeerAddress;
    use coap_endpoint::message::{MsgCode, MsgType, Pdu, PduBuilder};
    use coap_endpoint::queue::Queue;
    use coap_endpoint::resource::{ResourceKey, ResourceRegistry};
    use coap_endpoint::retransmit::send;
    use coap_endpoint::socket::RawSocket;

    pub fn read_temperature(
        _registry: &ResourceRegistry,
        _key: ResourceKey,
        peer: PeerAddress,
        request: &Pdu,
        socket: &dyn RawSocket,
        _send_queue: &mut Queue,
    ) {
        let response = PduBuilder::new(32, MsgType::Ack, MsgCode::SuccessContent, request.message_id())
            .finish(b"21.0");
        match response {
            Ok(pdu) => {
                send(socket, peer, &pdu);
            }
            Err(err) => log::warn!("coap-endpoint: failed to build temperature response: {:?}", err),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    simple_logger::init_with_level(config.log_level.as_level())?;

    log::info!("coap-endpoint: binding {}", config.listen);
    let mut ctx = new_context(config.listen, ignore_response)?;
    register_demo_resources(&mut ctx);

    loop {
        if ctx.read() {
            ctx.dispatch();
        }
        ctx.tick();
    }
}
