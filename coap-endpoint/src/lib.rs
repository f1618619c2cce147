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

//! A synchronous, single-threaded implementation of a Constrained Application
//! Protocol (CoAP, draft-08) endpoint.
//!
//! Unlike other CoAP libraries built around `async`/await or a dedicated
//! reactor thread, this crate is meant to be driven directly from a host's own
//! event loop: three entry points — [`EndpointContext::read`],
//! [`EndpointContext::dispatch`], and [`EndpointContext::tick`] — are called
//! back-to-back with no internal concurrency of any kind. A single UDP socket
//! is owned per [`EndpointContext`]; nothing here spawns a thread, blocks, or
//! assumes a reactor is present.
//!
//! ```no_run
//! use coap_endpoint::context::new_context;
//! use coap_endpoint::callbacks::ignore_response;
//! use coap_endpoint::resource::{Method, Resource};
//!
//! let mut ctx = new_context("0.0.0.0:5683".parse().unwrap(), ignore_response)
//!     .expect("bind failed");
//!
//! ctx.registry_mut().register(Resource::new("sensors/temp"));
//!
//! loop {
//!     while ctx.read() {
//!         ctx.dispatch();
//!     }
//!     ctx.tick();
//! #   break;
//! }
//! ```
//!
//! ## Design
//!
//! The engine is organized around two explicit queues (§4.4, §4.5): a receive
//! queue filed by [`reader::read`] and drained by [`dispatch::dispatch`], and a
//! send queue of outstanding confirmable transactions retried by
//! [`retransmit::tick`]. Transaction identity is the pair of peer address and
//! token ([`txid`]); critical-option validation ([`critical`]) happens once per
//! inbound message, before a request ever reaches a resource handler
//! ([`resource`], [`router`]).
//!
//! A resource handler is a plain function pointer — not a trait object, not a
//! future — given the socket and send queue it needs to answer on its own
//! (§4.8). This mirrors the rest of the crate: no allocation beyond what's
//! needed to hold a PDU and its queue node, no hidden state, and nothing that
//! runs after the call that triggered it returns.

pub mod addr;
pub use addr::PeerAddress;

pub mod callbacks;

pub mod clock;

pub mod consts;
pub use consts::*;

pub mod context;
pub use context::EndpointContext;

mod critical;
pub use critical::KnownOptionsBitmap;

mod dispatch;

mod error;
pub use error::*;

pub mod link_format;

pub mod message;
pub mod option;

pub mod queue;
pub use queue::Queue;

mod reader;

pub mod resource;
pub use resource::{Method, Resource, ResourceKey, ResourceRegistry};

mod response;
pub use response::{new_error_response, wellknown_response};

pub mod retransmit;

mod router;

pub mod socket;
pub use socket::RawSocket;

mod txid;
pub use txid::TransactionId;

mod content_format;
pub use content_format::ContentFormat;

mod etag;
pub use etag::ETag;

mod util;

/// Commonly used traits and types, meant to be glob-imported.
pub mod prelude {
    pub use crate::callbacks::ResponseHandler;
    pub use crate::clock::Clock;
    pub use crate::context::EndpointContext;
    pub use crate::message::{MsgCode, MsgType, Pdu, PduBuilder};
    pub use crate::option::{OptionInsert, OptionInsertExt};
    pub use crate::resource::{Method, Resource, ResourceKey, ResourceRegistry};
    pub use crate::socket::RawSocket;
}
