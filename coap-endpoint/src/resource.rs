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

//! The resource registry (§3, §4.8, §4.11): a small ordered map from
//! [`ResourceKey`] to [`Resource`], each owning a method-indexed handler table.

use crate::addr::PeerAddress;
use crate::message::{MsgCode, Pdu};
use crate::queue::Queue;
use crate::socket::RawSocket;
use std::collections::BTreeMap;

/// A 4-byte hash of a request's URI-path option sequence (§3). Equality is
/// byte-wise, matching the source semantics exactly.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ResourceKey(pub u32);

impl ResourceKey {
    /// Hashes the segments of a URI path (already split on `/`) the same way for
    /// registration and for lookup, so the two always agree.
    pub fn from_path_segments<'a>(segments: impl Iterator<Item = &'a str>) -> ResourceKey {
        // FNV-1a over the segments, joined conceptually by a separator byte so
        // {"a","bc"} and {"ab","c"} don't collide.
        let mut acc: u32 = 0x811C_9DC5;
        for seg in segments {
            for b in seg.bytes() {
                acc = (acc ^ b as u32).wrapping_mul(16_777_619);
            }
            acc = (acc ^ b'/' as u32).wrapping_mul(16_777_619);
        }
        ResourceKey(acc)
    }
}

/// CoAP request methods, used to index a [`Resource`]'s handler table (§3, §9):
/// GET=1, POST=2, PUT=3, DELETE=4.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Method {
    /// CoAP GET.
    Get = 1,
    /// CoAP POST.
    Post = 2,
    /// CoAP PUT.
    Put = 3,
    /// CoAP DELETE.
    Delete = 4,
}

impl Method {
    /// Maps a request's [`MsgCode`] to a [`Method`], if it is one of the four
    /// method codes.
    pub fn from_msg_code(code: MsgCode) -> Option<Method> {
        match code {
            MsgCode::MethodGet => Some(Method::Get),
            MsgCode::MethodPost => Some(Method::Post),
            MsgCode::MethodPut => Some(Method::Put),
            MsgCode::MethodDelete => Some(Method::Delete),
            _ => None,
        }
    }

    fn slot_index(self) -> usize {
        self as usize - 1
    }
}

/// A request handler: given the registry, the matched resource's key, the
/// requesting peer, the request PDU, the socket to reply over, and the send
/// queue to schedule a confirmable reply on, the handler is fully responsible
/// for sending any reply (§4.8 step 3).
pub type Handler = fn(&ResourceRegistry, ResourceKey, PeerAddress, &Pdu, &dyn RawSocket, &mut Queue);

/// A registered resource: a path (kept for link-format rendering) plus a
/// method-indexed table of optional handlers (§3, §9 — "a fixed-size array of
/// optional function values, not inheritance").
#[derive(Clone)]
pub struct Resource {
    path: String,
    handlers: [Option<Handler>; 4],
}

impl Resource {
    /// Creates a new resource registered at `path` with no handlers.
    pub fn new(path: impl Into<String>) -> Resource {
        Resource {
            path: path.into(),
            handlers: [None; 4],
        }
    }

    /// Returns the path this resource was registered under.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Registers `handler` for `method`, replacing any previous handler.
    pub fn set_handler(&mut self, method: Method, handler: Handler) -> &mut Self {
        self.handlers[method.slot_index()] = Some(handler);
        self
    }

    /// Returns the handler registered for `method`, if any.
    pub fn handler(&self, method: Method) -> Option<Handler> {
        self.handlers[method.slot_index()]
    }
}

/// An ordered map from [`ResourceKey`] to [`Resource`] (§4.11). A `BTreeMap`
/// gives the stable iteration order the link-format renderer needs without a
/// separate sort step.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<ResourceKey, Resource>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> ResourceRegistry {
        ResourceRegistry {
            resources: BTreeMap::new(),
        }
    }

    /// Registers `resource` at the key derived from its own path, returning the
    /// key for convenience.
    pub fn register(&mut self, resource: Resource) -> ResourceKey {
        let key = ResourceKey::from_path_segments(resource.path().split('/').filter(|s| !s.is_empty()));
        self.resources.insert(key, resource);
        key
    }

    /// Looks up a resource by key.
    pub fn get(&self, key: ResourceKey) -> Option<&Resource> {
        self.resources.get(&key)
    }

    /// Iterates all registered resources in key order, for link-format rendering.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }
}
