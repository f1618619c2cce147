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

//! An ordered singly-linked queue of timed nodes (§4.2), used for both the send
//! queue (ordered by scheduled tick) and the receive queue (ordered by arrival).
//!
//! The original engine this is modeled on deletes the whole queue recursively;
//! that blows the stack on a long queue, so [`Queue::delete_all`] here is
//! iterative instead. Observable behavior is identical: every node is freed and
//! the queue ends empty.

use crate::addr::PeerAddress;
use crate::message::{MsgId, Pdu};
use crate::txid::TransactionId;

/// One entry in a [`Queue`]: an owned PDU plus the retransmission/addressing
/// bookkeeping described in §3's QueueNode fields.
#[derive(Debug)]
pub struct QueueNode {
    /// Scheduled tick at which this node is next due (send queue) or was enqueued
    /// (receive queue).
    pub t: u64,

    /// Base ACK timeout, in ticks, used to compute the next retransmission delay.
    pub base_timeout: u64,

    /// Number of retransmissions already attempted.
    pub retransmit_count: u8,

    /// The transaction id this node was filed under.
    pub tid: TransactionId,

    /// The wire message id, used to match an incoming ACK/RST by exact id.
    pub message_id: MsgId,

    /// The remote peer this PDU is addressed to or was received from.
    pub peer: PeerAddress,

    /// The owned PDU.
    pub pdu: Pdu,

    next: Option<Box<QueueNode>>,
}

impl QueueNode {
    /// Creates a detached node (no `next`) ready for insertion.
    pub fn new(
        t: u64,
        base_timeout: u64,
        tid: TransactionId,
        message_id: MsgId,
        peer: PeerAddress,
        pdu: Pdu,
    ) -> QueueNode {
        QueueNode {
            t,
            base_timeout,
            retransmit_count: 0,
            tid,
            message_id,
            peer,
            pdu,
            next: None,
        }
    }
}

/// An ordered singly-linked list of [`QueueNode`]s (§4.2). Ordering is defined
/// entirely by the `less` comparator passed to [`Queue::insert`]; the send queue
/// orders by `t` ascending, the receive queue by arrival (which, since nodes are
/// always appended in arrival order, is achieved by a comparator that is never
/// `true`, i.e. always inserts at the tail).
#[derive(Debug, Default)]
pub struct Queue {
    head: Option<Box<QueueNode>>,
}

impl Queue {
    /// Creates a new, empty queue.
    pub fn new() -> Queue {
        Queue { head: None }
    }

    /// Returns true if the queue holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Inserts `node` in order, per `less`: if the queue is empty, `node` becomes
    /// head. Else if `less(node, head)`, `node` becomes the new head. Else walk
    /// until a successor `q` with `less(node, q)` is found and splice before it
    /// (or at the tail if none is found).
    pub fn insert(&mut self, mut node: Box<QueueNode>, less: impl Fn(&QueueNode, &QueueNode) -> bool) {
        if self.head.is_none() || less(&node, self.head.as_ref().unwrap()) {
            node.next = self.head.take();
            self.head = Some(node);
            return;
        }

        let mut cursor = self.head.as_mut().unwrap();
        loop {
            let splice_here = match &cursor.next {
                Some(next) => less(&node, next),
                None => true,
            };
            if splice_here {
                node.next = cursor.next.take();
                cursor.next = Some(node);
                return;
            }
            cursor = cursor.next.as_mut().unwrap();
        }
    }

    /// Removes and returns the head node, if any.
    pub fn pop_front(&mut self) -> Option<Box<QueueNode>> {
        self.head.take().map(|mut node| {
            self.head = node.next.take();
            node
        })
    }

    /// Returns a reference to the head node without removing it.
    pub fn peek_front(&self) -> Option<&QueueNode> {
        self.head.as_deref()
    }

    /// Removes the first node whose transaction id equals `id`, returning it.
    /// For matching an incoming ACK/RST against the send queue, use
    /// [`Queue::remove_by_message_id`] instead — this is for callers (tests,
    /// or a host cancelling a transaction by the id `send_confirmed` returned)
    /// that already know the TransactionID and don't have a wire message id.
    pub fn remove_by_id(&mut self, id: TransactionId) -> Option<Box<QueueNode>> {
        if self.head.as_ref().map(|n| n.tid) == Some(id) {
            return self.pop_front();
        }

        let mut cursor = self.head.as_mut()?;
        loop {
            let found = cursor.next.as_ref().map(|n| n.tid) == Some(id);
            if found {
                let mut removed = cursor.next.take().unwrap();
                cursor.next = removed.next.take();
                return Some(removed);
            }
            cursor = cursor.next.as_mut()?;
        }
    }

    /// Removes the first node addressed to `peer` whose wire message id equals
    /// `message_id`, returning it. An ACK or RST carries the original CON's
    /// message id but not necessarily its Token (an RST, and a separate-response
    /// placeholder ACK, are both commonly sent with an empty Token), so matching
    /// an incoming ACK/RST against the send queue must go by `(peer, message_id)`
    /// rather than by transaction id.
    pub fn remove_by_message_id(&mut self, peer: PeerAddress, message_id: MsgId) -> Option<Box<QueueNode>> {
        let matches = |n: &QueueNode| n.peer == peer && n.message_id == message_id;

        if self.head.as_deref().map(matches) == Some(true) {
            return self.pop_front();
        }

        let mut cursor = self.head.as_mut()?;
        loop {
            let found = cursor.next.as_deref().map(matches) == Some(true);
            if found {
                let mut removed = cursor.next.take().unwrap();
                cursor.next = removed.next.take();
                return Some(removed);
            }
            cursor = cursor.next.as_mut()?;
        }
    }

    /// Frees every node in the queue, leaving it empty. Iterative: unlinking one
    /// node at a time from the head avoids recursive drops on a long chain.
    pub fn delete_all(&mut self) {
        let mut cur = self.head.take();
        while let Some(mut node) = cur {
            cur = node.next.take();
        }
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.delete_all();
    }
}

/// Orders by scheduled tick ascending; nodes with equal `t` insert after existing
/// nodes of the same tick, matching the documented (if not perfectly symmetric)
/// send-queue ordering.
pub fn by_tick_ascending(candidate: &QueueNode, existing: &QueueNode) -> bool {
    candidate.t < existing.t
}

/// Never splices before an existing node; new nodes always land at the tail,
/// giving the receive queue stable arrival-order semantics.
pub fn by_arrival_order(_candidate: &QueueNode, _existing: &QueueNode) -> bool {
    false
}
