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

//! Synthesizes error and well-known-discovery responses (§4.7).

use crate::consts::MAX_PDU_SIZE;
use crate::content_format::ContentFormat;
use crate::critical::KnownOptionsBitmap;
use crate::error::Error;
use crate::link_format::print_wellknown;
use crate::message::{MsgCode, MsgType, Pdu, PduBuilder};
use crate::option::{self, OptionInsert, OptionInsertExt, OptionNumber};
use crate::resource::ResourceRegistry;

/// Returns the short canonical phrase this engine attaches as the payload of an
/// error response, if `code` has one (§4.7).
fn canonical_phrase(code: MsgCode) -> Option<&'static str> {
    match code {
        MsgCode::ClientErrorBadOption => Some("Bad Option"),
        MsgCode::ClientErrorNotFound => Some("Not Found"),
        MsgCode::ClientErrorMethodNotAllowed => Some("Method Not Allowed"),
        _ => None,
    }
}

fn response_type(request: &Pdu) -> MsgType {
    if request.msg_type().is_con() {
        MsgType::Ack
    } else {
        MsgType::Non
    }
}

/// Builds an error response to `request`, per §4.7's `new_error_response`:
/// ACK if the request was CON (else NON), the request's MessageID, Token
/// preserved, any unknown-critical option numbers named in `opts_filter`
/// reflected back (so the peer knows which options it must drop), and a
/// Content-Type + canonical phrase payload if `code` has one.
pub fn new_error_response(request: &Pdu, code: MsgCode, opts_filter: &KnownOptionsBitmap) -> Result<Pdu, Error> {
    let mut builder = PduBuilder::new(MAX_PDU_SIZE, response_type(request), code, request.message_id());

    // Content-Type (1) is the lowest-numbered option this response can carry,
    // so it must be inserted before Token (11) or any reflected option below
    // to satisfy the builder's non-decreasing insertion rule.
    let payload = match canonical_phrase(code) {
        Some(phrase) => {
            builder.insert_option(option::CONTENT_TYPE, ContentFormat::TEXT_PLAIN_UTF8)?;
            phrase.as_bytes()
        }
        None => &[],
    };

    // Copy every option enabled in the filter — Token is always forced on, and
    // any unknown-critical option number is reflected back — in the ascending
    // order the request's own options already carry, so the builder's
    // non-decreasing insertion rule is satisfied without re-sorting.
    for entry in request.options() {
        let (num, bytes) = entry?;
        if num == OptionNumber::TOKEN || opts_filter.contains(num) {
            builder.insert_option_with_bytes(num, bytes)?;
        }
    }

    builder.finish(payload)
}

/// Builds the 2.05 Content response to a `.well-known/core` GET, per §4.7's
/// `wellknown_response`: ACK-type, the request's MessageID, Token preserved,
/// Content-Type application/link-format, and the registry rendered as the
/// payload.
pub fn wellknown_response(request: &Pdu, registry: &ResourceRegistry) -> Result<Pdu, Error> {
    let mut builder = PduBuilder::new(
        MAX_PDU_SIZE,
        response_type(request),
        MsgCode::SuccessContent,
        request.message_id(),
    );

    builder.insert_option(option::CONTENT_TYPE, ContentFormat::APPLICATION_LINK_FORMAT)?;

    let token = request.token();
    if !token.is_empty() {
        builder.insert_option_with_bytes(OptionNumber::TOKEN, token.as_bytes())?;
    }

    let mut payload = vec![0u8; MAX_PDU_SIZE];
    let n = print_wellknown(registry, &mut payload)?;
    payload.truncate(n);

    builder.finish(&payload)
}
