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

//! An owned CoAP message: header fields plus option and payload cursors (§3).

use super::option::*;
use super::*;

/// An owned byte buffer plus parsed header fields, an options cursor, and a payload
/// cursor (§3). Created on receive (via [`Pdu::parse`]) or by the sender (via
/// [`PduBuilder`]); owned by its enclosing queue node until delivered or deleted.
#[derive(Debug, Clone)]
pub struct Pdu {
    buffer: Vec<u8>,
    header: Header,
    options_start: usize,
    payload_start: usize,
}

impl Pdu {
    /// Parses a PDU out of a complete wire-format byte slice, copying it.
    ///
    /// Computes the payload boundary by stepping past `header.option_count` TLV
    /// entries using the unchecked options walker, which must include fence-posts
    /// (§4.5 step 4) — the canonical iterator must not be used here.
    pub fn parse(bytes: &[u8]) -> Result<Pdu, Error> {
        let header = Header::decode(bytes)?;
        let options_start = HEADER_SIZE;
        let option_bytes = &bytes[options_start..];
        let consumed = skip_n_options(option_bytes, header.option_count as usize)?;
        let payload_start = options_start + consumed;

        Ok(Pdu {
            buffer: bytes.to_vec(),
            header,
            options_start,
            payload_start,
        })
    }

    /// Returns the parsed header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the message type.
    pub fn msg_type(&self) -> MsgType {
        self.header.msg_type
    }

    /// Returns the message code.
    pub fn code(&self) -> MsgCode {
        self.header.code
    }

    /// Returns the wire message id.
    pub fn message_id(&self) -> MsgId {
        self.header.message_id
    }

    /// Returns the "official" option walker over this PDU's options, skipping
    /// fence-posts. Every semantic consumer should use this.
    pub fn options(&self) -> OptionIter<'_> {
        OptionIter::new(&self.buffer[self.options_start..self.payload_start])
    }

    /// Returns the "unchecked" option walker, fence-posts included.
    pub fn raw_options(&self) -> RawOptionIter<'_> {
        RawOptionIter::new(&self.buffer[self.options_start..self.payload_start])
    }

    /// Returns the payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.buffer[self.payload_start..]
    }

    /// Returns the entire wire-format byte representation of this PDU.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Extracts the Token option's value, or [`Token::EMPTY`] if absent (§3).
    pub fn token(&self) -> Token {
        match self.options().find_next_of(option::TOKEN) {
            Some(Ok(bytes)) => Token::new(bytes),
            _ => Token::EMPTY,
        }
    }
}

/// Builds a new [`Pdu`] into a caller-sized buffer, writing options in
/// non-decreasing option-number order and inserting fence-posts as needed (§4.7).
#[derive(Debug)]
pub struct PduBuilder {
    buffer: Vec<u8>,
    msg_type: MsgType,
    code: MsgCode,
    message_id: MsgId,
    options_len: usize,
    option_entries: u8,
    last_option: OptionNumber,
}

impl PduBuilder {
    /// Creates a new builder with the given size budget, message type, code, and id.
    pub fn new(capacity: usize, msg_type: MsgType, code: MsgCode, message_id: MsgId) -> PduBuilder {
        PduBuilder {
            buffer: vec![0u8; capacity],
            msg_type,
            code,
            message_id,
            options_len: 0,
            option_entries: 0,
            last_option: Default::default(),
        }
    }
}

impl OptionInsert for PduBuilder {
    fn insert_option_with_bytes(&mut self, key: OptionNumber, value: &[u8]) -> Result<(), Error> {
        if key < self.last_option {
            return Err(Error::InvalidArgument);
        }

        let start = HEADER_SIZE + self.options_len;
        if start > self.buffer.len() {
            return Err(Error::OutOfSpace);
        }

        let (fp_len, baseline, fp_count) =
            encode_fence_posts(&mut self.buffer[start..], self.last_option, key)?;
        self.options_len += fp_len;
        self.option_entries = self
            .option_entries
            .checked_add(fp_count)
            .ok_or(Error::OutOfSpace)?;

        let start = HEADER_SIZE + self.options_len;
        let n = encode_option(&mut self.buffer[start..], baseline, key, value)?;
        self.options_len += n;
        self.option_entries = self.option_entries.checked_add(1).ok_or(Error::OutOfSpace)?;
        self.last_option = key;

        Ok(())
    }
}

impl PduBuilder {
    /// Writes `payload` after the accumulated options and finishes the PDU,
    /// truncating the buffer to its actual encoded length.
    pub fn finish(mut self, payload: &[u8]) -> Result<Pdu, Error> {
        if self.option_entries > 0x0F {
            return Err(Error::OutOfSpace);
        }

        let payload_start = HEADER_SIZE + self.options_len;
        let total = payload_start + payload.len();
        if total > self.buffer.len() {
            return Err(Error::OutOfSpace);
        }

        self.buffer.truncate(total);
        self.buffer[payload_start..total].copy_from_slice(payload);

        let header = Header {
            version: COAP_VERSION,
            msg_type: self.msg_type,
            option_count: self.option_entries,
            code: self.code,
            message_id: self.message_id,
        };
        header.encode(&mut self.buffer[..HEADER_SIZE])?;

        Ok(Pdu {
            buffer: self.buffer,
            header,
            options_start: HEADER_SIZE,
            payload_start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_then_parse_roundtrip() {
        let mut builder = PduBuilder::new(64, MsgType::Con, MsgCode::MethodGet, 0x1234);
        builder.insert_option_with_str(OptionNumber::URI_PATH, "a").unwrap();
        builder
            .insert_option_with_bytes(OptionNumber::TOKEN, &[0x42])
            .unwrap();
        let pdu = builder.finish(b"ok").unwrap();

        let reparsed = Pdu::parse(pdu.as_bytes()).unwrap();
        assert_eq!(reparsed.msg_type(), MsgType::Con);
        assert_eq!(reparsed.code(), MsgCode::MethodGet);
        assert_eq!(reparsed.message_id(), 0x1234);
        assert_eq!(reparsed.payload(), b"ok");
        assert_eq!(reparsed.token().as_bytes(), &[0x42]);
    }

    #[test]
    fn parse_handles_zero_options() {
        let builder = PduBuilder::new(16, MsgType::Non, MsgCode::SuccessContent, 1);
        let pdu = builder.finish(b"hi").unwrap();
        let reparsed = Pdu::parse(pdu.as_bytes()).unwrap();
        assert_eq!(reparsed.payload(), b"hi");
        assert!(reparsed.options().next().is_none());
    }

    #[test]
    fn parse_handles_options_straddling_fence_post() {
        let mut builder = PduBuilder::new(64, MsgType::Con, MsgCode::MethodPost, 7);
        builder.insert_option_empty(OptionNumber::CONTENT_TYPE).unwrap();
        builder.insert_option_empty(OptionNumber::IF_NONE_MATCH).unwrap();
        let pdu = builder.finish(b"").unwrap();

        let reparsed = Pdu::parse(pdu.as_bytes()).unwrap();
        let keys: Vec<_> = reparsed.options().map(|r| r.unwrap().0).collect();
        assert_eq!(keys, vec![OptionNumber::CONTENT_TYPE, OptionNumber::IF_NONE_MATCH]);
        assert!(reparsed.payload().is_empty());
    }
}
