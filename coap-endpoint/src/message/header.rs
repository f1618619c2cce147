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

use super::*;

/// CoAP version supported by this engine.
pub const COAP_VERSION: u8 = 1;

/// Size in bytes of the fixed CoAP header.
pub const HEADER_SIZE: usize = 4;

#[allow(dead_code)]
const COAP_MSG_VER_MASK: u8 = 0b1100_0000;
#[allow(dead_code)]
const COAP_MSG_VER_OFFS: u8 = 6;
#[allow(dead_code)]
const COAP_MSG_T_MASK: u8 = 0b0011_0000;
#[allow(dead_code)]
const COAP_MSG_T_OFFS: u8 = 4;
#[allow(dead_code)]
const COAP_MSG_OC_MASK: u8 = 0b0000_1111;

/// The 4-byte fixed header: `{version:2, type:2, option_count:4, code:8, message_id:16}` (§6).
#[derive(Debug, Copy, Eq, PartialEq, Clone)]
pub struct Header {
    /// Protocol version. Only [`COAP_VERSION`] is accepted on read.
    pub version: u8,

    /// Message type: CON, NON, ACK, or RST.
    pub msg_type: MsgType,

    /// Number of options following the header, fence-posts included.
    pub option_count: u8,

    /// Message code.
    pub code: MsgCode,

    /// 16-bit wire message identifier.
    pub message_id: MsgId,
}

impl Header {
    /// Decodes a header from the first [`HEADER_SIZE`] bytes of `buffer`.
    pub fn decode(buffer: &[u8]) -> Result<Header, Error> {
        if buffer.len() < HEADER_SIZE {
            return Err(Error::ParseFailure);
        }

        let version = (buffer[0] & COAP_MSG_VER_MASK) >> COAP_MSG_VER_OFFS;
        if version != COAP_VERSION {
            return Err(Error::UnsupportedVersion);
        }

        let msg_type = MsgType::try_from((buffer[0] & COAP_MSG_T_MASK) >> COAP_MSG_T_OFFS)
            .ok_or(Error::ParseFailure)?;
        let option_count = buffer[0] & COAP_MSG_OC_MASK;
        let code = MsgCode::try_from(buffer[1]).ok_or(Error::UnknownMessageCode)?;
        let message_id = u16::from_be_bytes([buffer[2], buffer[3]]);

        Ok(Header {
            version,
            msg_type,
            option_count,
            code,
            message_id,
        })
    }

    /// Encodes this header into the first [`HEADER_SIZE`] bytes of `buffer`.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<(), Error> {
        if buffer.len() < HEADER_SIZE || self.option_count > 0x0F {
            return Err(Error::OutOfSpace);
        }

        buffer[0] = (self.version << COAP_MSG_VER_OFFS)
            | ((self.msg_type as u8) << COAP_MSG_T_OFFS)
            | (self.option_count & COAP_MSG_OC_MASK);
        buffer[1] = self.code.into();
        let id = self.message_id.to_be_bytes();
        buffer[2] = id[0];
        buffer[3] = id[1];

        Ok(())
    }
}
