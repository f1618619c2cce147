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

//! Critical-option validation (§4.3): a PDU carrying a critical option this
//! endpoint does not recognize must be rejected, and the caller needs to know
//! which unrecognized option numbers triggered the rejection.

use crate::message::Pdu;
use crate::option::OptionNumber;

/// Highest option number this bitmap can represent. Draft-08's largest standard
/// option number is [`OptionNumber::IF_NONE_MATCH`] (21); a 32-bit word covers it
/// with room to spare.
const MAX_ADDRESSABLE_OPTION: u16 = 31;

/// A fixed-size bitmap of option numbers this endpoint recognizes, populated once
/// at startup (§4.3, §9).
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownOptionsBitmap(u32);

impl KnownOptionsBitmap {
    /// An empty bitmap recognizing nothing.
    pub fn new() -> KnownOptionsBitmap {
        KnownOptionsBitmap(0)
    }

    /// The default set this engine registers at startup (§4.3, §9): Content-Type,
    /// Proxy-Uri, Uri-Host, Uri-Port, Uri-Path, Token, Uri-Query.
    pub fn default_known() -> KnownOptionsBitmap {
        let mut bitmap = KnownOptionsBitmap::new();
        for &num in &[
            OptionNumber::CONTENT_TYPE,
            OptionNumber::PROXY_URI,
            OptionNumber::URI_HOST,
            OptionNumber::URI_PORT,
            OptionNumber::URI_PATH,
            OptionNumber::TOKEN,
            OptionNumber::URI_QUERY,
        ] {
            bitmap.set(num);
        }
        bitmap
    }

    /// Marks `num` as known. No-op if `num` exceeds the addressable range.
    pub fn set(&mut self, num: OptionNumber) {
        if num.0 <= MAX_ADDRESSABLE_OPTION {
            self.0 |= 1 << num.0;
        }
    }

    /// Returns true if `num` is within range and marked known.
    pub fn contains(&self, num: OptionNumber) -> bool {
        num.0 <= MAX_ADDRESSABLE_OPTION && (self.0 & (1 << num.0)) != 0
    }
}

/// Validates `pdu`'s options against `known`, per §4.3: every critical
/// (odd-numbered) option must be in `known`, else its number is recorded into
/// `unknown_filter` and the PDU is rejected. An option number beyond the filter's
/// addressable range immediately rejects the PDU (the filter cannot represent it).
///
/// Returns `true` if every critical option was recognized.
pub fn check_critical(pdu: &Pdu, known: &KnownOptionsBitmap, unknown_filter: &mut KnownOptionsBitmap) -> bool {
    let mut ok = true;

    for entry in pdu.options() {
        let (num, _) = match entry {
            Ok(pair) => pair,
            Err(_) => {
                ok = false;
                continue;
            }
        };

        if !num.is_critical() {
            continue;
        }

        if num.0 > MAX_ADDRESSABLE_OPTION {
            return false;
        }

        if !known.contains(num) {
            unknown_filter.set(num);
            ok = false;
        }
    }

    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MsgCode, MsgType, PduBuilder};
    use crate::option::{OptionInsert, OptionInsertExt};

    #[test]
    fn known_critical_option_passes() {
        let known = KnownOptionsBitmap::default_known();
        let mut builder = PduBuilder::new(64, MsgType::Con, MsgCode::MethodGet, 1);
        builder.insert_option(crate::option::URI_PATH, "x").unwrap();
        let pdu = builder.finish(b"").unwrap();

        let mut unknown = KnownOptionsBitmap::new();
        assert!(check_critical(&pdu, &known, &mut unknown));
    }

    #[test]
    fn unknown_critical_option_fails_and_is_recorded() {
        let known = KnownOptionsBitmap::default_known();
        let mut builder = PduBuilder::new(64, MsgType::Con, MsgCode::MethodGet, 1);
        // 17 is odd (critical) and not in the default known set.
        builder.insert_option_empty(OptionNumber(17)).unwrap();
        let pdu = builder.finish(b"").unwrap();

        let mut unknown = KnownOptionsBitmap::new();
        assert!(!check_critical(&pdu, &known, &mut unknown));
        assert!(unknown.contains(OptionNumber(17)));
    }

    #[test]
    fn unknown_non_critical_option_is_ignored() {
        let known = KnownOptionsBitmap::default_known();
        let mut builder = PduBuilder::new(64, MsgType::Con, MsgCode::MethodGet, 1);
        // 2 (Max-Age) is even, so non-critical, and not in the default known set.
        builder.insert_option_with_u32(OptionNumber::MAX_AGE, 10).unwrap();
        let pdu = builder.finish(b"").unwrap();

        let mut unknown = KnownOptionsBitmap::new();
        assert!(check_critical(&pdu, &known, &mut unknown));
        assert!(!unknown.contains(OptionNumber::MAX_AGE));
    }
}
