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

/// Type representing a CoAP option number.
///
/// Numbers follow the fence-posted draft option table described in §3/§6: odd
/// numbers are critical, and 14 is reserved for zero-length fence-post entries.
#[derive(Copy, Eq, PartialEq, Hash, Clone, Ord, PartialOrd)]
pub struct OptionNumber(pub u16);

impl OptionNumber {
    /// CONTENT_TYPE option.
    pub const CONTENT_TYPE: OptionNumber = OptionNumber(1);

    /// MAX_AGE option.
    pub const MAX_AGE: OptionNumber = OptionNumber(2);

    /// PROXY_URI option.
    pub const PROXY_URI: OptionNumber = OptionNumber(3);

    /// ETAG option.
    pub const ETAG: OptionNumber = OptionNumber(4);

    /// URI_HOST option.
    pub const URI_HOST: OptionNumber = OptionNumber(5);

    /// LOCATION_PATH option.
    pub const LOCATION_PATH: OptionNumber = OptionNumber(6);

    /// URI_PORT option.
    pub const URI_PORT: OptionNumber = OptionNumber(7);

    /// LOCATION_QUERY option.
    pub const LOCATION_QUERY: OptionNumber = OptionNumber(8);

    /// URI_PATH option.
    pub const URI_PATH: OptionNumber = OptionNumber(9);

    /// OBSERVE option.
    pub const OBSERVE: OptionNumber = OptionNumber(10);

    /// TOKEN option.
    pub const TOKEN: OptionNumber = OptionNumber(11);

    /// ACCEPT option.
    pub const ACCEPT: OptionNumber = OptionNumber(12);

    /// IF_MATCH option.
    pub const IF_MATCH: OptionNumber = OptionNumber(13);

    /// Zero-length fence-post option, inserted by the encoder whenever the delta to
    /// the next option would otherwise exceed 14 (§4.10, §6).
    pub const FENCE_POST: OptionNumber = OptionNumber(14);

    /// URI_QUERY option.
    pub const URI_QUERY: OptionNumber = OptionNumber(15);

    /// IF_NONE_MATCH option.
    pub const IF_NONE_MATCH: OptionNumber = OptionNumber(21);

    /// Returns true if this option number is critical (odd), per §4.3/§9.
    pub fn is_critical(self) -> bool {
        self.0 & 1 == 1
    }

    /// Returns true if this is the zero-length fence-post option.
    pub fn is_fence_post(self) -> bool {
        self == OptionNumber::FENCE_POST
    }

    /// Returns the expected value type for this option number.
    pub fn option_value_type(self) -> OptionValueType {
        match self {
            OptionNumber::CONTENT_TYPE => OptionValueType::Integer,
            OptionNumber::MAX_AGE => OptionValueType::Integer,
            OptionNumber::PROXY_URI => OptionValueType::String,
            OptionNumber::ETAG => OptionValueType::Opaque,
            OptionNumber::URI_HOST => OptionValueType::String,
            OptionNumber::LOCATION_PATH => OptionValueType::String,
            OptionNumber::URI_PORT => OptionValueType::Integer,
            OptionNumber::LOCATION_QUERY => OptionValueType::String,
            OptionNumber::URI_PATH => OptionValueType::String,
            OptionNumber::OBSERVE => OptionValueType::Integer,
            OptionNumber::TOKEN => OptionValueType::Opaque,
            OptionNumber::ACCEPT => OptionValueType::Integer,
            OptionNumber::IF_MATCH => OptionValueType::Opaque,
            OptionNumber::FENCE_POST => OptionValueType::Opaque,
            OptionNumber::URI_QUERY => OptionValueType::String,
            OptionNumber::IF_NONE_MATCH => OptionValueType::Flag,
            OptionNumber(_) => OptionValueType::Opaque,
        }
    }

    /// Attempts to return a `Some(&'static str)` containing the name of the option.
    pub fn static_name(self) -> Option<&'static str> {
        match self {
            OptionNumber::CONTENT_TYPE => Some("Content-Type"),
            OptionNumber::MAX_AGE => Some("Max-Age"),
            OptionNumber::PROXY_URI => Some("Proxy-Uri"),
            OptionNumber::ETAG => Some("ETag"),
            OptionNumber::URI_HOST => Some("Uri-Host"),
            OptionNumber::LOCATION_PATH => Some("Location-Path"),
            OptionNumber::URI_PORT => Some("Uri-Port"),
            OptionNumber::LOCATION_QUERY => Some("Location-Query"),
            OptionNumber::URI_PATH => Some("Uri-Path"),
            OptionNumber::OBSERVE => Some("Observe"),
            OptionNumber::TOKEN => Some("Token"),
            OptionNumber::ACCEPT => Some("Accept"),
            OptionNumber::IF_MATCH => Some("If-Match"),
            OptionNumber::FENCE_POST => Some("Fence-Post"),
            OptionNumber::URI_QUERY => Some("Uri-Query"),
            OptionNumber::IF_NONE_MATCH => Some("If-None-Match"),
            _ => None,
        }
    }
}

impl core::fmt::Display for OptionNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(name) = self.static_name() {
            f.write_str(name)
        } else if self.is_critical() {
            write!(f, "Crit-{}", self.0)
        } else {
            write!(f, "Opt-{}", self.0)
        }
    }
}

impl core::fmt::Debug for OptionNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}({})", self.0, self)
    }
}

impl Default for OptionNumber {
    fn default() -> Self {
        OptionNumber(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criticality_matches_odd_numbering() {
        assert!(OptionNumber::CONTENT_TYPE.is_critical());
        assert!(OptionNumber::PROXY_URI.is_critical());
        assert!(OptionNumber::URI_HOST.is_critical());
        assert!(OptionNumber::URI_PORT.is_critical());
        assert!(OptionNumber::URI_PATH.is_critical());
        assert!(OptionNumber::TOKEN.is_critical());
        assert!(OptionNumber::URI_QUERY.is_critical());
        assert!(OptionNumber(17).is_critical());

        assert!(!OptionNumber::MAX_AGE.is_critical());
        assert!(!OptionNumber::ETAG.is_critical());
        assert!(!OptionNumber::LOCATION_PATH.is_critical());
        assert!(!OptionNumber::OBSERVE.is_critical());
        assert!(!OptionNumber::ACCEPT.is_critical());
        assert!(!OptionNumber::FENCE_POST.is_critical());
    }
}
