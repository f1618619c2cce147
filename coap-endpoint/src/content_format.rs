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

use std::borrow::Cow;

/// A type for representing a CoAP Content-Type value (§3, §4.7, §4.11).
#[derive(Debug, Copy, Eq, PartialEq, Hash, Clone, Ord, PartialOrd)]
pub struct ContentFormat(pub u16);

impl ContentFormat {
    /// `text/plain`, used on canned error responses (§4.7).
    pub const TEXT_PLAIN_UTF8: ContentFormat = ContentFormat(0);

    /// `application/link-format`, used on `.well-known/core` responses (§4.11).
    pub const APPLICATION_LINK_FORMAT: ContentFormat = ContentFormat(40);

    /// `application/octet-stream`, the default for resource handler payloads.
    pub const APPLICATION_OCTET_STREAM: ContentFormat = ContentFormat(42);

    /// Returns the MIME name of this content format as a `&'static str`, if known.
    pub fn static_name(self) -> Option<&'static str> {
        Some(match self {
            Self::TEXT_PLAIN_UTF8 => "text/plain;charset=utf-8",
            Self::APPLICATION_LINK_FORMAT => "application/link-format",
            Self::APPLICATION_OCTET_STREAM => "application/octet-stream",
            _ => return None,
        })
    }

    /// Returns a MIME name for this content format.
    pub fn name(&self) -> Cow<'static, str> {
        if let Some(name) = self.static_name() {
            Cow::from(name)
        } else {
            Cow::from(self.to_string())
        }
    }
}

impl core::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(n) = self.static_name() {
            f.write_str(n)
        } else {
            write!(f, "application/x-coap-{}", self.0)
        }
    }
}

impl Default for ContentFormat {
    fn default() -> Self {
        ContentFormat::TEXT_PLAIN_UTF8
    }
}
