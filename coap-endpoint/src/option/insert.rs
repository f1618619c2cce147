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
use core::convert::Into;

/// Trait for types that build up a CoAP option list in non-decreasing option-number
/// order. Implementors insert fence-post options automatically whenever the delta
/// to the next option would not fit in the 4-bit nibble (§4.10).
pub trait OptionInsert {
    /// Appends an option with the given bytes as its value.
    /// `key` must be `>=` the last option inserted.
    fn insert_option_with_bytes(&mut self, key: OptionNumber, value: &[u8]) -> Result<(), Error>;

    /// Appends an option with no value.
    fn insert_option_empty(&mut self, key: OptionNumber) -> Result<(), Error> {
        self.insert_option_with_bytes(key, &[])
    }

    /// Appends an option with a string value.
    fn insert_option_with_str(&mut self, key: OptionNumber, value: &str) -> Result<(), Error> {
        self.insert_option_with_bytes(key, value.as_bytes())
    }

    /// Appends an option with an integer value.
    fn insert_option_with_u32(&mut self, key: OptionNumber, value: u32) -> Result<(), Error> {
        self.insert_option_with_bytes(key, crate::util::encode_u32(value, &mut [0; 4]))
    }
}

/// Extension trait for inserting a typed option value via its [`OptionKey`].
pub trait OptionInsertExt {
    /// Appends an option whose value type is determined by the given key.
    fn insert_option<'a, T>(&mut self, key: OptionKey<T>, value: T) -> Result<(), Error>
    where
        T: Into<OptionValue<'a>>;
}

impl<O> OptionInsertExt for O
where
    O: OptionInsert + ?Sized,
{
    fn insert_option<'a, T>(&mut self, key: OptionKey<T>, value: T) -> Result<(), Error>
    where
        T: Into<OptionValue<'a>>,
    {
        match value.into() {
            OptionValue::Integer(x) => self.insert_option_with_u32(key.0, x),
            OptionValue::Bytes(x) => self.insert_option_with_bytes(key.0, x),
            OptionValue::ETag(x) => self.insert_option_with_bytes(key.0, x.as_bytes()),
        }
    }
}
