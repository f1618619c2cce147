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

/// Appends options into a caller-supplied buffer in non-decreasing option-number
/// order, inserting fence-posts as needed (§4.10).
#[derive(Debug)]
pub struct OptionEncoder<'a> {
    buffer: &'a mut [u8],
    len: usize,
    last_option: OptionNumber,
}

impl<'a> OptionEncoder<'a> {
    /// Creates a new encoder writing into `buffer`.
    pub fn new(buffer: &'a mut [u8]) -> OptionEncoder<'a> {
        OptionEncoder {
            buffer,
            len: 0,
            last_option: Default::default(),
        }
    }

    /// Returns the number of bytes written so far.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Splits the buffer into (written option bytes, unused remainder).
    pub fn finish(self) -> (&'a mut [u8], &'a mut [u8]) {
        self.buffer.split_at_mut(self.len)
    }
}

impl<'a> OptionInsert for OptionEncoder<'a> {
    fn insert_option_with_bytes(&mut self, key: OptionNumber, value: &[u8]) -> Result<(), Error> {
        if key < self.last_option {
            return Err(Error::InvalidArgument);
        }

        let (fp_len, baseline, _) = encode_fence_posts(&mut self.buffer[self.len..], self.last_option, key)?;
        self.len += fp_len;

        let n = encode_option(&mut self.buffer[self.len..], baseline, key, value)?;
        self.len += n;
        self.last_option = key;

        Ok(())
    }
}
