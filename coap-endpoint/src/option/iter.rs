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

/// The "unchecked" option walker (§4.10): visits every TLV entry in the option
/// byte range, including fence-posts. Used only to count exactly `option_count`
/// entries and locate the payload boundary (§4.5 step 4); semantic consumers
/// must use [`OptionIter`] instead.
#[derive(Debug, Clone)]
pub struct RawOptionIter<'a> {
    iter: core::slice::Iter<'a, u8>,
    last_option: OptionNumber,
}

impl<'a> RawOptionIter<'a> {
    /// Creates a new instance of a `RawOptionIter` over the given byte slice.
    pub fn new(buffer: &'a [u8]) -> RawOptionIter<'a> {
        RawOptionIter {
            iter: buffer.iter(),
            last_option: Default::default(),
        }
    }

    /// Returns the unread remaining bytes as a slice.
    pub fn as_slice(&self) -> &'a [u8] {
        self.iter.as_slice()
    }
}

impl<'a> Iterator for RawOptionIter<'a> {
    type Item = Result<(OptionNumber, &'a [u8]), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let ret = decode_option(&mut self.iter, self.last_option).transpose();
        if let Some(Ok((key, _))) = ret {
            self.last_option = key;
        }
        ret
    }
}

impl Default for RawOptionIter<'_> {
    fn default() -> Self {
        RawOptionIter::new(&[])
    }
}

/// Advances `iter` past exactly `count` TLV entries (fence-posts included),
/// returning the byte offset at which the payload begins. This is the
/// "unchecked options walker" called out in §4.5 step 4.
pub fn skip_n_options(buffer: &[u8], count: usize) -> Result<usize, Error> {
    let mut iter = RawOptionIter::new(buffer);
    for _ in 0..count {
        iter.next().ok_or(Error::ParseFailure)??;
    }
    Ok(buffer.len() - iter.as_slice().len())
}

/// The "official" option walker (§4.10): wraps [`RawOptionIter`] and filters out
/// fence-post entries (option number 14, zero length). This is the iterator every
/// semantic consumer (critical-option validation, option lookup, option copying)
/// must use.
#[derive(Debug, Clone)]
pub struct OptionIter<'a> {
    raw: RawOptionIter<'a>,
}

impl<'a> OptionIter<'a> {
    /// Creates a new instance of an `OptionIter` over the given byte slice.
    pub fn new(buffer: &'a [u8]) -> OptionIter<'a> {
        OptionIter {
            raw: RawOptionIter::new(buffer),
        }
    }

    /// Returns the unread remaining options as a byte slice.
    pub fn as_slice(&self) -> &'a [u8] {
        self.raw.as_slice()
    }

    /// Peek ahead to the next non-fence-post option without advancing the iterator.
    pub fn peek(&self) -> Option<Result<(OptionNumber, &'a [u8]), Error>> {
        self.clone().next()
    }
}

impl<'a> Iterator for OptionIter<'a> {
    type Item = Result<(OptionNumber, &'a [u8]), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.raw.next()? {
                Ok((key, _)) if key.is_fence_post() => continue,
                other => return Some(other),
            }
        }
    }
}

impl AsRef<[u8]> for OptionIter<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Extension trait for option iterators that provide additional convenient accessors.
pub trait OptionIterExt<'a>: Iterator<Item = Result<(OptionNumber, &'a [u8]), Error>> {
    /// Moves the iterator forward until it finds a matching key or the
    /// spot where it should have been. Does not consume options past the match.
    fn find_next(&mut self, key: OptionNumber) -> Option<Result<(OptionNumber, &'a [u8]), Error>>;

    /// Typed version of [`OptionIterExt::find_next`].
    fn find_next_of<T>(&mut self, key: OptionKey<T>) -> Option<Result<T, Error>>
    where
        T: TryOptionValueFrom<'a> + Sized,
    {
        match self.find_next(key.0)? {
            Ok((_, value)) => match T::try_option_value_from(value) {
                Some(x) => Some(Ok(x)),
                None => Some(Err(Error::ParseFailure)),
            },
            Err(e) => Some(Err(e)),
        }
    }
}

impl<'a, I> OptionIterExt<'a> for I
where
    I: Iterator<Item = Result<(OptionNumber, &'a [u8]), Error>> + Sized + Clone,
{
    fn find_next(&mut self, key: OptionNumber) -> Option<Result<(OptionNumber, &'a [u8]), Error>> {
        loop {
            let mut lookahead = self.clone();

            match lookahead.next()? {
                Err(e) => return Some(Err(e)),
                Ok((number, value)) => {
                    if number == key {
                        *self = lookahead;
                        return Some(Ok((number, value)));
                    }
                    if number < key {
                        *self = lookahead;
                        continue;
                    }
                }
            };

            return None;
        }
    }
}
