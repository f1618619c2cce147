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

//! Low-level message codec functions: header bit-packing and the fence-posted
//! delta-coded TLV option format (§3, §4.10).

use super::option::*;
use super::*;

/// Largest option-number delta that fits directly in the 4-bit nibble.
pub const MAX_NIBBLE_DELTA: u16 = 14;

/// Calculates the encoded size of a single TLV option, not including any
/// fence-post options that might be required to reach it.
pub fn calc_option_size(prev_key: OptionNumber, key: OptionNumber, value_len: usize) -> usize {
    let delta = (key - prev_key) as u16;
    debug_assert!(delta <= MAX_NIBBLE_DELTA);

    1 + if value_len >= 15 { value_len + 2 } else { value_len }
}

/// Returns the fence-post option number immediately at or above `n`, i.e. the
/// next multiple of 14 that is `> n` (§6, §4.10).
pub fn fencepost_upper_bound(n: u16) -> u16 {
    ((n / MAX_NIBBLE_DELTA) + 1) * MAX_NIBBLE_DELTA
}

/// Decodes one TLV option from a `core::slice::Iter`, advancing the iterator past it.
/// Does not special-case fence-posts; callers that need to skip them should filter
/// on `OptionNumber::is_fence_post` (see [`OptionIter`]).
pub fn decode_option<'a>(
    iter: &mut core::slice::Iter<'a, u8>,
    last_option: OptionNumber,
) -> Result<Option<(OptionNumber, &'a [u8])>, Error> {
    let header: u8 = match iter.next() {
        Some(x) => *x,
        None => return Ok(None),
    };

    let delta = (header >> 4) as u16;
    if delta == 15 {
        return Err(Error::ParseFailure);
    }

    let len_nibble = header & 0xF;
    let len: usize = if len_nibble == 15 {
        let msb = *iter.next().ok_or(Error::ParseFailure)? as usize;
        let lsb = *iter.next().ok_or(Error::ParseFailure)? as usize;
        15 + (msb << 8) + lsb
    } else {
        len_nibble as usize
    };

    let key = OptionNumber(last_option.0.checked_add(delta).ok_or(Error::ParseFailure)?);

    if len == 0 {
        return Ok(Some((key, &[])));
    }

    if len > iter.as_slice().len() {
        return Err(Error::ParseFailure);
    }

    let value: &'a [u8] = &iter.as_slice()[..len];
    iter.nth(len - 1);

    Ok(Some((key, value)))
}

/// Encodes one TLV option, including its value, into `buffer`. The caller is
/// responsible for inserting any fence-post options needed so that
/// `key - prev_key <= MAX_NIBBLE_DELTA`.
pub fn encode_option(
    buffer: &mut [u8],
    prev_key: OptionNumber,
    key: OptionNumber,
    value: &[u8],
) -> Result<usize, Error> {
    if prev_key > key {
        return Err(Error::InvalidArgument);
    }

    let delta = (key - prev_key) as u16;
    if delta > MAX_NIBBLE_DELTA {
        return Err(Error::InvalidArgument);
    }

    if value.len() > MAX_OPTION_VALUE_SIZE {
        return Err(Error::InvalidArgument);
    }

    let header_len = if value.len() >= 15 { 3 } else { 1 };
    let total = header_len + value.len();
    if total > buffer.len() {
        return Err(Error::OutOfSpace);
    }

    if value.len() >= 15 {
        let ext = value.len() - 15;
        buffer[0] = ((delta as u8) << 4) | 15;
        buffer[1] = (ext >> 8) as u8;
        buffer[2] = ext as u8;
    } else {
        buffer[0] = ((delta as u8) << 4) | (value.len() as u8);
    }

    buffer[header_len..total].copy_from_slice(value);

    Ok(total)
}

/// Encodes a sequence of fence-post options needed to walk `prev_key` forward until
/// it is within `MAX_NIBBLE_DELTA` of `key`, returning the bytes written and the new
/// "previous option number" baseline, and the count of fence-post entries written
/// (needed by callers that must account for them in the header's option-count field).
pub fn encode_fence_posts(
    buffer: &mut [u8],
    mut prev_key: OptionNumber,
    key: OptionNumber,
) -> Result<(usize, OptionNumber, u8), Error> {
    let mut written = 0;
    let mut count = 0u8;

    while (key - prev_key) as u16 > MAX_NIBBLE_DELTA {
        let post = OptionNumber(fencepost_upper_bound(prev_key.0));
        written += encode_option(&mut buffer[written..], prev_key, post, &[])?;
        prev_key = post;
        count += 1;
    }

    Ok((written, prev_key, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fencepost_bounds() {
        assert_eq!(fencepost_upper_bound(0), 14);
        assert_eq!(fencepost_upper_bound(9), 14);
        assert_eq!(fencepost_upper_bound(14), 28);
        assert_eq!(fencepost_upper_bound(28), 42);
    }

    #[test]
    fn option_roundtrip_no_fencepost() {
        let mut buf = [0u8; 32];
        let n = encode_option(&mut buf, OptionNumber(0), OptionNumber(9), b"a").unwrap();
        let mut iter = buf[..n].iter();
        let (key, value) = decode_option(&mut iter, OptionNumber(0)).unwrap().unwrap();
        assert_eq!(key, OptionNumber(9));
        assert_eq!(value, b"a");
    }

    #[test]
    fn option_requires_fencepost_beyond_14() {
        let mut buf = [0u8; 32];
        // URI_QUERY(15) minus URI_HOST(5) straddles no fence-post (10 <= 14, fine),
        // but jumping from 0 straight to option 21 (IF_NONE_MATCH) does require one.
        let (fp_len, baseline, count) =
            encode_fence_posts(&mut buf, OptionNumber(0), OptionNumber::IF_NONE_MATCH).unwrap();
        assert_eq!(baseline, OptionNumber(14));
        assert_eq!(count, 1);
        let n = encode_option(&mut buf[fp_len..], baseline, OptionNumber::IF_NONE_MATCH, &[]).unwrap();

        let mut iter = buf[..fp_len].iter();
        let (fp_key, fp_value) = decode_option(&mut iter, OptionNumber(0)).unwrap().unwrap();
        assert_eq!(fp_key, OptionNumber::FENCE_POST);
        assert!(fp_value.is_empty());

        let mut iter2 = buf[fp_len..fp_len + n].iter();
        let (key, _) = decode_option(&mut iter2, baseline).unwrap().unwrap();
        assert_eq!(key, OptionNumber::IF_NONE_MATCH);
    }

    #[test]
    fn extended_length_value() {
        let mut buf = [0u8; 64];
        let value = [7u8; 40];
        let n = encode_option(&mut buf, OptionNumber(0), OptionNumber(1), &value).unwrap();
        let mut iter = buf[..n].iter();
        let (key, decoded) = decode_option(&mut iter, OptionNumber(0)).unwrap().unwrap();
        assert_eq!(key, OptionNumber(1));
        assert_eq!(decoded, &value[..]);
    }
}
