/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! A minimal DER codec for `SEQUENCE { INTEGER, ... }` structures.
//!
//! This covers the two structures exchanged with the key and signature primitives: ECDSA
//! signatures (`Ecdsa-Sig-Value`, RFC 3279) and PKCS #1 `RSAPublicKey` / `RSAPrivateKey`
//! (RFC 8017, Appendix A.1). Every integer is treated as unsigned and handed out as its minimal
//! big-endian byte string. Decoding is strict: the input must be exactly one sequence with
//! definite, minimally encoded lengths and minimally encoded non-negative integers.

use crate::error::{Error, Fallible};

const TAG_INTEGER: u8 = 0x02;
const TAG_SEQUENCE: u8 = 0x30;

/// Encode `integers`, each a big-endian unsigned integer, as a DER `SEQUENCE` of `INTEGER`s.
pub(crate) fn encode_integer_sequence(integers: &[&[u8]]) -> Vec<u8> {
    let mut content = Vec::new();
    for integer in integers {
        encode_unsigned_integer(&mut content, integer);
    }

    let mut output = Vec::with_capacity(content.len() + 6);
    output.push(TAG_SEQUENCE);
    encode_length(&mut output, content.len());
    output.extend_from_slice(&content);
    output
}

/// Decode a DER `SEQUENCE` of `INTEGER`s into the minimal big-endian byte strings of its
/// unsigned integers. Zero decodes to a single zero byte.
pub(crate) fn decode_integer_sequence(data: &[u8]) -> Fallible<Vec<Vec<u8>>> {
    let mut reader = Reader { data };
    let mut sequence = Reader {
        data: reader.read_element(TAG_SEQUENCE)?,
    };
    if !reader.data.is_empty() {
        return Err(Error::Data(Some(
            "Trailing data after DER sequence".to_string(),
        )));
    }

    let mut integers = Vec::new();
    while !sequence.data.is_empty() {
        let content = sequence.read_element(TAG_INTEGER)?;
        integers.push(decode_unsigned_integer(content)?.to_vec());
    }
    Ok(integers)
}

fn encode_length(output: &mut Vec<u8>, length: usize) {
    if length < 0x80 {
        output.push(length as u8);
        return;
    }
    let bytes = length.to_be_bytes();
    let skip = bytes.iter().take_while(|byte| **byte == 0).count();
    output.push(0x80 | (bytes.len() - skip) as u8);
    output.extend_from_slice(&bytes[skip..]);
}

fn encode_unsigned_integer(output: &mut Vec<u8>, integer: &[u8]) {
    let skip = integer.iter().take_while(|byte| **byte == 0).count();
    let magnitude = &integer[skip..];
    // The sign bit must stay clear.
    let needs_padding = magnitude.first().is_none_or(|byte| byte & 0x80 != 0);

    output.push(TAG_INTEGER);
    encode_length(output, magnitude.len() + usize::from(needs_padding));
    if needs_padding {
        output.push(0);
    }
    output.extend_from_slice(magnitude);
}

fn decode_unsigned_integer(content: &[u8]) -> Fallible<&[u8]> {
    match content {
        [] => Err(Error::Data(Some("Empty DER integer".to_string()))),
        [first, ..] if first & 0x80 != 0 => {
            Err(Error::Data(Some("Negative DER integer".to_string())))
        },
        [0] => Ok(content),
        [0, second, ..] if second & 0x80 == 0 => Err(Error::Data(Some(
            "DER integer is not minimally encoded".to_string(),
        ))),
        [0, rest @ ..] => Ok(rest),
        _ => Ok(content),
    }
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn read_byte(&mut self) -> Fallible<u8> {
        let (first, rest) = self
            .data
            .split_first()
            .ok_or_else(|| Error::Data(Some("Truncated DER data".to_string())))?;
        self.data = rest;
        Ok(*first)
    }

    fn read_length(&mut self) -> Fallible<usize> {
        let first = self.read_byte()?;
        if first < 0x80 {
            return Ok(first as usize);
        }

        let count = (first & 0x7f) as usize;
        if count == 0 {
            return Err(Error::Data(Some(
                "Indefinite length is not allowed in DER".to_string(),
            )));
        }
        if count > 4 {
            return Err(Error::Data(Some("DER length is too large".to_string())));
        }

        let mut length = 0usize;
        for index in 0..count {
            let byte = self.read_byte()?;
            if index == 0 && byte == 0 {
                return Err(Error::Data(Some(
                    "DER length is not minimally encoded".to_string(),
                )));
            }
            length = (length << 8) | byte as usize;
        }
        if length < 0x80 {
            return Err(Error::Data(Some(
                "DER length is not minimally encoded".to_string(),
            )));
        }
        Ok(length)
    }

    /// Read one element with the given tag and return its content.
    fn read_element(&mut self, tag: u8) -> Fallible<&'a [u8]> {
        let actual = self.read_byte()?;
        if actual != tag {
            return Err(Error::Data(Some(format!(
                "Unexpected DER tag {actual:#04x}, expected {tag:#04x}"
            ))));
        }

        let length = self.read_length()?;
        if length > self.data.len() {
            return Err(Error::Data(Some(
                "DER length exceeds the available data".to_string(),
            )));
        }
        let (content, rest) = self.data.split_at(length);
        self.data = rest;
        Ok(content)
    }
}

#[cfg(test)]
mod test {
    use super::{decode_integer_sequence, encode_integer_sequence};

    #[test]
    fn test_encode_small_integers() {
        let integers: [&[u8]; 4] = [&[0x01], &[0x00, 0x7f], &[0x80], &[]];
        assert_eq!(
            encode_integer_sequence(&integers),
            vec![
                0x30, 0x0d, 0x02, 0x01, 0x01, 0x02, 0x01, 0x7f, 0x02, 0x02, 0x00, 0x80, 0x02,
                0x01, 0x00,
            ]
        );
    }

    #[test]
    fn test_high_bit_gets_a_single_padding_byte() {
        let encoded = encode_integer_sequence(&[&[0xff, 0x01]]);
        assert_eq!(encoded, vec![0x30, 0x05, 0x02, 0x03, 0x00, 0xff, 0x01]);
        assert_eq!(decode_integer_sequence(&encoded).unwrap(), vec![vec![0xff, 0x01]]);
    }

    #[test]
    fn test_long_integers_round_trip() {
        let big: Vec<u8> = (0..1950).map(|index| (index * 7 + 0x81) as u8).collect();
        let small = [0x42u8; 3];
        let integers: [&[u8]; 2] = [&big, &small];
        let encoded = encode_integer_sequence(&integers);
        assert_eq!(&encoded[..4], &[0x30, 0x82, 0x07, 0xa8]);
        assert_eq!(
            decode_integer_sequence(&encoded).unwrap(),
            vec![big.clone(), small.to_vec()]
        );
    }

    #[test]
    fn test_redundant_leading_zeros_are_stripped() {
        let encoded = encode_integer_sequence(&[&[0x00, 0x00, 0x12, 0x34]]);
        assert_eq!(encoded, vec![0x30, 0x04, 0x02, 0x02, 0x12, 0x34]);
    }

    #[test]
    fn test_zero() {
        let encoded = encode_integer_sequence(&[&[0x00, 0x00]]);
        assert_eq!(encoded, vec![0x30, 0x03, 0x02, 0x01, 0x00]);
        assert_eq!(decode_integer_sequence(&encoded).unwrap(), vec![vec![0x00]]);
    }

    #[test]
    fn test_trailing_and_missing_bytes_are_rejected() {
        let integers: [&[u8]; 2] = [&[0x01, 0x02], &[0x03]];
        let encoded = encode_integer_sequence(&integers);

        let mut trailing = encoded.clone();
        trailing.push(0x00);
        assert!(decode_integer_sequence(&trailing).is_err());

        let missing = &encoded[..encoded.len() - 1];
        assert!(decode_integer_sequence(missing).is_err());

        // Sequence length claims one byte less than the content.
        let mut short = encoded.clone();
        short[1] -= 1;
        assert!(decode_integer_sequence(&short).is_err());
    }

    #[test]
    fn test_non_canonical_input_is_rejected() {
        // Not a sequence.
        assert!(decode_integer_sequence(&[0x31, 0x03, 0x02, 0x01, 0x01]).is_err());
        // Wrong element tag.
        assert!(decode_integer_sequence(&[0x30, 0x03, 0x04, 0x01, 0x01]).is_err());
        // Negative integer.
        assert!(decode_integer_sequence(&[0x30, 0x03, 0x02, 0x01, 0x80]).is_err());
        // Unnecessary padding byte.
        assert!(decode_integer_sequence(&[0x30, 0x04, 0x02, 0x02, 0x00, 0x7f]).is_err());
        // Empty integer.
        assert!(decode_integer_sequence(&[0x30, 0x02, 0x02, 0x00]).is_err());
        // Indefinite length.
        assert!(decode_integer_sequence(&[0x30, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00]).is_err());
        // Long form for a short length.
        assert!(decode_integer_sequence(&[0x30, 0x81, 0x03, 0x02, 0x01, 0x01]).is_err());
        // Nothing at all.
        assert!(decode_integer_sequence(&[]).is_err());
    }

    #[test]
    fn test_empty_sequence() {
        assert_eq!(decode_integer_sequence(&[0x30, 0x00]).unwrap(), Vec::<Vec<u8>>::new());
    }
}
