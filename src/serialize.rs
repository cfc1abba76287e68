//! Endian-portable blob serializer/deserializer (C7).
//!
//! Layout (no alignment padding):
//! ```text
//! offset 0       : 1 byte   endian tag (0 = little, 1 = big)
//! offset 1       : 4 bytes  esc_code, signed, producer endian
//! for s in 0..256: 1 byte   code_len[s] (0 if unused)
//!                  if code_len[s] > 0: 2 bytes code_bits[s], producer endian
//! ```
//! Deserializing rebuilds the decode table directly from the stored codes
//! (§4.4); canonical assignment (§4.3) does not run again on load.

use crate::canonical::CanonicalCode;
use crate::constants::{MAX_CODE_LEN, NUM_SYMBOLS, SERIAL_HEADER_SIZE};
use crate::error::CodecError;

const ENDIAN_TAG_BIG: u8 = 1;
const ENDIAN_TAG_LITTLE: u8 = 0;

fn native_endian_tag() -> u8 {
    if cfg!(target_endian = "big") {
        ENDIAN_TAG_BIG
    } else {
        ENDIAN_TAG_LITTLE
    }
}

/// Write `codes` (and `esc_code`, or `-1` if there is none) into `out`.
/// Returns the number of bytes written, always `<= Codec::MAX_SERIAL_SIZE`.
pub fn serialize(codes: &[CanonicalCode], esc_code: i16, out: &mut [u8]) -> Result<usize, CodecError> {
    let mut by_symbol = [(0u8, 0u16); NUM_SYMBOLS];
    for c in codes {
        by_symbol[c.symbol as usize] = (c.len, c.bits);
    }

    let needed = SERIAL_HEADER_SIZE + codes.len() * 2 + (NUM_SYMBOLS - codes.len());
    if out.len() < needed {
        return Err(CodecError::AllocationFailure);
    }

    out[0] = native_endian_tag();
    out[1..5].copy_from_slice(&(esc_code as i32).to_ne_bytes());

    let mut cursor = SERIAL_HEADER_SIZE;
    for &(len, bits) in by_symbol.iter() {
        out[cursor] = len;
        cursor += 1;
        if len > 0 {
            out[cursor..cursor + 2].copy_from_slice(&bits.to_ne_bytes());
            cursor += 2;
        }
    }

    Ok(cursor)
}

/// Parse a blob written by [`serialize`]. Returns the reconstructed codes
/// (in symbol order) and the escape code.
pub fn deserialize(blob: &[u8]) -> Result<(Vec<CanonicalCode>, i16), CodecError> {
    if blob.len() < SERIAL_HEADER_SIZE {
        return Err(CodecError::CorruptBlob("blob shorter than the header"));
    }

    let tag = blob[0];
    if tag != ENDIAN_TAG_LITTLE && tag != ENDIAN_TAG_BIG {
        return Err(CodecError::CorruptBlob("unrecognized endian tag"));
    }
    if tag != native_endian_tag() {
        log::debug!(
            "deserializing a blob written by a {}-endian host on a {}-endian one",
            if tag == ENDIAN_TAG_BIG { "big" } else { "little" },
            if native_endian_tag() == ENDIAN_TAG_BIG { "big" } else { "little" },
        );
    }

    let esc_bytes: [u8; 4] = blob[1..5].try_into().unwrap();
    let esc_code_wide = if tag == ENDIAN_TAG_BIG {
        i32::from_be_bytes(esc_bytes)
    } else {
        i32::from_le_bytes(esc_bytes)
    };
    if esc_code_wide < -1 || esc_code_wide > 255 {
        return Err(CodecError::CorruptBlob("escape code out of range"));
    }
    let esc_code = esc_code_wide as i16;

    let mut codes = Vec::new();
    let mut cursor = SERIAL_HEADER_SIZE;
    for symbol in 0..NUM_SYMBOLS {
        if cursor >= blob.len() {
            return Err(CodecError::CorruptBlob("blob truncated inside the symbol table"));
        }
        let len = blob[cursor];
        cursor += 1;
        if len == 0 {
            continue;
        }
        if len as usize > MAX_CODE_LEN {
            return Err(CodecError::CorruptBlob("symbol code length out of range"));
        }
        if cursor + 2 > blob.len() {
            return Err(CodecError::CorruptBlob("blob truncated before a code word"));
        }
        let bits_bytes: [u8; 2] = blob[cursor..cursor + 2].try_into().unwrap();
        let bits = if tag == ENDIAN_TAG_BIG {
            u16::from_be_bytes(bits_bytes)
        } else {
            u16::from_le_bytes(bits_bytes)
        };
        cursor += 2;
        codes.push(CanonicalCode {
            symbol: symbol as u8,
            len,
            bits,
        });
    }

    Ok((codes, esc_code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::assign_codes;
    use crate::constants::MAX_SERIAL_SIZE;

    #[test]
    fn round_trips_with_escape() {
        let codes = assign_codes(vec![(b'a', 1), (b'b', 2), (b'c', 3)]);
        let mut buf = [0u8; MAX_SERIAL_SIZE];
        let n = serialize(&codes, 42, &mut buf).unwrap();
        let (out_codes, esc) = deserialize(&buf[..n]).unwrap();
        let mut expected = codes.clone();
        expected.sort_by_key(|c| c.symbol);
        let mut actual = out_codes;
        actual.sort_by_key(|c| c.symbol);
        assert_eq!(actual, expected);
        assert_eq!(esc, 42);
    }

    #[test]
    fn round_trips_without_escape() {
        let codes = assign_codes(vec![(b'x', 4)]);
        let mut buf = [0u8; MAX_SERIAL_SIZE];
        let n = serialize(&codes, -1, &mut buf).unwrap();
        let (out_codes, esc) = deserialize(&buf[..n]).unwrap();
        assert_eq!(out_codes, codes);
        assert_eq!(esc, -1);
    }

    #[test]
    fn max_size_never_exceeded_for_a_full_alphabet() {
        let lengths: Vec<(u8, u8)> = (0..=255u8).map(|s| (s, 8)).collect();
        let codes = assign_codes(lengths);
        let mut buf = [0u8; MAX_SERIAL_SIZE];
        let n = serialize(&codes, -1, &mut buf).unwrap();
        assert!(n <= MAX_SERIAL_SIZE);
        assert_eq!(n, MAX_SERIAL_SIZE);
    }

    #[test]
    fn rejects_truncated_blob() {
        let codes = assign_codes(vec![(b'a', 1), (b'b', 2)]);
        let mut buf = [0u8; MAX_SERIAL_SIZE];
        let n = serialize(&codes, -1, &mut buf).unwrap();
        assert!(deserialize(&buf[..n - 1]).is_err());
    }

    #[test]
    fn rejects_out_of_range_code_length() {
        let mut buf = [0u8; MAX_SERIAL_SIZE];
        buf[0] = native_endian_tag();
        buf[1..5].copy_from_slice(&(-1i32).to_ne_bytes());
        buf[5] = 200; // invalid length for symbol 0
        assert!(deserialize(&buf[..6]).is_err());
    }

    #[test]
    fn too_small_output_buffer_errors() {
        let codes = assign_codes(vec![(b'a', 1), (b'b', 2)]);
        let mut buf = [0u8; 6];
        assert!(serialize(&codes, -1, &mut buf).is_err());
    }

    /// A blob tagged with the opposite endian from the local machine still
    /// deserializes correctly: the tag, not the local target, decides how
    /// the multi-byte fields are read back.
    #[test]
    fn deserializes_a_blob_tagged_with_the_foreign_endian() {
        let foreign_tag = if native_endian_tag() == ENDIAN_TAG_BIG {
            ENDIAN_TAG_LITTLE
        } else {
            ENDIAN_TAG_BIG
        };

        let codes = assign_codes(vec![(b'a', 1), (b'b', 2), (b'c', 3)]);
        let mut by_symbol = [(0u8, 0u16); 256];
        for c in &codes {
            by_symbol[c.symbol as usize] = (c.len, c.bits);
        }

        let esc_code: i32 = 42;
        let mut blob = vec![0u8; MAX_SERIAL_SIZE];
        blob[0] = foreign_tag;
        blob[1..5].copy_from_slice(&if foreign_tag == ENDIAN_TAG_BIG {
            esc_code.to_be_bytes()
        } else {
            esc_code.to_le_bytes()
        });
        let mut cursor = 5;
        for &(len, bits) in by_symbol.iter() {
            blob[cursor] = len;
            cursor += 1;
            if len > 0 {
                blob[cursor..cursor + 2].copy_from_slice(&if foreign_tag == ENDIAN_TAG_BIG {
                    bits.to_be_bytes()
                } else {
                    bits.to_le_bytes()
                });
                cursor += 2;
            }
        }

        let (out_codes, esc) = deserialize(&blob[..cursor]).unwrap();
        let mut expected = codes.clone();
        expected.sort_by_key(|c| c.symbol);
        let mut actual = out_codes;
        actual.sort_by_key(|c| c.symbol);
        assert_eq!(actual, expected);
        assert_eq!(esc, 42);
    }
}
