//! Canonical code assignment from a set of `(symbol, length)` pairs (C3).

use crate::constants::MAX_CODE_LEN;

/// One symbol's finished canonical code: `bits` holds the code value
/// right-justified (i.e. the code's most significant bit is bit `len - 1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanonicalCode {
    pub symbol: u8,
    pub len: u8,
    pub bits: u16,
}

/// Assign canonical codes given each symbol's code length.
///
/// Symbols are sorted by `(length, symbol)` ascending. The first (shortest)
/// symbol gets the all-ones code of its own length. Each later symbol's code
/// comes from the previous one by: stripping trailing zero bits (undoing
/// padding from a previous length change) while decrementing the running
/// length to match, decrementing the running code by one, then re-extending
/// the running length up to the new symbol's length by shifting in set bits.
pub fn assign_codes(mut lengths: Vec<(u8, u8)>) -> Vec<CanonicalCode> {
    lengths.sort_by_key(|&(symbol, len)| (len, symbol));

    let mut codes = Vec::with_capacity(lengths.len());
    let mut iter = lengths.into_iter();

    let Some((first_symbol, first_len)) = iter.next() else {
        return codes;
    };
    debug_assert!(first_len as usize >= 1 && first_len as usize <= MAX_CODE_LEN);

    let mut running_code: u32 = (1u32 << first_len) - 1;
    let mut running_len: u8 = first_len;
    codes.push(CanonicalCode {
        symbol: first_symbol,
        len: first_len,
        bits: running_code as u16,
    });

    for (symbol, len) in iter {
        debug_assert!(len as usize >= 1 && len as usize <= MAX_CODE_LEN);

        while running_len > 0 && running_code & 1 == 0 {
            running_code >>= 1;
            running_len -= 1;
        }
        running_code -= 1;
        while running_len < len {
            running_code = (running_code << 1) | 1;
            running_len += 1;
        }

        codes.push(CanonicalCode {
            symbol,
            len,
            bits: running_code as u16,
        });
    }

    codes
}
