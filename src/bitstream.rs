//! Bit-level stream encoder/decoder (C5, C6).
//!
//! Unlike the donor's `BitStream`, which reads a chunked `DeflateInput`
//! refilled word-at-a-time for a long-lived decompressor, this codec always
//! works over one in-memory buffer end to end, so the bit buffer here is a
//! plain accumulator rather than something that needs a refill strategy.

use nightly_quirks::branch_pred::unlikely;

use crate::constants::RAW_FALLBACK_SENTINEL;
use crate::decode_table::DecodeEntry;
use crate::error::CodecError;

/// Per-symbol `(code bits, code length)`; `len == 0` means "no assigned code".
pub type EncodeTable = [(u16, u8); 256];

struct BitWriter {
    acc: u64,
    nbits: u32,
    out: Vec<u8>,
}

impl BitWriter {
    fn new(size_hint: usize) -> Self {
        Self {
            acc: 0,
            nbits: 0,
            out: Vec::with_capacity(size_hint),
        }
    }

    #[inline(always)]
    fn push(&mut self, bits: u16, len: u8) {
        self.acc = (self.acc << len) | bits as u64;
        self.nbits += len as u32;
        while self.nbits >= 8 {
            self.nbits -= 8;
            self.out.push((self.acc >> self.nbits) as u8);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.out.push((self.acc << (8 - self.nbits)) as u8);
        }
        self.out
    }
}

struct BitReader<'a> {
    input: &'a [u8],
    bit_pos: usize,
    total_bits: usize,
}

impl<'a> BitReader<'a> {
    fn new(input: &'a [u8], total_bits: usize) -> Self {
        Self {
            input,
            bit_pos: 0,
            total_bits,
        }
    }

    #[inline(always)]
    fn remaining(&self) -> usize {
        self.total_bits - self.bit_pos
    }

    /// Next 16 bits from the current position, MSB first, zero-padded past
    /// the end of `input`. Safe to call even with fewer than 16 bits left;
    /// callers check `remaining()` before trusting a decoded length.
    #[inline(always)]
    fn peek16(&self) -> u16 {
        let mut window: u32 = 0;
        for i in 0..3usize {
            let byte_index = self.bit_pos / 8 + i;
            let byte = self.input.get(byte_index).copied().unwrap_or(0);
            window = (window << 8) | byte as u32;
        }
        let bit_offset = self.bit_pos % 8;
        let shift = 24 - bit_offset - 16;
        ((window >> shift) & 0xFFFF) as u16
    }

    #[inline(always)]
    fn consume(&mut self, n: usize) {
        self.bit_pos += n;
    }

    fn read_bits(&mut self, n: usize) -> u32 {
        debug_assert!(n <= 16);
        let value = (self.peek16() as u32) >> (16 - n);
        self.consume(n);
        value
    }
}

#[cfg(target_endian = "big")]
const ENDIAN_SENTINEL: u16 = 0b10;
#[cfg(not(target_endian = "big"))]
const ENDIAN_SENTINEL: u16 = 0b00;

/// Encode `input` against `table`/`esc_code`. Returns the compressed bytes
/// and the number of meaningful bits in them (including the endian sentinel
/// and any padding up to the next byte is excluded).
///
/// Falls back to a raw, one-byte-tagged copy of `input` whenever the coded
/// form would not be smaller, bounding worst-case expansion at one byte.
pub fn encode(table: &EncodeTable, esc_code: i16, input: &[u8]) -> Result<(Vec<u8>, usize), CodecError> {
    let mut writer = BitWriter::new(input.len());
    writer.push(ENDIAN_SENTINEL, 2);
    let mut bits_used = 2usize;

    for (i, &byte) in input.iter().enumerate() {
        // A literal occurrence of the escape symbol's own byte value must
        // also go through the escape branch: the decoder unconditionally
        // reads a trailing literal whenever it decodes the escape symbol,
        // so encode has to unconditionally produce one too, or the two
        // sides disagree about how many bits this byte consumed.
        let is_escape_value = esc_code >= 0 && byte == esc_code as u8;
        let (bits, len) = table[byte as usize];
        if len > 0 && !is_escape_value {
            writer.push(bits, len);
            bits_used += len as usize;
        } else if esc_code >= 0 {
            let (ebits, elen) = table[esc_code as usize];
            if unlikely(elen == 0) {
                return Err(CodecError::UnknownSymbol(byte));
            }
            writer.push(ebits, elen);
            writer.push(byte as u16, 8);
            bits_used += elen as usize + 8;
        } else {
            return Err(CodecError::UnknownSymbol(byte));
        }

        // The budget can be blown partway through the input, and raw
        // fallback doesn't care what's in the bytes it hasn't looked at yet
        // — it must preempt later bytes, including ones that would otherwise
        // be a fatal `UnknownSymbol`, the moment it's exceeded.
        if unlikely(bits_used > 8 * input.len()) {
            log::trace!(
                "raw fallback triggered after {} of {} input bytes: {bits_used} bits over an {}-bit budget",
                i + 1,
                input.len(),
                8 * input.len(),
            );
            return Ok(raw_fallback(input));
        }
    }

    Ok((writer.finish(), bits_used))
}

fn raw_fallback(input: &[u8]) -> (Vec<u8>, usize) {
    let mut raw = Vec::with_capacity(input.len() + 1);
    raw.push(RAW_FALLBACK_SENTINEL);
    raw.extend_from_slice(input);
    (raw, 8 * (1 + input.len()))
}

/// Decode `in_bits` meaningful bits from `input` using `table`/`esc_code`.
pub fn decode(table: &[DecodeEntry], esc_code: i16, input: &[u8], in_bits: usize) -> Result<Vec<u8>, CodecError> {
    if input.first().copied() == Some(RAW_FALLBACK_SENTINEL) {
        return Ok(input[1..].to_vec());
    }

    if in_bits < 2 {
        return Err(CodecError::CorruptBlob("stream shorter than the endian sentinel"));
    }

    let mut reader = BitReader::new(input, in_bits);
    let sentinel = reader.read_bits(2) as u16;
    if sentinel != ENDIAN_SENTINEL {
        log::debug!(
            "decoding a stream produced by a {}-endian host on a {}-endian one",
            if sentinel == 0b10 { "big" } else { "little" },
            if cfg!(target_endian = "big") { "big" } else { "little" },
        );
    }

    let mut out = Vec::new();
    while reader.remaining() > 0 {
        let entry = table[reader.peek16() as usize];
        let len = entry.len() as usize;
        if len == 0 || len > reader.remaining() {
            return Err(CodecError::CorruptBlob("truncated or invalid code in stream"));
        }
        reader.consume(len);

        let symbol = entry.symbol();
        if esc_code >= 0 && symbol == esc_code as u8 {
            if reader.remaining() < 8 {
                return Err(CodecError::CorruptBlob("truncated escape literal"));
            }
            out.push(reader.read_bits(8) as u8);
        } else {
            out.push(symbol);
        }
    }

    Ok(out)
}
