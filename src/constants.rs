/// Maximum code length in bits produced by the package-merge builder (the
/// spec's *L*). Kept as a compile-time constant so the lookup table size and
/// the bit-packer's 16-bit code assumption stay in lockstep.
pub const MAX_CODE_LEN: usize = 12;

/// Width of the decoder's direct prefix lookup. `MAX_CODE_LEN <= 16` is what
/// makes a single flat table (no subtables, unlike the donor's DEFLATE
/// decoder) sufficient.
pub const TABLE_BITS: usize = 16;

/// Number of symbols in the byte alphabet this codec operates over.
pub const NUM_SYMBOLS: usize = 256;

/// Direct lookup table size: one entry per possible 16-bit prefix.
pub const LOOKUP_TABLESIZE: usize = 1 << TABLE_BITS;

const_assert!(MAX_CODE_LEN <= TABLE_BITS);

/// Sentinel byte that marks a raw (uncompressed) fallback stream. Load-bearing:
/// a real Huffman stream's first byte can never equal this, because its top
/// two bits are always either `00` (little-endian sentinel) or `10`
/// (big-endian sentinel), never `11......`.
pub const RAW_FALLBACK_SENTINEL: u8 = 0xFF;

const_assert!(RAW_FALLBACK_SENTINEL & 0b1100_0000 == 0b1100_0000);

/// Serialized-blob header: endian tag (1 byte) + escape code (4 bytes).
pub const SERIAL_HEADER_SIZE: usize = 5;

/// Largest a serialized codec can ever be: the header, plus a 1-byte code
/// length for every possible byte value, plus a 2-byte code word for each
/// one that is actually in use.
pub const MAX_SERIAL_SIZE: usize = SERIAL_HEADER_SIZE + NUM_SYMBOLS * 3;

const_assert!(MAX_SERIAL_SIZE == 773);
