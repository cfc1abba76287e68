//! Length-limited Huffman codec (max code length 12, built via
//! package-merge) paired with a fixed 2-bit DNA codec, for a bioinformatics
//! record format that needs both general-purpose and sequence-specific
//! compression behind one interface.

#[macro_use]
extern crate static_assertions;

mod bitstream;
mod canonical;
mod constants;
mod decode_table;
mod dna;
mod error;
mod histogram;
mod package_merge;
mod serialize;
mod unchecked;

use std::fmt;

use canonical::CanonicalCode;
use decode_table::{build_decode_table, DecodeEntry};
use error::require_state;
use histogram::Histogram;

pub use error::CodecError;

/// Fully built tables: what's needed to encode, decode, and re-serialize.
/// Shared by the trained path (`package_merge` + `canonical::assign_codes`)
/// and the loaded path (codes read verbatim off a blob), since from here on
/// both behave identically.
struct CodeTables {
    encode: bitstream::EncodeTable,
    decode: Box<[DecodeEntry]>,
    esc_code: i16,
    codes: Vec<CanonicalCode>,
}

impl CodeTables {
    fn from_codes(codes: Vec<CanonicalCode>, esc_code: i16) -> Self {
        let max_len = codes.iter().map(|c| c.len).max().unwrap_or(0);
        log::debug!(
            "built huffman tables: {} symbols, max code length {}, escape {}",
            codes.len(),
            max_len,
            esc_code,
        );

        let mut encode = [(0u16, 0u8); 256];
        for c in &codes {
            encode[c.symbol as usize] = (c.bits, c.len);
        }
        let decode = build_decode_table(&codes);

        Self {
            encode,
            decode,
            esc_code,
            codes,
        }
    }

    fn trained(lengths: Vec<(u8, u8)>, esc_code: i16) -> Self {
        Self::from_codes(canonical::assign_codes(lengths), esc_code)
    }
}

/// Lifecycle state of a Huffman codec. The donor's gzip decoder checks
/// ad-hoc booleans at each entry point; here invalid call orders are instead
/// unrepresentable by construction, one variant per state in the spec's
/// Empty -> Filled -> CodedBuilt/CodedLoaded progression. `CodedBuilt` and
/// `CodedLoaded` are kept distinct, not merged into one shape, because
/// invariant 5 requires a trained codec to go on carrying its histogram
/// for reporting (see `Display` below) while a deserialized one never had
/// one to carry.
enum CodecState {
    Empty,
    Filled(Histogram),
    CodedBuilt { tables: Box<CodeTables>, hist: Histogram },
    CodedLoaded(Box<CodeTables>),
}

impl CodecState {
    fn name(&self) -> &'static str {
        match self {
            CodecState::Empty => "Empty",
            CodecState::Filled(_) => "Filled",
            CodecState::CodedBuilt { .. } => "CodedBuilt",
            CodecState::CodedLoaded(_) => "CodedLoaded",
        }
    }

    fn tables(&self) -> Option<&CodeTables> {
        match self {
            CodecState::CodedBuilt { tables, .. } => Some(tables),
            CodecState::CodedLoaded(tables) => Some(tables),
            CodecState::Empty | CodecState::Filled(_) => None,
        }
    }
}

pub(crate) struct HuffmanCodec {
    state: CodecState,
}

impl HuffmanCodec {
    fn new() -> Self {
        Self {
            state: CodecState::Empty,
        }
    }

    fn add(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        require_state!(
            matches!(self.state, CodecState::Empty | CodecState::Filled(_)),
            "Empty or Filled",
            self.state.name()
        );
        match &mut self.state {
            CodecState::Empty => {
                let mut hist = Histogram::new();
                hist.add(bytes);
                self.state = CodecState::Filled(hist);
            }
            CodecState::Filled(hist) => hist.add(bytes),
            CodecState::CodedBuilt { .. } | CodecState::CodedLoaded(_) => unreachable!("checked above"),
        }
        Ok(())
    }

    fn build(&mut self, partial: bool) -> Result<(), CodecError> {
        let hist = match &self.state {
            CodecState::Filled(hist) => hist.clone(),
            other => {
                return Err(CodecError::StateViolation {
                    expected: "Filled (at least one add() call)",
                    actual: other.name(),
                })
            }
        };

        let result = package_merge::build_code_lengths(&hist, partial)?;
        let tables = Box::new(CodeTables::trained(result.lengths, result.esc_code));
        self.state = CodecState::CodedBuilt { tables, hist };
        Ok(())
    }

    fn tables(&self) -> Result<&CodeTables, CodecError> {
        self.state.tables().ok_or_else(|| CodecError::StateViolation {
            expected: "a built or loaded codec",
            actual: self.state.name(),
        })
    }

    fn serialize(&self, out: &mut [u8]) -> Result<usize, CodecError> {
        let tables = self.tables()?;
        let n = serialize::serialize(&tables.codes, tables.esc_code, out)?;
        log::debug!("serialized codec into {n} bytes");
        Ok(n)
    }

    fn deserialize(blob: &[u8]) -> Result<Self, CodecError> {
        let (codes, esc_code) = serialize::deserialize(blob)?;
        Ok(Self {
            state: CodecState::CodedLoaded(Box::new(CodeTables::from_codes(codes, esc_code))),
        })
    }

    fn encode(&self, input: &[u8]) -> Result<(Vec<u8>, usize), CodecError> {
        let tables = self.tables()?;
        bitstream::encode(&tables.encode, tables.esc_code, input)
    }

    fn decode(&self, input: &[u8], in_bits: usize) -> Result<Vec<u8>, CodecError> {
        let tables = self.tables()?;
        bitstream::decode(&tables.decode, tables.esc_code, input, in_bits)
    }
}

/// A codec: either a trainable length-limited Huffman codec or the fixed
/// 2-bit DNA codec. Both share the same encode/decode/serialize surface so
/// callers don't need to branch on which kind of data a record holds.
pub enum Codec {
    Huffman(Box<HuffmanCodec>),
    Dna,
}

impl Codec {
    /// Upper bound on a serialized Huffman codec's size; always big enough
    /// to pass to [`Codec::serialize`].
    pub const MAX_SERIAL_SIZE: usize = constants::MAX_SERIAL_SIZE;

    /// A fresh, untrained Huffman codec (`Empty` state).
    pub fn new() -> Self {
        Codec::Huffman(Box::new(HuffmanCodec::new()))
    }

    /// The fixed 2-bit DNA codec. Stateless: no `add`/`build` required.
    pub fn dna() -> Self {
        Codec::Dna
    }

    /// Accumulate byte frequencies from a training sample.
    pub fn add(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        match self {
            Codec::Huffman(h) => h.add(bytes),
            Codec::Dna => Err(CodecError::StateViolation {
                expected: "a Huffman codec",
                actual: "the DNA codec",
            }),
        }
    }

    /// Build canonical codes from everything added so far. `partial` reserves
    /// one escape code for bytes that were never seen during training.
    pub fn build(&mut self, partial: bool) -> Result<(), CodecError> {
        match self {
            Codec::Huffman(h) => h.build(partial),
            Codec::Dna => Err(CodecError::StateViolation {
                expected: "a Huffman codec",
                actual: "the DNA codec",
            }),
        }
    }

    /// Serialize the built code tables into `out`. Returns the byte count
    /// written, always `<= Codec::MAX_SERIAL_SIZE`.
    pub fn serialize(&self, out: &mut [u8]) -> Result<usize, CodecError> {
        match self {
            Codec::Huffman(h) => h.serialize(out),
            Codec::Dna => Err(CodecError::StateViolation {
                expected: "a built Huffman codec",
                actual: "the DNA codec",
            }),
        }
    }

    /// Reconstruct a codec from a blob produced by [`Codec::serialize`].
    pub fn deserialize(blob: &[u8]) -> Result<Self, CodecError> {
        HuffmanCodec::deserialize(blob).map(|h| Codec::Huffman(Box::new(h)))
    }

    /// Encode `input`. Returns the compressed bytes and the number of
    /// meaningful bits among them (pass both to [`Codec::decode`]).
    pub fn encode(&self, input: &[u8]) -> Result<(Vec<u8>, usize), CodecError> {
        match self {
            Codec::Huffman(h) => h.encode(input),
            Codec::Dna => {
                let bytes = dna::encode(input)?;
                Ok((bytes, input.len() * 2))
            }
        }
    }

    /// Decode `in_bits` meaningful bits from `input`.
    pub fn decode(&self, input: &[u8], in_bits: usize) -> Result<Vec<u8>, CodecError> {
        match self {
            Codec::Huffman(h) => h.decode(input, in_bits),
            Codec::Dna => {
                require_state!(in_bits % 2 == 0, "an even bit count", "an odd bit count");
                dna::decode(input, in_bits / 2)
            }
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Dna => write!(f, "Codec::Dna"),
            Codec::Huffman(h) => match &h.state {
                CodecState::CodedBuilt { hist, .. } => write!(
                    f,
                    "Codec::Huffman(CodedBuilt, {} distinct symbols trained)",
                    hist.distinct_symbols()
                ),
                other => write!(f, "Codec::Huffman({})", other.name()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// S1: a geometric weight distribution trains, builds, and round-trips.
    #[test]
    fn s1_geometric_weights_round_trip() {
        init_logging();
        let mut codec = Codec::new();
        let bytes = *b"abcdefghijkl";
        let mut weight = 1usize;
        let mut sample = Vec::new();
        for &b in &bytes {
            sample.extend(std::iter::repeat(b).take(weight));
            weight *= 2;
        }
        codec.add(&sample).unwrap();
        codec.build(false).unwrap();

        let (coded, bits) = codec.encode(&sample).unwrap();
        let decoded = codec.decode(&coded, bits).unwrap();
        assert_eq!(decoded, sample);
    }

    /// S2: an escape code lets `encode` handle bytes absent from training.
    #[test]
    fn s2_escape_handles_unseen_bytes() {
        init_logging();
        let mut codec = Codec::new();
        codec.add(b"aaaabbbc").unwrap();
        codec.build(true).unwrap();

        let input = b"aaaabbbcxyz".to_vec();
        let (coded, bits) = codec.encode(&input).unwrap();
        let decoded = codec.decode(&coded, bits).unwrap();
        assert_eq!(decoded, input);
    }

    /// Without an escape, an unseen byte is a hard encode error.
    #[test]
    fn unseen_byte_without_escape_errors() {
        let mut codec = Codec::new();
        codec.add(b"aaaa").unwrap();
        codec.build(false).unwrap();
        assert!(matches!(
            codec.encode(b"z"),
            Err(CodecError::UnknownSymbol(b'z'))
        ));
    }

    /// S3: a serialized codec reloads into one that encodes/decodes identically.
    #[test]
    fn s3_serialize_deserialize_round_trip() {
        init_logging();
        let mut codec = Codec::new();
        codec.add(b"the quick brown fox jumps over the lazy dog").unwrap();
        codec.build(true).unwrap();

        let mut buf = vec![0u8; Codec::MAX_SERIAL_SIZE];
        let n = codec.serialize(&mut buf).unwrap();
        assert!(n <= Codec::MAX_SERIAL_SIZE);

        let reloaded = Codec::deserialize(&buf[..n]).unwrap();
        let input = b"fox dog the the the".to_vec();
        let (coded, bits) = codec.encode(&input).unwrap();
        let decoded = reloaded.decode(&coded, bits).unwrap();
        assert_eq!(decoded, input);
    }

    /// S4: lifecycle state violations are reported, not silently tolerated.
    #[test]
    fn s4_state_violations() {
        let mut codec = Codec::new();
        assert!(matches!(
            codec.build(false),
            Err(CodecError::StateViolation { .. })
        ));
        assert!(matches!(
            codec.encode(b"x"),
            Err(CodecError::StateViolation { .. })
        ));

        codec.add(b"abc").unwrap();
        codec.build(false).unwrap();
        assert!(matches!(
            codec.add(b"more"),
            Err(CodecError::StateViolation { .. })
        ));
    }

    /// S5: data the code can't shrink falls back to a raw, bounded-expansion stream.
    #[test]
    fn s5_incompressible_data_uses_raw_fallback() {
        init_logging();
        let mut codec = Codec::new();
        // Skewed training set so most of the random-looking probe bytes
        // below get long codes or hit the escape path.
        codec.add(b"aaaaaaaaaaaaaaaaaaaab").unwrap();
        codec.build(true).unwrap();

        let probe: Vec<u8> = (0..128u8).collect();
        let (coded, bits) = codec.encode(&probe).unwrap();
        assert!(coded.len() <= probe.len() + 1);
        let decoded = codec.decode(&coded, bits).unwrap();
        assert_eq!(decoded, probe);
    }

    /// S6: the DNA codec round-trips without any training step.
    #[test]
    fn s6_dna_codec_round_trip() {
        let codec = Codec::dna();
        let bases = b"acgtacgtac".to_vec();
        let (packed, bits) = codec.encode(&bases).unwrap();
        assert_eq!(packed.len(), 3);
        assert_eq!(bits, 20);
        let decoded = codec.decode(&packed, bits).unwrap();
        assert_eq!(decoded, bases);
    }

    #[test]
    fn dna_codec_rejects_add_and_build() {
        let mut codec = Codec::dna();
        assert!(codec.add(b"ACGT").is_err());
        assert!(codec.build(false).is_err());
        assert!(codec.serialize(&mut [0u8; 8]).is_err());
    }

    #[test]
    fn display_reports_lifecycle_state() {
        let mut codec = Codec::new();
        assert_eq!(codec.to_string(), "Codec::Huffman(Empty)");
        codec.add(b"aab").unwrap();
        assert_eq!(codec.to_string(), "Codec::Huffman(Filled)");
        codec.build(false).unwrap();
        assert_eq!(
            codec.to_string(),
            "Codec::Huffman(CodedBuilt, 2 distinct symbols trained)"
        );
        assert_eq!(Codec::dna().to_string(), "Codec::Dna");
    }

    /// A codec loaded from a blob never had a histogram, so it reports
    /// plainly as `CodedLoaded` rather than trying to summarize one.
    #[test]
    fn display_reports_loaded_codec_without_a_histogram() {
        let mut codec = Codec::new();
        codec.add(b"aab").unwrap();
        codec.build(false).unwrap();
        let mut buf = vec![0u8; Codec::MAX_SERIAL_SIZE];
        let n = codec.serialize(&mut buf).unwrap();
        let reloaded = Codec::deserialize(&buf[..n]).unwrap();
        assert_eq!(reloaded.to_string(), "Codec::Huffman(CodedLoaded)");
    }
}
