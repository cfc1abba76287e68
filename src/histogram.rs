use crate::constants::NUM_SYMBOLS;
use crate::unchecked::UncheckedArray;

/// Per-byte frequency counts accumulated over training data (C1).
///
/// Boxed so that moving a `Histogram` between lifecycle states (see
/// `CodecState` in `lib.rs`) is a pointer move rather than a 2KB memcpy.
#[derive(Clone)]
pub struct Histogram(Box<UncheckedArray<u64, NUM_SYMBOLS>>);

impl Histogram {
    pub fn new() -> Self {
        Self(Box::new(UncheckedArray::default()))
    }

    /// Add one to `counts[s]` for every byte `s` in `bytes`. Empty input is a
    /// legal no-op.
    pub fn add(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0[b as usize] += 1;
        }
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.0[symbol as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (0..NUM_SYMBOLS).map(|s| (s as u8, self.0[s]))
    }

    /// Lowest-indexed symbol that has never been seen, used to pick the
    /// escape code in `build(partial = true)`.
    pub fn lowest_unused_symbol(&self) -> Option<u8> {
        (0..NUM_SYMBOLS as u16).find(|&s| self.0[s as usize] == 0).map(|s| s as u8)
    }

    pub fn has_any_count(&self) -> bool {
        (0..NUM_SYMBOLS).any(|s| self.0[s] > 0)
    }

    /// Number of distinct byte values with a nonzero count, retained by
    /// `CodedBuilt` codecs for diagnostic reporting (see `Display` in `lib.rs`).
    pub fn distinct_symbols(&self) -> usize {
        (0..NUM_SYMBOLS).filter(|&s| self.0[s] > 0).count()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_noop_on_empty_input() {
        let mut h = Histogram::new();
        h.add(&[]);
        assert!(!h.has_any_count());
    }

    #[test]
    fn add_accumulates_counts() {
        let mut h = Histogram::new();
        h.add(b"aabbbc");
        assert_eq!(h.get(b'a'), 2);
        assert_eq!(h.get(b'b'), 3);
        assert_eq!(h.get(b'c'), 1);
        assert_eq!(h.get(b'd'), 0);
    }

    #[test]
    fn lowest_unused_symbol_finds_gap() {
        let mut h = Histogram::new();
        h.add(&[0, 1, 2]);
        assert_eq!(h.lowest_unused_symbol(), Some(3));
    }

    #[test]
    fn distinct_symbols_counts_nonzero_entries_only() {
        let mut h = Histogram::new();
        h.add(b"aabbbc");
        assert_eq!(h.distinct_symbols(), 3);
    }

    #[test]
    fn lowest_unused_symbol_none_when_full() {
        let mut h = Histogram::new();
        let all: Vec<u8> = (0..=255u8).collect();
        h.add(&all);
        assert_eq!(h.lowest_unused_symbol(), None);
    }
}
