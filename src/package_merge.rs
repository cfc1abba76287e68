//! Length-limited Huffman length assignment via the Larmore-Hirschberg
//! package-merge ("coin-collector") algorithm (C2).

use crate::constants::MAX_CODE_LEN;
use crate::error::CodecError;
use crate::histogram::Histogram;

/// A symbol entered into the package-merge, tagged so the escape slot's
/// weight-zero tie-break falls out of an ordinary `(weight, symbol)` sort
/// instead of being smuggled through the same numeric field as a real count.
#[derive(Clone, Copy, Debug)]
enum Item {
    Real { symbol: u8, weight: u64 },
    Escape { symbol: u8 },
}

impl Item {
    fn weight(self) -> u64 {
        match self {
            Item::Real { weight, .. } => weight,
            Item::Escape { .. } => 0,
        }
    }

    fn symbol(self) -> u8 {
        match self {
            Item::Real { symbol, .. } | Item::Escape { symbol } => symbol,
        }
    }
}

pub struct LengthBuildResult {
    /// `(symbol, length)` for every included symbol, in no particular order.
    pub lengths: Vec<(u8, u8)>,
    pub esc_code: i16,
}

/// Merge two ascending sequences of `u64` weights, recording at each output
/// position whether the value came from `singles` (true) or was the sum of
/// the next two consecutive `pairs_source` entries (false).
fn merge_row(singles: &[u64], pairs_source: &[u64]) -> (Vec<u64>, Vec<bool>) {
    let pair_count = pairs_source.len() / 2;
    let mut out = Vec::with_capacity(singles.len() + pair_count);
    let mut choices = Vec::with_capacity(singles.len() + pair_count);

    let mut i = 0; // next unused singleton
    let mut j = 0; // next unused pair
    while i < singles.len() || j < pair_count {
        let take_single = if i >= singles.len() {
            false
        } else if j >= pair_count {
            true
        } else {
            singles[i] <= pairs_source[2 * j] + pairs_source[2 * j + 1]
        };

        if take_single {
            out.push(singles[i]);
            choices.push(true);
            i += 1;
        } else {
            out.push(pairs_source[2 * j] + pairs_source[2 * j + 1]);
            choices.push(false);
            j += 1;
        }
    }

    (out, choices)
}

/// Run the package-merge construction over `weights` (ascending) and return,
/// for each sorted position, the number of bits its code should have.
fn package_merge_lengths(weights: &[u64], max_len: usize) -> Vec<u8> {
    let n = weights.len();
    debug_assert!(n >= 1);

    if n == 1 {
        return vec![1];
    }

    // `prior_row` starts as row `max_len` (the leaves themselves) and is
    // replaced, level by level, by the freshly merged row above it.
    let mut prior_row: Vec<u64> = weights.to_vec();
    let mut levels: Vec<Vec<bool>> = Vec::with_capacity(max_len - 1);

    for _level in (1..max_len).rev() {
        let (new_row, choices) = merge_row(weights, &prior_row);
        levels.push(choices);
        prior_row = new_row;
    }

    // Backtrace from row 1 (last computed, so first when read in reverse)
    // down to row `max_len - 1`, propagating how many leaf positions are
    // still "in play" via `span`.
    let mut len = vec![0u8; n];
    let mut next_singleton = 0usize;
    let mut span = 2 * (n - 1);

    for choices in levels.iter().rev() {
        debug_assert!(choices.len() >= span);
        let mut pair_count = 0;
        for &is_singleton in &choices[0..span] {
            if is_singleton {
                len[next_singleton] += 1;
                next_singleton += 1;
            } else {
                pair_count += 1;
            }
        }
        span = 2 * pair_count;
    }

    // The leftover span refers to row `max_len`, i.e. the sorted leaves
    // themselves: the first `span` of them get one final increment.
    for slot in len.iter_mut().take(span) {
        *slot += 1;
    }

    len
}

/// Build code lengths for every symbol with positive weight in `hist`, plus
/// (if `partial`) one escape symbol. See spec §4.2.
pub fn build_code_lengths(hist: &Histogram, partial: bool) -> Result<LengthBuildResult, CodecError> {
    let mut items: Vec<Item> = hist
        .iter()
        .filter(|&(_, weight)| weight > 0)
        .map(|(symbol, weight)| Item::Real { symbol, weight })
        .collect();

    let esc_code = if partial {
        hist.lowest_unused_symbol()
    } else {
        None
    };

    if let Some(esc) = esc_code {
        items.push(Item::Escape { symbol: esc });
    }

    if items.is_empty() {
        return Err(CodecError::StateViolation {
            expected: "a histogram with at least one positive count",
            actual: "an empty histogram",
        });
    }

    items.sort_by_key(|item| (item.weight(), item.symbol()));

    let weights: Vec<u64> = items.iter().map(|item| item.weight()).collect();
    let lens = package_merge_lengths(&weights, MAX_CODE_LEN);

    let lengths = items
        .iter()
        .zip(lens.iter())
        .map(|(item, &len)| (item.symbol(), len))
        .collect();

    Ok(LengthBuildResult {
        lengths,
        esc_code: esc_code.map(|s| s as i16).unwrap_or(-1),
    })
}
