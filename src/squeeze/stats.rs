/*!
# Flapflate: Squeeze Stats.

Symbol statistics, the entropy cost model built from them, the fixed-tree
cost model, and the little PRNG used to shake things up when a squeeze
stalls.
*/

use std::num::NonZeroU32;
use super::LZ77Store;
use crate::symbols::{
	DISTANCE_BITS,
	distance_symbol_fast,
	END_SYMBOL,
	length_base,
	length_bits,
	length_symbol,
	NUM_D,
	NUM_LL,
};



/// # Cost Model.
///
/// The estimated cost, in bits, of emitting a given literal or match.
pub(super) trait CostModel {
	/// # Literal Cost.
	fn literal(&self, byte: u8) -> f64;

	/// # Match Cost.
	fn matched(&self, length: u16, distance: u16) -> f64;

	/// # Cheapest Possible Match.
	///
	/// A lower bound for `CostModel::matched`, used to skip hopeless
	/// comparisons.
	fn min_match(&self) -> f64;
}



#[derive(Debug, Clone, Copy)]
/// # Fixed-Tree Costs.
pub(super) struct FixedCost;

impl CostModel for FixedCost {
	fn literal(&self, byte: u8) -> f64 {
		if byte < 144 { 8.0 } else { 9.0 }
	}

	fn matched(&self, length: u16, distance: u16) -> f64 {
		let ll = length_symbol(length).map_or(8, |c| if c.symbol <= 279 { 7 } else { 8 });
		let dbits = DISTANCE_BITS[usize::from(distance_symbol_fast(distance)) & 31];
		f64::from(ll + length_bits(length) + 5 + dbits)
	}

	fn min_match(&self) -> f64 { 12.0 }
}



#[derive(Debug, Clone, Copy)]
/// # Randomness.
///
/// A simple, repeatable [MWC PRNG](https://en.wikipedia.org/wiki/Multiply-with-carry_pseudorandom_number_generator),
/// used only to shuffle stat frequencies between runs.
pub(super) struct RanState {
	/// # W.
	m_w: u32,

	/// # Z.
	m_z: u32,
}

impl RanState {
	/// # New Instance.
	pub(super) const fn new() -> Self {
		Self { m_w: 1, m_z: 2 }
	}

	/// # Generate Random Number.
	pub(super) const fn randomize(&mut self) -> u32 {
		self.m_z = 36_969 * (self.m_z & 65_535) + (self.m_z >> 16);
		self.m_w = 18_000 * (self.m_w & 65_535) + (self.m_w >> 16);
		(self.m_z << 16).wrapping_add(self.m_w)
	}
}



#[derive(Debug, Clone, Copy)]
/// # Symbol Stats.
///
/// Literal/length and distance symbol counts for a block, and the entropy
/// of each symbol derived from them.
pub(super) struct SymbolStats {
	/// # Litlen Symbol Counts.
	ll_counts: [u32; NUM_LL],

	/// # Distance Symbol Counts.
	d_counts: [u32; NUM_D],

	/// # Litlen Symbol Costs.
	ll_symbols: [f64; NUM_LL],

	/// # Distance Symbol Costs.
	d_symbols: [f64; NUM_D],

	/// # Cheapest Match.
	min_cost: f64,
}

impl SymbolStats {
	/// # New Instance.
	pub(super) const fn new() -> Self {
		Self {
			ll_counts: [0; NUM_LL],
			d_counts: [0; NUM_D],
			ll_symbols: [0.0; NUM_LL],
			d_symbols: [0.0; NUM_D],
			min_cost: 0.0,
		}
	}

	/// # Crunch Symbols.
	///
	/// Recalculate the per-symbol costs (`log2(sum) - log2(count)`) from the
	/// current counts. This must be called after any change to the counts
	/// and before the stats are used as a `CostModel`.
	pub(super) fn crunch(&mut self) {
		crunch_counts(&self.d_counts, &mut self.d_symbols, 5.0);

		// The end symbol is always counted, so the sum is never zero here.
		crunch_counts(&self.ll_counts, &mut self.ll_symbols, 0.0);

		// The cheapest length and distance, extra bits included.
		let length_cost = (257..=285_u16)
			.filter_map(|s| length_base(s).ok().map(|(_, bits)| (s, bits)))
			.map(|(s, bits)| self.ll_symbols[usize::from(s)] + f64::from(bits))
			.fold(f64::INFINITY, f64::min);
		let dist_cost = self.d_symbols.iter()
			.zip(DISTANCE_BITS)
			.take(30)
			.map(|(c, bits)| c + f64::from(bits))
			.fold(f64::INFINITY, f64::min);
		self.min_cost = length_cost + dist_cost;
	}

	/// # Load Statistics.
	///
	/// Add the symbols of `store` to the counts, then make sure the
	/// end-of-block symbol is counted exactly once.
	pub(super) fn load_store(&mut self, store: &LZ77Store) {
		let (ll, d) = store.histogram();
		for (a, b) in self.ll_counts.iter_mut().zip(ll) { *a += b; }
		for (a, b) in self.d_counts.iter_mut().zip(d) { *a += b; }
		self.ll_counts[usize::from(END_SYMBOL)] = 1;
	}

	/// # Randomize Stat Frequencies.
	///
	/// Replace roughly a third of the counts with some other count from the
	/// same table. Litlens are shuffled first, then distances; the order
	/// matters since both share one `RanState`.
	pub(super) fn randomize(&mut self, state: &mut RanState) {
		shuffle_counts(&mut self.ll_counts, state);
		shuffle_counts(&mut self.d_counts, state);
		self.ll_counts[usize::from(END_SYMBOL)] = 1;
	}

	/// # Reload Store.
	///
	/// Like `SymbolStats::load_store`, but reset or halve the counts first.
	/// Halving gives a sort of weighted average with the previous run.
	pub(super) fn reload_store(&mut self, store: &LZ77Store, weighted: bool) {
		if weighted {
			for c in &mut self.ll_counts { *c /= 2; }
			for c in &mut self.d_counts { *c /= 2; }
		}
		else {
			self.ll_counts.fill(0);
			self.d_counts.fill(0);
		}

		self.load_store(store);
	}
}

impl CostModel for SymbolStats {
	fn literal(&self, byte: u8) -> f64 { self.ll_symbols[usize::from(byte)] }

	fn matched(&self, length: u16, distance: u16) -> f64 {
		let Ok(ll) = length_symbol(length) else { return f64::INFINITY; };
		let dsym = usize::from(distance_symbol_fast(distance)) & 31;
		self.ll_symbols[usize::from(ll.symbol)] +
		f64::from(ll.bits) +
		self.d_symbols[dsym] +
		f64::from(DISTANCE_BITS[dsym])
	}

	fn min_match(&self) -> f64 { self.min_cost }
}



/// # Crunch Counts.
///
/// Set each cost to `log2(sum) - log2(count)`. If the counts are all zero,
/// `empty` is used for the sum's log.
fn crunch_counts(counts: &[u32], symbols: &mut [f64], empty: f64) {
	let log2sum = NonZeroU32::new(counts.iter().sum())
		.map_or(empty, |sum| f64::from(sum.get()).log2());
	symbols.fill(log2sum);
	for (c, s) in counts.iter().copied().zip(symbols) {
		if c != 0 { *s -= f64::from(c).log2(); }
	}
}

/// # Shuffle Counts.
fn shuffle_counts(counts: &mut [u32], state: &mut RanState) {
	let len = counts.len();
	for i in 0..len {
		if (state.randomize() >> 4) % 3 == 0 {
			let index = state.randomize() as usize % len;
			counts[i] = counts[index];
		}
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_ran_state() {
		// The sequence must be repeatable.
		let mut a = RanState::new();
		let mut b = RanState::new();
		let a: Vec<u32> = (0..16).map(|_| a.randomize()).collect();
		let b: Vec<u32> = (0..16).map(|_| b.randomize()).collect();
		assert_eq!(a, b);

		// First value by hand: z = 36969 * 2, w = 18000.
		assert_eq!(a[0], ((36_969 * 2) << 16) + 18_000);
	}

	#[test]
	#[expect(clippy::float_cmp, reason = "Exact powers of two.")]
	fn t_crunch() {
		let mut store = LZ77Store::new();
		for b in b"aabb" { store.push_literal(*b); }

		let mut stats = SymbolStats::new();
		stats.load_store(&store);
		stats.crunch();

		// Five symbols in all (end included): a and b appear twice.
		let log5 = 5_f64.log2();
		assert_eq!(stats.literal(b'a'), log5 - 1.0);
		assert_eq!(stats.literal(b'b'), log5 - 1.0);
		assert_eq!(stats.ll_symbols[256], log5);

		// No distances, so every distance costs log2(32).
		assert!(stats.d_symbols.iter().all(|&c| c == 5.0));

		// Reloading without weighting starts over.
		stats.reload_store(&store, false);
		assert_eq!(stats.ll_counts[usize::from(b'a')], 2);

		// Weighting halves first.
		stats.reload_store(&store, true);
		assert_eq!(stats.ll_counts[usize::from(b'a')], 3);
		assert_eq!(stats.ll_counts[256], 1);
	}

	#[test]
	fn t_randomize() {
		let mut store = LZ77Store::new();
		for b in b"abcdefghijklmnop" { store.push_literal(*b); }
		let mut stats = SymbolStats::new();
		stats.load_store(&store);

		let mut a = stats;
		let mut b = stats;
		a.randomize(&mut RanState::new());
		b.randomize(&mut RanState::new());
		assert_eq!(a.ll_counts, b.ll_counts);
		assert_eq!(a.ll_counts[256], 1);
	}

	#[test]
	#[expect(clippy::float_cmp, reason = "Whole numbers.")]
	fn t_fixed_cost() {
		let model = FixedCost;
		assert_eq!(model.literal(0), 8.0);
		assert_eq!(model.literal(143), 8.0);
		assert_eq!(model.literal(144), 9.0);

		// Length 3 (257, seven bits), distance 1 (five bits).
		assert_eq!(model.matched(3, 1), 12.0);

		// Length 258 (285, eight bits), distance 32768 (5 + 13 bits).
		assert_eq!(model.matched(258, 32_768), 26.0);

		// Length 20 (269, seven bits + two), distance 100 (5 + 5 bits).
		assert_eq!(model.matched(20, 100), 19.0);

		assert!(model.min_match() <= model.matched(3, 1));
	}
}
