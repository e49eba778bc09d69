/*!
# Flapflate: LZ77 Store.

The store holds one parse of a block as literal/length and distance pairs.
Parses come from either the greedy (lazy) matcher or the shortest-path
squeeze driven by a `CostModel`.
*/

use super::{
	CostModel,
	MatchCache,
};
use crate::{
	DeflateError,
	Symbol,
	symbols::{
		distance_symbol,
		length_symbol,
		MAX_MATCH,
		MIN_MATCH,
		NUM_D,
		NUM_LL,
	},
};



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # LZ77 Store Entry.
pub(super) struct LZ77Entry {
	/// # Literal or Length.
	litlen: u16,

	/// # Distance (Zero for Literals).
	dist: u16,

	/// # Literal/Length Symbol.
	ll_symbol: u16,

	/// # Distance Symbol.
	d_symbol: u16,

	/// # Extra Bits (Length and Distance).
	extra: u8,
}

#[cfg(test)]
impl LZ77Entry {
	/// # Length.
	///
	/// The number of bytes covered by the entry.
	const fn length(self) -> usize {
		if self.dist == 0 { 1 } else { self.litlen as usize }
	}
}



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # LZ77 Data Store.
pub(super) struct LZ77Store {
	/// # Entries.
	entries: Vec<LZ77Entry>,
}

impl LZ77Store {
	/// # New.
	pub(super) const fn new() -> Self {
		Self { entries: Vec::new() }
	}

	/// # Push Literal.
	pub(super) fn push_literal(&mut self, byte: u8) {
		self.entries.push(LZ77Entry {
			litlen: u16::from(byte),
			dist: 0,
			ll_symbol: u16::from(byte),
			d_symbol: 0,
			extra: 0,
		});
	}

	/// # Push Match.
	///
	/// ## Errors
	///
	/// Returns `UnknownSymbol` if the length or distance is out of range.
	pub(super) fn push_match(&mut self, length: u16, distance: u16)
	-> Result<(), DeflateError> {
		let l = length_symbol(length)?;
		let d = distance_symbol(distance)?;
		self.entries.push(LZ77Entry {
			litlen: length,
			dist: distance,
			ll_symbol: l.symbol,
			d_symbol: d.symbol,
			extra: l.bits + d.bits,
		});
		Ok(())
	}
}

impl LZ77Store {
	#[cfg(test)]
	#[must_use]
	/// # Is Empty?
	pub(super) fn is_empty(&self) -> bool { self.entries.is_empty() }

	#[cfg(test)]
	#[must_use]
	/// # Byte Length.
	///
	/// The number of uncompressed bytes the store covers.
	pub(super) fn byte_len(&self) -> usize {
		self.entries.iter().map(|e| e.length()).sum()
	}

	#[must_use]
	/// # Histogram.
	///
	/// Count the literal/length and distance symbols. The end-of-block symbol
	/// is _not_ included.
	pub(super) fn histogram(&self) -> ([u32; NUM_LL], [u32; NUM_D]) {
		let mut ll_counts = [0_u32; NUM_LL];
		let mut d_counts = [0_u32; NUM_D];
		for e in &self.entries {
			ll_counts[usize::from(e.ll_symbol)] += 1;
			if e.dist != 0 { d_counts[usize::from(e.d_symbol)] += 1; }
		}
		(ll_counts, d_counts)
	}

	#[must_use]
	/// # Data Size (Bits).
	///
	/// Return the number of bits needed to write the entries (and the
	/// end-of-block symbol) with the given code lengths.
	pub(super) fn data_bits(&self, ll_lengths: &[u8], d_lengths: &[u8]) -> usize {
		let ll = |s: u16| ll_lengths.get(usize::from(s)).map_or(0, |&l| usize::from(l));
		let d = |s: u16| d_lengths.get(usize::from(s)).map_or(0, |&l| usize::from(l));

		self.entries.iter()
			.map(|e|
				if e.dist == 0 { ll(e.ll_symbol) }
				else { ll(e.ll_symbol) + d(e.d_symbol) + usize::from(e.extra) }
			)
			.sum::<usize>() + ll(256)
	}

	#[must_use]
	/// # Symbols.
	pub(super) fn symbols(&self) -> Vec<Symbol> {
		self.entries.iter()
			.map(|e|
				if e.dist == 0 { Symbol::Literal(e.litlen as u8) }
				else { Symbol::Match { length: e.litlen, distance: e.dist } }
			)
			.collect()
	}
}



/// # Distance-Based Length Score.
///
/// Far matches are scored one shorter so the lazy matcher will favor a
/// nearby alternative.
const fn length_score(length: u16, distance: u16) -> u16 {
	if 1024 < distance { length.saturating_sub(1) }
	else { length }
}

/// # Greedy LZ77 Run.
///
/// Parse `block` using the longest matches from the cache, with one step of
/// lazy matching: a match is deferred a byte if the next position has a
/// meaningfully better one.
///
/// ## Errors
///
/// Errors are only possible if the cache holds something it shouldn't.
pub(super) fn greedy(block: &[u8], cache: &MatchCache) -> Result<LZ77Store, DeflateError> {
	let mut store = LZ77Store::new();
	let mut pos = 0;
	let mut pending: Option<(u16, u16)> = None;

	while pos < block.len() {
		let (length, distance) = cache.longest(pos);
		let score = length_score(length, distance);
		let matchable = MIN_MATCH <= score && length < MAX_MATCH;

		if let Some((prev_length, prev_distance)) = pending.take() {
			// The deferral paid off; the previous byte goes out as a literal.
			if score > length_score(prev_length, prev_distance) + 1 {
				store.push_literal(block[pos - 1]);
				if matchable {
					pending = Some((length, distance));
					pos += 1;
					continue;
				}
			}
			// Old is new.
			else {
				store.push_match(prev_length, prev_distance)?;
				pos += usize::from(prev_length) - 1;
				continue;
			}
		}
		else if matchable {
			pending = Some((length, distance));
			pos += 1;
			continue;
		}

		if MIN_MATCH <= score {
			store.push_match(length, distance)?;
			pos += usize::from(length);
		}
		else {
			store.push_literal(block[pos]);
			pos += 1;
		}
	}

	// A match can't be pending past the end, but just in case.
	if let Some((length, distance)) = pending {
		store.push_match(length, distance)?;
	}

	Ok(store)
}

/// # Optimal Run.
///
/// Find the cheapest parse of `block` under `model`: a forward pass records
/// the best cost of reaching each position, then the path is traced back
/// and replayed into a store.
///
/// ## Errors
///
/// Errors are only possible if the cache holds something it shouldn't.
pub(super) fn optimal<C: CostModel>(block: &[u8], cache: &MatchCache, model: &C)
-> Result<LZ77Store, DeflateError> {
	let len = block.len();
	let mut costs = vec![f64::INFINITY; len + 1];
	let mut lengths = vec![0_u16; len + 1];
	costs[0] = 0.0;

	let min_match = model.min_match();
	for (i, &byte) in block.iter().enumerate() {
		let cost = costs[i];

		// Literal.
		let new_cost = cost + model.literal(byte);
		if new_cost < costs[i + 1] {
			costs[i + 1] = new_cost;
			lengths[i + 1] = 1;
		}

		// Matches. Each breakpoint covers the lengths between it and the
		// previous one.
		let min_cost = cost + min_match;
		let mut k = MIN_MATCH;
		for &(max, distance) in cache.pairs(i) {
			while k <= max {
				let j = i + usize::from(k);
				if min_cost < costs[j] {
					let new_cost = cost + model.matched(k, distance);
					if new_cost < costs[j] {
						costs[j] = new_cost;
						lengths[j] = k;
					}
				}
				k += 1;
			}
		}
	}

	// Trace the path backwards.
	let mut path = Vec::new();
	let mut pos = len;
	while 0 < pos {
		let step = lengths[pos];
		if step == 0 || pos < usize::from(step) { return Err(DeflateError::CorruptStream); }
		path.push(step);
		pos -= usize::from(step);
	}

	// And follow it forwards.
	let mut store = LZ77Store::new();
	for step in path.into_iter().rev() {
		if step == 1 { store.push_literal(block[pos]); }
		else {
			let distance = cache.distance(pos, step).ok_or(DeflateError::CorruptStream)?;
			store.push_match(step, distance)?;
		}
		pos += usize::from(step);
	}

	Ok(store)
}

/// # Fixed Data Size (Bits).
///
/// The bits needed to write the store with the fixed trees, end-of-block
/// included.
pub(super) fn fixed_bits(store: &LZ77Store) -> usize {
	store.entries.iter()
		.map(|e| {
			let ll = match e.ll_symbol {
				0..=143 | 280..=287 => 8,
				144..=255 => 9,
				_ => 7,
			};
			if e.dist == 0 { ll }
			else { ll + 5 + usize::from(e.extra) }
		})
		.sum::<usize>() + 7
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::squeeze::FixedCost;

	/// # Replay a Store.
	fn replay(history: &[u8], store: &LZ77Store) -> Vec<u8> {
		let mut out = history.to_vec();
		for s in store.symbols() {
			match s {
				Symbol::Literal(b) => out.push(b),
				Symbol::Match { length, distance } => {
					let start = out.len() - usize::from(distance);
					for i in 0..usize::from(length) { out.push(out[start + i]); }
				},
				Symbol::End => {},
			}
		}
		out.split_off(history.len())
	}

	#[test]
	fn t_store() {
		let mut store = LZ77Store::new();
		assert!(store.is_empty());
		store.push_literal(b'a');
		store.push_match(10, 1).unwrap();
		store.push_match(20, 100).unwrap();
		assert!(store.push_match(2, 1).is_err());
		assert!(store.push_match(3, 0).is_err());
		assert_eq!(store.byte_len(), 31);

		let (ll, d) = store.histogram();
		assert_eq!(ll[usize::from(b'a')], 1);
		assert_eq!(ll[264], 1);
		assert_eq!(ll[269], 1);
		assert_eq!(ll[256], 0);
		assert_eq!(d[0], 1);
		assert_eq!(d[13], 1);

		// 8 for the literal, 7 + 5 for the first match, 7 + 2 + 5 + 5 for
		// the second, and 7 for the end.
		assert_eq!(fixed_bits(&store), 8 + 12 + 19 + 7);
	}

	#[test]
	fn t_greedy() {
		let data = b"abcabcabcabcabcabcabc";
		let cache = MatchCache::new(data, 0);
		let store = greedy(data, &cache).unwrap();
		assert_eq!(
			store.symbols(),
			vec![
				Symbol::Literal(b'a'),
				Symbol::Literal(b'b'),
				Symbol::Literal(b'c'),
				Symbol::Match { length: 18, distance: 3 },
			],
		);
		assert_eq!(replay(&[], &store), data);
	}

	#[test]
	fn t_lazy() {
		// At position 12 the best is "bcd" (3), but position 13 has
		// "cdefgh" (6); the lazy matcher should take the latter.
		let data = b"bcd_cdefgh_abcdefgh";
		let cache = MatchCache::new(data, 0);
		let store = greedy(data, &cache).unwrap();
		assert_eq!(replay(&[], &store), data);
		assert!(store.symbols().contains(&Symbol::Match { length: 6, distance: 9 }));
	}

	#[test]
	fn t_optimal() {
		let data = b"The quick brown fox jumps over the lazy dog. The quick brown fox!";
		let cache = MatchCache::new(data, 0);
		let store = optimal(data, &cache, &FixedCost).unwrap();
		assert_eq!(replay(&[], &store), data);
		assert_eq!(store.byte_len(), data.len());

		// The shortest path can't lose to the greedy parse under the same
		// costs.
		let greedy = greedy(data, &cache).unwrap();
		assert!(fixed_bits(&store) <= fixed_bits(&greedy));
	}

	#[test]
	fn t_optimal_history() {
		let history = b"0123456789abcdef";
		let mut data = history.to_vec();
		data.extend_from_slice(b"abcdef0123456789");
		let cache = MatchCache::new(&data, history.len());
		let block = &data[history.len()..];
		let store = optimal(block, &cache, &FixedCost).unwrap();
		assert_eq!(replay(history, &store), block);
		assert!(store.symbols().iter().all(|s| matches!(s, Symbol::Match { .. })));
	}
}
