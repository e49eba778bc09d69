/*!
# Flapflate: Longest Match Cache.

Squeezing asks the same "what matches start here?" question of every
position on every iteration, so the answers are worked out once up front
with a hash chain and cached.
*/

use crate::symbols::{
	MAX_DISTANCE,
	MAX_MATCH,
	MIN_MATCH,
};



/// # Hash Bits.
const HASH_BITS: u32 = 15;

/// # Hash Mask.
const HASH_MASK: usize = (1 << HASH_BITS) - 1;

/// # Maximum Chain Hits.
///
/// Stop looking after this many candidates.
const MAX_CHAIN_HITS: usize = 8192;

/// # No Position.
const NONE: u32 = u32::MAX;



/// # Hash Chain.
///
/// Positions sharing a three-byte hash, newest first.
struct HashChain {
	/// # Chain Heads (by Hash).
	head: Vec<u32>,

	/// # Previous Position (by Position).
	prev: Vec<u32>,
}

impl HashChain {
	/// # New.
	fn new(len: usize) -> Self {
		Self {
			head: vec![NONE; HASH_MASK + 1],
			prev: vec![NONE; len],
		}
	}

	/// # Hash.
	fn hash(data: &[u8], pos: usize) -> Option<usize> {
		let [a, b, c] = data.get(pos..pos + 3)? else { return None; };
		Some(((usize::from(*a) << 10) ^ (usize::from(*b) << 5) ^ usize::from(*c)) & HASH_MASK)
	}

	#[allow(clippy::cast_possible_truncation)]
	/// # Insert Position.
	fn insert(&mut self, data: &[u8], pos: usize) {
		if let Some(h) = Self::hash(data, pos) {
			self.prev[pos] = self.head[h];
			self.head[h] = pos as u32;
		}
	}

	/// # Find Matches.
	///
	/// Walk the chain for `pos`, pushing a `(length, distance)` pair onto
	/// `out` each time a longer match turns up. Because the chain runs from
	/// nearest to farthest, each pair's distance is the smallest that reaches
	/// its length.
	#[allow(clippy::cast_possible_truncation)]
	fn find(&self, data: &[u8], pos: usize, out: &mut Vec<(u16, u16)>) {
		let limit = usize::min(usize::from(MAX_MATCH), data.len() - pos);
		let Some(h) = Self::hash(data, pos) else { return; };
		if limit < usize::from(MIN_MATCH) { return; }

		let needle = &data[pos..pos + limit];
		let mut best = usize::from(MIN_MATCH) - 1;
		let mut cand = self.head[h];
		for _ in 0..MAX_CHAIN_HITS {
			if cand == NONE { break; }
			let cand_pos = cand as usize;
			let dist = pos - cand_pos;
			if usize::from(MAX_DISTANCE) < dist { break; }

			let len = data[cand_pos..].iter()
				.zip(needle)
				.take_while(|(a, b)| a == b)
				.count();
			if best < len {
				best = len;
				out.push((len as u16, dist as u16));
				if len == limit { break; }
			}

			cand = self.prev[cand_pos];
		}
	}
}



/// # Longest Match Cache.
///
/// For each position of the block, the distinct `(length, distance)`
/// breakpoints found by the hash chain, ordered by length. A length `k` can
/// be reached using the distance of the first breakpoint whose length is at
/// least `k`.
pub(super) struct MatchCache {
	/// # Breakpoints.
	pairs: Vec<(u16, u16)>,

	/// # Breakpoint Offsets (by Position).
	offsets: Vec<usize>,
}

impl MatchCache {
	/// # New.
	///
	/// Matches are found for `data[start..]`, but may reach back into
	/// `data[..start]`.
	pub(super) fn new(data: &[u8], start: usize) -> Self {
		let mut chain = HashChain::new(data.len());
		for pos in start.saturating_sub(usize::from(MAX_DISTANCE))..start {
			chain.insert(data, pos);
		}

		let mut pairs = Vec::new();
		let mut offsets = Vec::with_capacity(data.len() - start + 1);
		for pos in start..data.len() {
			offsets.push(pairs.len());
			chain.find(data, pos, &mut pairs);
			chain.insert(data, pos);
		}
		offsets.push(pairs.len());

		Self { pairs, offsets }
	}

	#[must_use]
	/// # Breakpoints.
	pub(super) fn pairs(&self, pos: usize) -> &[(u16, u16)] {
		match (self.offsets.get(pos), self.offsets.get(pos + 1)) {
			(Some(&a), Some(&b)) => &self.pairs[a..b],
			_ => &[],
		}
	}

	#[must_use]
	/// # Longest Match.
	///
	/// Return the longest `(length, distance)` at `pos`, or `(0, 0)` if there
	/// isn't one.
	pub(super) fn longest(&self, pos: usize) -> (u16, u16) {
		self.pairs(pos).last().copied().unwrap_or_default()
	}

	#[must_use]
	/// # Distance For Length.
	///
	/// Return the nearest distance reaching `length` at `pos`, if any.
	pub(super) fn distance(&self, pos: usize, length: u16) -> Option<u16> {
		self.pairs(pos).iter().find(|p| length <= p.0).map(|p| p.1)
	}
}
