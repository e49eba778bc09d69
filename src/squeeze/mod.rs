/*!
# Flapflate: Squeeze.

The default `BlockOptimizer`, a zopfli-style iterative squeezer.

Each pass caches the matches for the new bytes, seeds symbol statistics
with a greedy parse, then repeatedly re-parses the block along its
cheapest path under the statistics of the previous parse, keeping
whichever parse makes the smallest dynamic block. The result is weighed
against a fixed-tree parse and plain stored blocks, and the smallest wins.
*/

mod cache;
mod lz77;
mod rle;
mod stats;

use cache::MatchCache;
use lz77::{
	fixed_bits,
	greedy,
	LZ77Store,
	optimal,
};
use rle::DynamicLengths;
use stats::{
	CostModel,
	FixedCost,
	RanState,
	SymbolStats,
};
use std::num::NonZeroU32;
use crate::{
	BitWriter,
	BlockOptimizer,
	DeflateBlock,
	DeflateError,
	MAX_STORED,
	OptimizeRequest,
	Optimized,
};



#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
/// # Squeeze Optimizer.
///
/// The default `BlockOptimizer`. Every call is independent and
/// deterministic; the same request always yields the same bytes.
///
/// ## Examples
///
/// ```
/// use flapflate::{CompressOptions, Squeeze, StreamCompressor};
///
/// let mut enc = StreamCompressor::with_optimizer(
///     CompressOptions::default(),
///     Squeeze,
/// ).unwrap();
/// assert!(enc.compress(b"Hello World").unwrap().is_empty());
/// ```
pub struct Squeeze;

impl BlockOptimizer for Squeeze {
	fn optimize(&mut self, req: OptimizeRequest<'_>) -> Result<Optimized, DeflateError> {
		let mut out = BitWriter::resume(req.tail.to_vec(), req.bit_offset);
		let block = req.data.get(req.history..).ok_or(DeflateError::CorruptStream)?;

		if block.is_empty() {
			if req.last { DeflateBlock::fixed(Vec::new(), true).encode(&mut out)?; }
		}
		else { squeeze(req.data, req.history, req.last, req.effort, &mut out)?; }

		let (bytes, bit_offset) = out.into_parts();
		Ok(Optimized { bytes, bit_offset })
	}
}



/// # Squeeze a Block.
///
/// Parse `data[history..]` and write it to `out` as the smallest of stored,
/// fixed, or dynamic.
fn squeeze(
	data: &[u8],
	history: usize,
	last: bool,
	effort: NonZeroU32,
	out: &mut BitWriter,
) -> Result<(), DeflateError> {
	let cache = MatchCache::new(data, history);
	let block = &data[history..];

	// Dynamic.
	let (store, lengths) = squeeze_dynamic(block, &cache, effort)?;
	let dynamic_size = lengths.size();

	// Fixed.
	let fixed_store = optimal(block, &cache, &FixedCost)?;
	let fixed_size = 3 + fixed_bits(&fixed_store);

	// Stored.
	let stored_size = stored_bits(block.len(), out.bit_offset());

	log::trace!(
		"Squeezed {} bytes: stored {stored_size}, fixed {fixed_size}, dynamic {dynamic_size} bits.",
		block.len(),
	);

	if stored_size <= fixed_size && stored_size <= dynamic_size {
		let mut chunks = block.chunks(MAX_STORED).peekable();
		while let Some(chunk) = chunks.next() {
			let chunk_last = last && chunks.peek().is_none();
			DeflateBlock::stored(chunk, chunk_last)?.encode(out)?;
		}
	}
	else if fixed_size <= dynamic_size {
		DeflateBlock::fixed(fixed_store.symbols(), last).encode(out)?;
	}
	else {
		DeflateBlock::dynamic(lengths.into_tables(), store.symbols(), last).encode(out)?;
	}

	Ok(())
}

/// # Squeeze (Dynamic).
///
/// Run `effort` rounds of statistics-driven shortest-path parsing, returning
/// the parse with the smallest dynamic block along with its tables.
///
/// When the size stops changing, the best statistics so far are randomized
/// a little to shake things loose.
fn squeeze_dynamic(block: &[u8], cache: &MatchCache, effort: NonZeroU32)
-> Result<(LZ77Store, DynamicLengths), DeflateError> {
	let mut best = greedy(block, cache)?;
	let mut best_lengths = DynamicLengths::new(&best)?;

	let mut stats = SymbolStats::new();
	stats.load_store(&best);
	stats.crunch();

	let mut best_stats = stats;
	let mut ran = RanState::new();
	let mut randomized = false;
	let mut last_size = usize::MAX;
	for i in 0..effort.get() {
		let store = optimal(block, cache, &stats)?;
		let lengths = DynamicLengths::new(&store)?;
		let size = lengths.size();

		// Keep the best.
		let improved = size < best_lengths.size();
		if improved { best_stats = stats; }

		stats.reload_store(&store, randomized);
		stats.crunch();

		if improved {
			best = store;
			best_lengths = lengths;
		}

		// Shake things up if we're stuck.
		if 5 < i && size == last_size {
			stats = best_stats;
			stats.randomize(&mut ran);
			stats.crunch();
			randomized = true;
		}

		last_size = size;
	}

	Ok((best, best_lengths))
}

/// # Stored Size (Bits).
///
/// The bits needed to store `len` bytes as one or more stored blocks
/// starting `bit_offset` bits into a byte.
const fn stored_bits(len: usize, bit_offset: u8) -> usize {
	let blocks = len.div_ceil(MAX_STORED);
	let blocks = if blocks == 0 { 1 } else { blocks };

	// The first header is padded from the current offset, the rest from
	// zero (three bits + five of padding).
	let first_pad = (8 - (bit_offset as usize + 3) % 8) % 8;
	3 + first_pad + (blocks - 1) * 8 + blocks * 32 + len * 8
}
