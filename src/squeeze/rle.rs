/*!
# Flapflate: Huffman RLE Optimization.
*/

use super::LZ77Store;
use crate::{
	DeflateError,
	DynamicTables,
	kat::{
		ensure_two_codes,
		length_limited_code_lengths,
	},
	symbols::END_SYMBOL,
};



#[derive(Debug, Clone)]
/// # Dynamic Lengths.
///
/// The best dynamic-block tables for a store, and the exact size of the
/// block they produce.
///
/// Two sets of lengths are tried: one from the store's actual histogram,
/// the other from counts smoothed to make the table headers cheaper to
/// run-length encode. The smaller is kept.
pub(super) struct DynamicLengths {
	/// # Tables.
	tables: DynamicTables,

	/// # Total Size (Bits).
	size: usize,
}

impl DynamicLengths {
	/// # New.
	///
	/// ## Errors
	///
	/// Errors are only possible if the store holds something it shouldn't.
	pub(super) fn new(store: &LZ77Store) -> Result<Self, DeflateError> {
		let (mut ll_counts, d_counts) = store.histogram();
		ll_counts[usize::from(END_SYMBOL)] = 1;

		let ll_lengths = code_lengths(&ll_counts)?;
		let d_lengths = code_lengths(&d_counts)?;
		let mut out = Self::from_lengths(store, &ll_lengths, &d_lengths)?;

		let ll_lengths2 = optimize_huffman_for_rle(&ll_counts)
			.map_or(Ok(ll_lengths.clone()), |c| code_lengths(&c))?;
		let d_lengths2 = optimize_huffman_for_rle(&d_counts)
			.map_or(Ok(d_lengths.clone()), |c| code_lengths(&c))?;
		if ll_lengths2 != ll_lengths || d_lengths2 != d_lengths {
			let other = Self::from_lengths(store, &ll_lengths2, &d_lengths2)?;
			if other.size < out.size { out = other; }
		}

		Ok(out)
	}

	/// # From Lengths.
	fn from_lengths(store: &LZ77Store, ll_lengths: &[u8], d_lengths: &[u8])
	-> Result<Self, DeflateError> {
		let tables = DynamicTables::new(ll_lengths, d_lengths)?;
		let size = 3 + tables.header_bits() + store.data_bits(ll_lengths, d_lengths);
		Ok(Self { tables, size })
	}
}

impl DynamicLengths {
	#[must_use]
	/// # Size (Bits).
	///
	/// The full block size, three-bit header included.
	pub(super) const fn size(&self) -> usize { self.size }

	#[must_use]
	/// # Into Tables.
	pub(super) fn into_tables(self) -> DynamicTables { self.tables }
}



/// # Code Lengths.
///
/// Fifteen-bit-limited lengths for the counts, with at least two codes.
fn code_lengths(counts: &[u32]) -> Result<Vec<u8>, DeflateError> {
	let mut lengths = length_limited_code_lengths(counts, 15)?;
	ensure_two_codes(&mut lengths);
	Ok(lengths)
}

#[expect(clippy::integer_division, reason = "We want this.")]
/// # Optimize Huffman RLE Compression.
///
/// Smooth out the population counts so the resulting code lengths repeat
/// more, making the RLE part of the header smaller. Used symbols always keep
/// a non-zero count.
///
/// Returns `None` if the counts are all zero.
fn optimize_huffman_for_rle(counts: &[u32]) -> Option<Vec<u32>> {
	let end = counts.iter().rposition(|&c| c != 0)? + 1;
	let mut out = counts.to_vec();
	let counts = &mut out[..end];
	let good = good_for_rle(counts);

	// Find collapseable ranges!
	let mut stride: usize = 0;
	let mut scratch: u32 = counts[0];
	let mut sum: u32 = 0;
	for i in 0..=counts.len() {
		// Time to reset (and maybe collapse).
		if i == counts.len() || good[i] || counts[i].abs_diff(scratch) >= 4 {
			// Collapse the stride if it is as least four and contained
			// something non-zero.
			if sum != 0 && stride >= 4 {
				let v = u32::max((sum + stride as u32 / 2) / stride as u32, 1);
				for c in &mut counts[i - stride..i] { *c = v; }
			}

			// Reset!
			stride = 0;
			sum = 0;

			// With at least three more counts ahead, use a rounded average as
			// the new reference point.
			if let Some(c) = counts.get(i..i + 4) {
				scratch = (c.iter().sum::<u32>() + 2) / 4;
			}
			else if let Some(&c) = counts.get(i) { scratch = c; }
		}

		if let Some(&c) = counts.get(i) {
			stride += 1;
			sum += c;
		}
	}

	Some(out)
}

/// # RLE-Optimized Stretches.
///
/// Flag each count that is part of a run of five or more zeroes or seven or
/// more identical non-zero values; those are already RLE-friendly and should
/// be left alone.
fn good_for_rle(counts: &[u32]) -> Vec<bool> {
	let mut out = Vec::with_capacity(counts.len());
	for run in counts.chunk_by(|a, b| a == b) {
		let good = 5 <= run.len() && (run[0] == 0 || 7 <= run.len());
		out.resize(out.len() + run.len(), good);
	}
	out
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_good_for_rle() {
		let counts = [0, 0, 0, 0, 0, 1, 2, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3];
		let good = good_for_rle(&counts);
		assert_eq!(&good[..5], &[true; 5]);
		assert!(! good[5]);
		assert_eq!(&good[6..13], &[true; 7]);
		assert_eq!(&good[13..], &[false; 6]);
	}

	#[test]
	fn t_optimize_rle() {
		assert_eq!(optimize_huffman_for_rle(&[0, 0, 0]), None);

		// A gently varying run gets flattened to its average.
		let counts = [10, 11, 12, 10, 11, 12, 10, 11, 0, 0];
		let out = optimize_huffman_for_rle(&counts).unwrap();
		assert_eq!(out, vec![11, 11, 11, 11, 11, 11, 11, 11, 0, 0]);

		// Used symbols stay used.
		let counts = [100, 0, 1, 0, 50, 0, 0, 0, 0, 0, 0, 3, 1, 1, 1];
		let out = optimize_huffman_for_rle(&counts).unwrap();
		assert_eq!(out.len(), counts.len());
		for (a, b) in counts.iter().zip(&out) {
			if *a != 0 { assert_ne!(*b, 0); }
		}
	}

	#[test]
	fn t_dynamic_lengths() {
		let mut store = LZ77Store::new();
		for b in b"hello hello hello" { store.push_literal(*b); }
		store.push_match(12, 6).unwrap();

		let lengths = DynamicLengths::new(&store).unwrap();
		let size = lengths.size();
		let tables = lengths.into_tables();

		// The size should match what the encoder actually writes.
		let block = crate::DeflateBlock::dynamic(tables, store.symbols(), true);
		assert_eq!(block.bit_size(0).unwrap(), size);
	}
}
