/*!
# Flapflate: Symbols.

Lookup tables and helpers for DEFLATE length and distance symbols, their
extra bits, and the jumbled order used when writing code-length tables.
*/

use crate::DeflateError;



/// # Minimum Match Length.
pub const MIN_MATCH: u16 = 3;

/// # Maximum Match Length.
pub const MAX_MATCH: u16 = 258;

/// # Maximum Match Distance.
pub const MAX_DISTANCE: u16 = 32_768;

/// # End-of-Block Symbol.
pub(crate) const END_SYMBOL: u16 = 256;

/// # Number of Literal/Length Symbols.
///
/// Symbols `286` and `287` only exist to round out the fixed tree.
pub(crate) const NUM_LL: usize = 288;

/// # Number of Distance Symbols.
///
/// Again, the last two are never used.
pub(crate) const NUM_D: usize = 32;

/// # Number of Code-Length Symbols.
pub(crate) const NUM_CL: usize = 19;

/// # Jumbled Tree Symbols.
///
/// Code-length code lengths are written in this order.
pub(crate) const CL_ORDER: [usize; NUM_CL] = [
	16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// # Length Base (by Symbol - 257).
const LENGTH_BASE: [u16; 29] = [
	3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31,
	35, 43, 51, 59, 67, 83, 99, 115, 131, 163, 195, 227, 258,
];

/// # Length Extra Bits (by Symbol - 257).
const LENGTH_BITS: [u8; 29] = [
	0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2,
	3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// # Distance Base (by Symbol).
const DISTANCE_BASE: [u16; 30] = [
	1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193,
	257, 385, 513, 769, 1025, 1537, 2049, 3073, 4097, 6145,
	8193, 12_289, 16_385, 24_577,
];

/// # Distance Extra Bits (by Symbol).
///
/// The table is padded to `32` so any distance symbol can index it.
pub(crate) const DISTANCE_BITS: [u8; NUM_D] = [
	0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6,
	7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13, 0, 0,
];



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Symbol With Extra Bits.
///
/// A length or distance broken down into its Huffman symbol and the extra
/// bits that follow it.
pub(crate) struct Coded {
	/// # Symbol.
	pub(crate) symbol: u16,

	/// # Number of Extra Bits.
	pub(crate) bits: u8,

	/// # Extra Bit Value.
	pub(crate) value: u16,
}

/// # Length Symbol.
///
/// Break a match length (`3..=258`) down into its literal/length symbol
/// (`257..=285`) and extra bits.
///
/// ## Errors
///
/// Out-of-range lengths return `UnknownSymbol`.
pub(crate) fn length_symbol(length: u16) -> Result<Coded, DeflateError> {
	if ! (MIN_MATCH..=MAX_MATCH).contains(&length) {
		return Err(DeflateError::UnknownSymbol);
	}

	let idx = LENGTH_BASE.partition_point(|&b| b <= length) - 1;
	Ok(Coded {
		symbol: 257 + idx as u16,
		bits: LENGTH_BITS[idx],
		value: length - LENGTH_BASE[idx],
	})
}

/// # Length From Symbol.
///
/// Return the base length and extra bit count for a literal/length symbol
/// (`257..=285`).
///
/// ## Errors
///
/// Anything else is a `CorruptStream`.
pub(crate) fn length_base(symbol: u16) -> Result<(u16, u8), DeflateError> {
	let idx = usize::from(symbol.checked_sub(257).ok_or(DeflateError::CorruptStream)?);
	LENGTH_BASE.get(idx)
		.zip(LENGTH_BITS.get(idx))
		.map(|(&base, &bits)| (base, bits))
		.ok_or(DeflateError::CorruptStream)
}

#[must_use]
/// # Length Extra Bits.
///
/// Same as `length_symbol`, but only the bit count is returned. Used
/// heavily by the cost models.
pub(crate) const fn length_bits(length: u16) -> u8 {
	if length < 11 || MAX_MATCH <= length { 0 }
	else { (length - 3).ilog2() as u8 - 2 }
}

/// # Distance Symbol.
///
/// Break a distance (`1..=32768`) down into its symbol (`0..=29`) and extra
/// bits.
///
/// ## Errors
///
/// Out-of-range distances return `UnknownSymbol`.
pub(crate) fn distance_symbol(distance: u16) -> Result<Coded, DeflateError> {
	if ! (1..=MAX_DISTANCE).contains(&distance) {
		return Err(DeflateError::UnknownSymbol);
	}

	let symbol = distance_symbol_fast(distance);
	let idx = usize::from(symbol);
	Ok(Coded {
		symbol,
		bits: DISTANCE_BITS[idx],
		value: distance - DISTANCE_BASE[idx],
	})
}

#[must_use]
/// # Distance Symbol (Unchecked).
///
/// The distance must be in range.
pub(crate) const fn distance_symbol_fast(distance: u16) -> u16 {
	if distance < 5 { distance.saturating_sub(1) }
	else {
		let d_log = (distance - 1).ilog2();
		let r = ((distance - 1) >> (d_log - 1)) & 1;
		(d_log * 2) as u16 + r
	}
}

/// # Distance From Symbol.
///
/// Return the base distance and extra bit count for a distance symbol
/// (`0..=29`).
///
/// ## Errors
///
/// Symbols `30` and `31` are a `CorruptStream`.
pub(crate) fn distance_base(symbol: u16) -> Result<(u16, u8), DeflateError> {
	let idx = usize::from(symbol);
	DISTANCE_BASE.get(idx)
		.zip(DISTANCE_BITS.get(idx))
		.map(|(&base, &bits)| (base, bits))
		.ok_or(DeflateError::CorruptStream)
}
