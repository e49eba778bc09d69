/*!
# Flapflate: Canonical Huffman Trees.
*/

use ahash::RandomState;
use crate::{
	BitReader,
	DeflateError,
	int_to_bits,
	symbols::{
		NUM_D,
		NUM_LL,
	},
};
use std::{
	collections::HashMap,
	sync::LazyLock,
};



/// # Maximum Code Length.
pub const MAX_CODE_LENGTH: u8 = 15;

/// # Fixed Literal/Length Tree.
static FIXED_LL: LazyLock<CanonicalHuffmanTree> = LazyLock::new(|| {
	let mut lengths = [8_u8; NUM_LL];
	lengths[144..256].fill(9);
	lengths[256..280].fill(7);
	CanonicalHuffmanTree::build(&lengths)
});

/// # Fixed Distance Tree.
static FIXED_D: LazyLock<CanonicalHuffmanTree> = LazyLock::new(||
	CanonicalHuffmanTree::build(&[5; NUM_D])
);

/// # Hash Seeds.
///
/// The decode map doesn't need DOS protection, so the seeds are fixed.
const SEEDS: [u64; 4] = [
	0x243F_6A88_85A3_08D3,
	0x1319_8A2E_0370_7344,
	0xA409_3822_299F_31D0,
	0x082E_FA98_EC4E_6C89,
];



#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq)]
/// # Codeword.
///
/// A canonical Huffman code, stored most-significant-bit first. DEFLATE
/// writes these bits in that same order, i.e. reversed relative to every
/// other field.
pub struct Code {
	/// # Bits.
	bits: u16,

	/// # Length.
	len: u8,
}

impl Code {
	#[must_use]
	/// # Bits.
	pub const fn bits(self) -> u16 { self.bits }

	#[must_use]
	/// # Length.
	pub const fn len(self) -> u8 { self.len }

	#[must_use]
	/// # Is Empty?
	pub const fn is_empty(self) -> bool { self.len == 0 }

	#[must_use]
	/// # To Bits.
	///
	/// Return the bits in the order they are written to the stream.
	pub fn to_bits(self) -> Vec<bool> {
		let mut out = int_to_bits(u32::from(self.bits), self.len);
		out.reverse();
		out
	}

	#[must_use]
	/// # Map Key.
	const fn key(self) -> u32 { ((self.len as u32) << 16) | self.bits as u32 }
}



#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
/// # Partial Codeword.
///
/// The bits read so far while decoding a symbol.
pub struct Prefix(Code);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Decode Step.
pub enum Step {
	/// # Need Another Bit.
	Partial(Prefix),

	/// # Symbol Found.
	Symbol(u16),
}



#[derive(Debug, Clone)]
/// # Canonical Huffman Tree.
///
/// The prefix-free code described by a code-length table, per RFC 1951
/// section 3.2.2. Codes of equal length are assigned consecutively in
/// ascending symbol order, and shorter codes numerically precede longer
/// ones.
///
/// A tree is immutable once built. The length table it was built from is
/// retained, so it can always be rebuilt exactly via
/// `CanonicalHuffmanTree::new(tree.lengths())`.
pub struct CanonicalHuffmanTree {
	/// # Code Lengths (by Symbol).
	lengths: Vec<u8>,

	/// # Codes (by Symbol).
	codes: Vec<Code>,

	/// # Decode Map.
	map: HashMap<u32, u16, RandomState>,
}

impl Eq for CanonicalHuffmanTree {}

impl PartialEq for CanonicalHuffmanTree {
	fn eq(&self, other: &Self) -> bool { self.lengths == other.lengths }
}

impl CanonicalHuffmanTree {
	/// # New.
	///
	/// Build a tree from a code-length table. Zero-length entries are unused
	/// symbols.
	///
	/// ## Errors
	///
	/// Returns `CorruptStream` if a length exceeds fifteen bits, or the
	/// lengths over-subscribe the code space.
	pub fn new(lengths: &[u8]) -> Result<Self, DeflateError> {
		if lengths.len() > usize::from(u16::MAX) { return Err(DeflateError::CorruptStream); }

		// Count the codes by length.
		let mut count = [0_u32; MAX_CODE_LENGTH as usize + 1];
		for &l in lengths {
			if MAX_CODE_LENGTH < l { return Err(DeflateError::CorruptStream); }
			count[usize::from(l)] += 1;
		}
		count[0] = 0;

		// Kraft: each length can only use what's left over from the shorter
		// ones.
		let mut left = 1_i64;
		for c in count.iter().copied().skip(1) {
			left = left * 2 - i64::from(c);
			if left < 0 { return Err(DeflateError::CorruptStream); }
		}

		Ok(Self::build(lengths))
	}

	/// # Build (Unchecked).
	///
	/// The lengths must already be valid.
	fn build(lengths: &[u8]) -> Self {
		let mut count = [0_u16; MAX_CODE_LENGTH as usize + 1];
		for &l in lengths { count[usize::from(l)] += 1; }
		count[0] = 0;

		// The first code of each length.
		let mut next_code = [0_u16; MAX_CODE_LENGTH as usize + 1];
		let mut code = 0_u16;
		for bits in 1..=MAX_CODE_LENGTH as usize {
			code = (code.wrapping_add(count[bits - 1])) << 1;
			next_code[bits] = code;
		}

		let mut codes = vec![Code::default(); lengths.len()];
		let mut map = HashMap::with_capacity_and_hasher(
			lengths.len(),
			RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3]),
		);
		for (symbol, (&len, slot)) in lengths.iter().zip(&mut codes).enumerate() {
			if len != 0 {
				let code = Code { bits: next_code[usize::from(len)], len };
				next_code[usize::from(len)] = next_code[usize::from(len)].wrapping_add(1);
				*slot = code;
				map.insert(code.key(), symbol as u16);
			}
		}

		Self { lengths: lengths.to_vec(), codes, map }
	}

	#[must_use]
	/// # Fixed Literal/Length Tree.
	pub fn fixed_ll() -> &'static Self { &FIXED_LL }

	#[must_use]
	/// # Fixed Distance Tree.
	pub fn fixed_d() -> &'static Self { &FIXED_D }
}

impl CanonicalHuffmanTree {
	#[must_use]
	/// # Code Lengths.
	pub fn lengths(&self) -> &[u8] { &self.lengths }

	#[must_use]
	/// # Has Symbol?
	pub fn contains(&self, symbol: u16) -> bool {
		self.codes.get(usize::from(symbol)).is_some_and(|c| ! c.is_empty())
	}

	/// # Encode.
	///
	/// Return the codeword for `symbol`.
	///
	/// ## Errors
	///
	/// Returns `UnknownSymbol` if the symbol has no code.
	pub fn encode(&self, symbol: u16) -> Result<Code, DeflateError> {
		self.codes.get(usize::from(symbol))
			.copied()
			.filter(|c| ! c.is_empty())
			.ok_or(DeflateError::UnknownSymbol)
	}

	/// # Decode Step.
	///
	/// Extend `prefix` with the next `bit` read from the stream, returning
	/// either the matching symbol or the longer prefix. Start each symbol
	/// with `Prefix::default()`.
	///
	/// ## Errors
	///
	/// Returns `CorruptStream` if the prefix grows past the longest possible
	/// code without matching anything.
	pub fn step(&self, prefix: Prefix, bit: u8) -> Result<Step, DeflateError> {
		let Prefix(code) = prefix;
		if MAX_CODE_LENGTH <= code.len { return Err(DeflateError::CorruptStream); }

		let code = Code {
			bits: (code.bits << 1) | u16::from(bit & 1),
			len: code.len + 1,
		};
		Ok(self.map.get(&code.key()).map_or(Step::Partial(Prefix(code)), |&s| Step::Symbol(s)))
	}

	/// # Decode.
	///
	/// Read bits until a whole symbol is found.
	///
	/// ## Errors
	///
	/// Returns `Incomplete` if the reader runs dry, or `CorruptStream` if
	/// the bits don't match any code.
	pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16, DeflateError> {
		let mut prefix = Prefix::default();
		loop {
			match self.step(prefix, reader.read_bit()?)? {
				Step::Partial(p) => { prefix = p; },
				Step::Symbol(s) => return Ok(s),
			}
		}
	}
}



#[cfg(test)]
mod test {
	use super::*;

	/// # Kraft Sum (Scaled).
	fn kraft(tree: &CanonicalHuffmanTree) -> u32 {
		tree.lengths().iter()
			.filter(|&&l| l != 0)
			.map(|&l| 1_u32 << (MAX_CODE_LENGTH - l))
			.sum()
	}

	#[test]
	fn t_rfc_example() {
		// The example from RFC 1951 3.2.2.
		let tree = CanonicalHuffmanTree::new(&[3, 3, 3, 3, 3, 2, 4, 4]).unwrap();
		let expected = [
			(0b010, 3), (0b011, 3), (0b100, 3), (0b101, 3),
			(0b110, 3), (0b00, 2), (0b1110, 4), (0b1111, 4),
		];
		for (symbol, (bits, len)) in expected.into_iter().enumerate() {
			let code = tree.encode(symbol as u16).unwrap();
			assert_eq!(code.bits(), bits, "Symbol {symbol}.");
			assert_eq!(code.len(), len, "Symbol {symbol}.");
		}

		assert_eq!(
			tree.encode(6).unwrap().to_bits(),
			[true, true, true, false],
		);
		assert_eq!(kraft(&tree), 1 << MAX_CODE_LENGTH);
	}

	#[test]
	fn t_fixed() {
		let ll = CanonicalHuffmanTree::fixed_ll();
		for (symbol, bits, len) in [
			(0, 0b0011_0000, 8),
			(143, 0b1011_1111, 8),
			(144, 0b1_1001_0000, 9),
			(255, 0b1_1111_1111, 9),
			(256, 0, 7),
			(279, 0b001_0111, 7),
			(280, 0b1100_0000, 8),
			(287, 0b1100_0111, 8),
		] {
			let code = ll.encode(symbol).unwrap();
			assert_eq!((code.bits(), code.len()), (bits, len), "Symbol {symbol}.");
		}

		let d = CanonicalHuffmanTree::fixed_d();
		for symbol in 0..32 {
			let code = d.encode(symbol).unwrap();
			assert_eq!((code.bits(), code.len()), (symbol, 5));
		}

		assert_eq!(kraft(ll), 1 << MAX_CODE_LENGTH);
		assert_eq!(kraft(d), 1 << MAX_CODE_LENGTH);
	}

	#[test]
	fn t_determinism() {
		let lengths = [0, 4, 4, 0, 2, 3, 4, 3, 4, 0, 0, 3, 0];
		let a = CanonicalHuffmanTree::new(&lengths).unwrap();
		let b = CanonicalHuffmanTree::new(a.lengths()).unwrap();
		assert_eq!(a, b);
		for s in 0..lengths.len() as u16 {
			assert_eq!(a.encode(s).ok(), b.encode(s).ok());
			assert_eq!(a.contains(s), lengths[usize::from(s)] != 0);
		}

		// Prefix-free: no code may start another.
		let codes: Vec<Code> = (0..lengths.len() as u16).filter_map(|s| a.encode(s).ok()).collect();
		for x in &codes {
			for y in &codes {
				if x != y && x.len() <= y.len() {
					assert_ne!(y.bits() >> (y.len() - x.len()), x.bits());
				}
			}
		}
	}

	#[test]
	fn t_decode() {
		let tree = CanonicalHuffmanTree::new(&[3, 3, 3, 3, 3, 2, 4, 4]).unwrap();

		// Walk each code bit by bit.
		for symbol in 0..8_u16 {
			let code = tree.encode(symbol).unwrap();
			let bits = code.to_bits();
			let mut prefix = Prefix::default();
			for (i, &b) in bits.iter().enumerate() {
				match tree.step(prefix, u8::from(b)).unwrap() {
					Step::Partial(p) => {
						assert!(i + 1 < bits.len(), "Symbol {symbol} ended late.");
						prefix = p;
					},
					Step::Symbol(s) => {
						assert_eq!(i + 1, bits.len(), "Symbol {symbol} ended early.");
						assert_eq!(s, symbol);
					},
				}
			}
		}

		// Symbol 7 (1111) then 5 (00), packed LSB-first.
		let data = [0b0000_1111];
		let mut reader = BitReader::new(&data, 0);
		assert_eq!(tree.decode(&mut reader), Ok(7));
		assert_eq!(tree.decode(&mut reader), Ok(5));
		assert_eq!(reader.position(), 6);

		// Running out is not the same as being wrong.
		let mut reader = BitReader::new(&data, 7);
		assert_eq!(tree.decode(&mut reader), Err(DeflateError::Incomplete));
	}

	#[test]
	fn t_incomplete_tree() {
		// A lone code can't match a one bit.
		let tree = CanonicalHuffmanTree::new(&[0, 1]).unwrap();
		assert_eq!(tree.encode(1).unwrap().bits(), 0);
		let data = [0xFF, 0xFF];
		let mut reader = BitReader::new(&data, 0);
		assert_eq!(tree.decode(&mut reader), Err(DeflateError::CorruptStream));

		// An empty tree has nothing to encode.
		let tree = CanonicalHuffmanTree::new(&[0; 4]).unwrap();
		assert_eq!(tree.encode(0), Err(DeflateError::UnknownSymbol));
	}

	#[test]
	fn t_invalid() {
		// Three one-bit codes won't fit.
		assert_eq!(
			CanonicalHuffmanTree::new(&[1, 1, 1]).unwrap_err(),
			DeflateError::CorruptStream,
		);
		assert_eq!(
			CanonicalHuffmanTree::new(&[16, 1]).unwrap_err(),
			DeflateError::CorruptStream,
		);
	}
}
