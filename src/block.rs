/*!
# Flapflate: Blocks.

Encoding and decoding of individual DEFLATE blocks.
*/

use crate::{
	BitReader,
	BitWriter,
	CanonicalHuffmanTree,
	DeflateError,
	kat::{
		ensure_two_codes,
		length_limited_code_lengths,
	},
	symbols::{
		CL_ORDER,
		distance_base,
		distance_symbol,
		END_SYMBOL,
		length_base,
		length_symbol,
		NUM_CL,
		NUM_D,
		NUM_LL,
	},
};



/// # Max Stored Block Size.
pub const MAX_STORED: usize = u16::MAX as usize;

/// # Max Literal/Length Table Size.
const MAX_HLIT: usize = 286;

/// # Max Distance Table Size.
const MAX_HDIST: usize = 30;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Block Symbol.
pub enum Symbol {
	/// # Literal Byte.
	Literal(u8),

	/// # Back-Reference.
	///
	/// Copy `length` (`3..=258`) bytes starting `distance` (`1..=32768`)
	/// bytes back.
	Match {
		/// # Length.
		length: u16,

		/// # Distance.
		distance: u16,
	},

	/// # End of Block.
	End,
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Block Kind.
pub enum BlockKind {
	/// # Stored (Uncompressed).
	Stored,

	/// # Fixed Huffman Trees.
	Fixed,

	/// # Dynamic Huffman Trees.
	Dynamic(DynamicTables),
}

impl BlockKind {
	#[must_use]
	/// # Type Bits.
	///
	/// The two-bit `BTYPE` value.
	pub const fn as_u8(&self) -> u8 {
		match self {
			Self::Stored => 0,
			Self::Fixed => 1,
			Self::Dynamic(_) => 2,
		}
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Code-Length Token.
///
/// One entry of a run-length-encoded code-length table: either a literal
/// length (`0..=15`) or a run code (`16..=18`) with its extra-bit value.
pub(crate) struct RleToken {
	/// # Symbol.
	pub(crate) symbol: u8,

	/// # Extra Bit Value.
	pub(crate) extra: u8,
}

impl RleToken {
	/// # Extra Bit Count.
	pub(crate) const fn bits(self) -> u8 {
		match self.symbol {
			16 => 2,
			17 => 3,
			18 => 7,
			_ => 0,
		}
	}
}

/// # Run-Length Encode Code Lengths.
///
/// Runs are broken up greedily: zero runs of eleven or more become `18`
/// (up to 138), shorter zero runs of three or more become `17`, and repeats
/// of the previous length three or more times become `16` (up to six).
/// Everything else is written as-is.
pub(crate) fn rle_lengths(lengths: &[u8]) -> Vec<RleToken> {
	let mut out = Vec::new();
	let mut prev = None;
	let mut rest = lengths;
	while let [l, ..] = rest {
		let l = *l;
		let run = rest.iter().take_while(|&&x| x == l).count();
		let (token, used) =
			if l == 0 && 11 <= run {
				let n = run.min(138);
				(RleToken { symbol: 18, extra: (n - 11) as u8 }, n)
			}
			else if l == 0 && 3 <= run {
				(RleToken { symbol: 17, extra: (run - 3) as u8 }, run)
			}
			else if l != 0 && prev == Some(l) && 3 <= run {
				let n = run.min(6);
				(RleToken { symbol: 16, extra: (n - 3) as u8 }, n)
			}
			else { (RleToken { symbol: l, extra: 0 }, 1) };

		out.push(token);
		prev = Some(l);
		rest = &rest[used..];
	}
	out
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Dynamic Tables.
///
/// The code-length tables carried in a dynamic block header: literal/length
/// (`HLIT` entries), distance (`HDIST` entries), and the 19-symbol
/// code-length alphabet used to compress the other two.
pub struct DynamicTables {
	/// # Literal/Length Code Lengths.
	ll_lengths: Vec<u8>,

	/// # Distance Code Lengths.
	d_lengths: Vec<u8>,

	/// # Code-Length Code Lengths.
	cl_lengths: [u8; NUM_CL],
}

impl DynamicTables {
	/// # New.
	///
	/// Build the header tables from literal/length and distance code
	/// lengths. Trailing zeroes are trimmed (down to the minimum table sizes)
	/// and the code-length alphabet is derived from the run-length encoded
	/// tables, limited to seven bits.
	///
	/// ## Errors
	///
	/// Returns `UnknownSymbol` if a length is set for a symbol DEFLATE can't
	/// send in a dynamic block (`286+` or distance `30+`), `CorruptStream` if
	/// either table is not a valid Huffman code.
	pub fn new(ll_lengths: &[u8], d_lengths: &[u8]) -> Result<Self, DeflateError> {
		let ll_lengths = trim_lengths(ll_lengths, 257);
		let d_lengths = trim_lengths(d_lengths, 1);
		if MAX_HLIT < ll_lengths.len() || MAX_HDIST < d_lengths.len() {
			return Err(DeflateError::UnknownSymbol);
		}

		// Make sure they work.
		CanonicalHuffmanTree::new(&ll_lengths)?;
		CanonicalHuffmanTree::new(&d_lengths)?;

		let mut counts = [0_u32; NUM_CL];
		for t in rle_lengths(&ll_lengths).into_iter().chain(rle_lengths(&d_lengths)) {
			counts[usize::from(t.symbol)] += 1;
		}
		let mut cl_lengths = [0; NUM_CL];
		for (dst, src) in cl_lengths.iter_mut().zip(length_limited_code_lengths(&counts, 7)?) {
			*dst = src;
		}
		ensure_two_codes(&mut cl_lengths);

		Ok(Self { ll_lengths, d_lengths, cl_lengths })
	}

	/// # For Symbols.
	///
	/// Derive optimal (fifteen-bit-limited) tables from the symbol
	/// frequencies of `symbols`. The end-of-block symbol is always counted
	/// once, and each table is given at least two codes.
	///
	/// ## Errors
	///
	/// Returns `UnknownSymbol` for out-of-range matches.
	pub fn for_symbols(symbols: &[Symbol]) -> Result<Self, DeflateError> {
		let mut ll_counts = [0_u32; NUM_LL];
		let mut d_counts = [0_u32; NUM_D];
		for s in symbols {
			match *s {
				Symbol::Literal(b) => { ll_counts[usize::from(b)] += 1; },
				Symbol::Match { length, distance } => {
					ll_counts[usize::from(length_symbol(length)?.symbol)] += 1;
					d_counts[usize::from(distance_symbol(distance)?.symbol)] += 1;
				},
				Symbol::End => {},
			}
		}
		ll_counts[usize::from(END_SYMBOL)] = 1;

		let mut ll_lengths = length_limited_code_lengths(&ll_counts, 15)?;
		let mut d_lengths = length_limited_code_lengths(&d_counts, 15)?;
		ensure_two_codes(&mut ll_lengths);
		ensure_two_codes(&mut d_lengths);
		Self::new(&ll_lengths, &d_lengths)
	}

	/// # Read.
	fn read(reader: &mut BitReader<'_>) -> Result<Self, DeflateError> {
		let hlit = reader.read_bits(5)? as usize + 257;
		let hdist = reader.read_bits(5)? as usize + 1;
		let hclen = reader.read_bits(4)? as usize + 4;
		if MAX_HLIT < hlit || MAX_HDIST < hdist { return Err(DeflateError::CorruptStream); }

		let mut cl_lengths = [0_u8; NUM_CL];
		for &i in CL_ORDER.iter().take(hclen) {
			cl_lengths[i] = reader.read_bits(3)? as u8;
		}
		let cl_tree = CanonicalHuffmanTree::new(&cl_lengths)?;

		// The two tables are coded as one sequence; runs can cross from one
		// to the other.
		let total = hlit + hdist;
		let mut lengths: Vec<u8> = Vec::with_capacity(total);
		while lengths.len() < total {
			let (value, repeat) = match cl_tree.decode(reader)? {
				s @ 0..=15 => (s as u8, 1),
				16 => {
					let prev = lengths.last().copied().ok_or(DeflateError::CorruptStream)?;
					(prev, 3 + reader.read_bits(2)? as usize)
				},
				17 => (0, 3 + reader.read_bits(3)? as usize),
				18 => (0, 11 + reader.read_bits(7)? as usize),
				_ => return Err(DeflateError::CorruptStream),
			};
			if total < lengths.len() + repeat { return Err(DeflateError::CorruptStream); }
			lengths.resize(lengths.len() + repeat, value);
		}

		let d_lengths = lengths.split_off(hlit);
		if lengths[usize::from(END_SYMBOL)] == 0 { return Err(DeflateError::CorruptStream); }

		Ok(Self { ll_lengths: lengths, d_lengths, cl_lengths })
	}

	/// # Write.
	///
	/// Write the header and return the literal/length and distance trees.
	fn write(&self, out: &mut BitWriter)
	-> Result<(CanonicalHuffmanTree, CanonicalHuffmanTree), DeflateError> {
		let (ll, d) = self.trees()?;
		let cl_tree = CanonicalHuffmanTree::new(&self.cl_lengths)?;

		let hclen = self.hclen();
		out.add_bits((self.hlit() - 257) as u32, 5);
		out.add_bits((self.hdist() - 1) as u32, 5);
		out.add_bits((hclen - 4) as u32, 4);
		for &i in CL_ORDER.iter().take(hclen) {
			out.add_bits(u32::from(self.cl_lengths[i]), 3);
		}

		for t in rle_lengths(&self.ll_lengths).into_iter().chain(rle_lengths(&self.d_lengths)) {
			let code = cl_tree.encode(u16::from(t.symbol))?;
			out.add_huffman_bits(u32::from(code.bits()), code.len());
			out.add_bits(u32::from(t.extra), t.bits());
		}

		Ok((ll, d))
	}
}

impl DynamicTables {
	#[must_use]
	/// # Literal/Length Code Lengths.
	pub fn ll_lengths(&self) -> &[u8] { &self.ll_lengths }

	#[must_use]
	/// # Distance Code Lengths.
	pub fn d_lengths(&self) -> &[u8] { &self.d_lengths }

	#[must_use]
	/// # Code-Length Code Lengths.
	pub const fn cl_lengths(&self) -> &[u8; NUM_CL] { &self.cl_lengths }

	#[must_use]
	/// # HLIT.
	pub fn hlit(&self) -> usize { self.ll_lengths.len() }

	#[must_use]
	/// # HDIST.
	pub fn hdist(&self) -> usize { self.d_lengths.len() }

	#[must_use]
	/// # HCLEN.
	///
	/// The number of code-length code lengths written, trailing zeroes (in
	/// `CL_ORDER`) excluded.
	pub fn hclen(&self) -> usize {
		CL_ORDER.iter()
			.rposition(|&i| self.cl_lengths[i] != 0)
			.map_or(4, |p| usize::max(p + 1, 4))
	}

	#[must_use]
	/// # Header Size (Bits).
	///
	/// The number of bits `DynamicTables::write` will produce, not counting
	/// the three-bit block header.
	pub fn header_bits(&self) -> usize {
		let tokens: usize = rle_lengths(&self.ll_lengths).into_iter()
			.chain(rle_lengths(&self.d_lengths))
			.map(|t| usize::from(self.cl_lengths[usize::from(t.symbol)] + t.bits()))
			.sum();
		14 + 3 * self.hclen() + tokens
	}

	/// # Trees.
	///
	/// Build the literal/length and distance trees.
	///
	/// ## Errors
	///
	/// Returns `CorruptStream` if either table is over-subscribed.
	pub fn trees(&self) -> Result<(CanonicalHuffmanTree, CanonicalHuffmanTree), DeflateError> {
		Ok((
			CanonicalHuffmanTree::new(&self.ll_lengths)?,
			CanonicalHuffmanTree::new(&self.d_lengths)?,
		))
	}
}

/// # Trim Lengths.
///
/// Drop trailing zeroes, but keep at least `min` entries.
fn trim_lengths(lengths: &[u8], min: usize) -> Vec<u8> {
	let end = lengths.iter().rposition(|&l| l != 0).map_or(0, |p| p + 1);
	let mut out = lengths[..end].to_vec();
	if out.len() < min { out.resize(min, 0); }
	out
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Decode Result.
pub enum Decoded {
	/// # Need More Input.
	///
	/// The data ended before the block did; try again with more bytes from
	/// the same starting position.
	Incomplete,

	/// # A Whole Block.
	Block(DeflateBlock),
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # DEFLATE Block.
///
/// A single block: its kind, its final flag, and the symbols it carries,
/// always terminated by `Symbol::End`.
pub struct DeflateBlock {
	/// # Kind.
	kind: BlockKind,

	/// # Final Block?
	last: bool,

	/// # Symbols.
	symbols: Vec<Symbol>,

	/// # Bits Consumed.
	bits: usize,
}

impl DeflateBlock {
	/// # Stored Block.
	///
	/// ## Errors
	///
	/// Returns `Unstorable` if `data` is longer than `65535` bytes.
	pub fn stored(data: &[u8], last: bool) -> Result<Self, DeflateError> {
		if MAX_STORED < data.len() { return Err(DeflateError::Unstorable); }
		let symbols = data.iter().copied().map(Symbol::Literal).collect();
		Ok(Self::new(BlockKind::Stored, symbols, last))
	}

	#[must_use]
	/// # Fixed Block.
	pub fn fixed(symbols: Vec<Symbol>, last: bool) -> Self {
		Self::new(BlockKind::Fixed, symbols, last)
	}

	#[must_use]
	/// # Dynamic Block.
	pub fn dynamic(tables: DynamicTables, symbols: Vec<Symbol>, last: bool) -> Self {
		Self::new(BlockKind::Dynamic(tables), symbols, last)
	}

	#[must_use]
	/// # New.
	///
	/// Any `Symbol::End` within `symbols` is dropped and a single one
	/// appended.
	pub fn new(kind: BlockKind, mut symbols: Vec<Symbol>, last: bool) -> Self {
		symbols.retain(|s| ! matches!(s, Symbol::End));
		symbols.push(Symbol::End);
		Self { kind, last, symbols, bits: 0 }
	}
}

impl DeflateBlock {
	#[must_use]
	/// # Kind.
	pub const fn kind(&self) -> &BlockKind { &self.kind }

	#[must_use]
	/// # Is Final?
	pub const fn is_last(&self) -> bool { self.last }

	#[must_use]
	/// # Symbols.
	pub fn symbols(&self) -> &[Symbol] { &self.symbols }

	#[must_use]
	/// # Bits Consumed.
	///
	/// For a decoded block, the number of bits it occupied in the source,
	/// header included. Constructed blocks report zero; see
	/// `DeflateBlock::bit_size`.
	pub const fn bits(&self) -> usize { self.bits }

	/// # Encoded Size (Bits).
	///
	/// Return the number of bits the block occupies when written
	/// `bit_offset` bits into a byte. (Stored blocks pad to the next byte
	/// boundary, so the offset matters.)
	///
	/// ## Errors
	///
	/// See `DeflateBlock::encode`.
	pub fn bit_size(&self, bit_offset: u8) -> Result<usize, DeflateError> {
		let bit_offset = bit_offset & 7;
		let mut out =
			if bit_offset == 0 { BitWriter::new() }
			else { BitWriter::resume(vec![0], bit_offset) };
		self.encode(&mut out)
	}
}

impl DeflateBlock {
	/// # Encode.
	///
	/// Write the block to `out`, returning the number of bits written.
	///
	/// ## Errors
	///
	/// Returns `UnknownSymbol` if a symbol has no code in the block's trees
	/// (or is out of range), or `Unstorable` if a stored block contains a
	/// match or too many bytes.
	pub fn encode(&self, out: &mut BitWriter) -> Result<usize, DeflateError> {
		let start = out.bit_len();
		match &self.kind {
			BlockKind::Stored => {
				let data = self.symbols.iter()
					.filter_map(|s| match *s {
						Symbol::Literal(b) => Some(Ok(b)),
						Symbol::Match { .. } => Some(Err(DeflateError::Unstorable)),
						Symbol::End => None,
					})
					.collect::<Result<Vec<u8>, DeflateError>>()?;
				let len = u16::try_from(data.len()).map_err(|_| DeflateError::Unstorable)?;
				let [a, b] = len.to_le_bytes();
				let [c, d] = (! len).to_le_bytes();

				out.add_header(self.last, 0);
				out.add_bytes(&[a, b, c, d]);
				out.add_bytes(&data);
			},
			BlockKind::Fixed => {
				out.add_header(self.last, 1);
				self.write_symbols(
					out,
					CanonicalHuffmanTree::fixed_ll(),
					CanonicalHuffmanTree::fixed_d(),
				)?;
			},
			BlockKind::Dynamic(tables) => {
				out.add_header(self.last, 2);
				let (ll, d) = tables.write(out)?;
				self.write_symbols(out, &ll, &d)?;
			},
		}

		Ok(out.bit_len() - start)
	}

	/// # Write Symbols.
	fn write_symbols(
		&self,
		out: &mut BitWriter,
		ll: &CanonicalHuffmanTree,
		d: &CanonicalHuffmanTree,
	) -> Result<(), DeflateError> {
		for s in &self.symbols {
			match *s {
				Symbol::Literal(b) => {
					let code = ll.encode(u16::from(b))?;
					out.add_huffman_bits(u32::from(code.bits()), code.len());
				},
				Symbol::Match { length, distance } => {
					let lsym = length_symbol(length)?;
					let code = ll.encode(lsym.symbol)?;
					out.add_huffman_bits(u32::from(code.bits()), code.len());
					out.add_bits(u32::from(lsym.value), lsym.bits);

					let dsym = distance_symbol(distance)?;
					let code = d.encode(dsym.symbol)?;
					out.add_huffman_bits(u32::from(code.bits()), code.len());
					out.add_bits(u32::from(dsym.value), dsym.bits);
				},
				Symbol::End => {
					let code = ll.encode(END_SYMBOL)?;
					out.add_huffman_bits(u32::from(code.bits()), code.len());
				},
			}
		}
		Ok(())
	}
}

impl DeflateBlock {
	/// # Decode.
	///
	/// Decode the block beginning at (absolute) bit position `start` of
	/// `data`. If the data runs out first, `Decoded::Incomplete` is returned
	/// and nothing is lost; call again once more data is available.
	///
	/// ## Errors
	///
	/// Returns `CorruptStream` if the block is invalid.
	pub fn decode(data: &[u8], start: usize) -> Result<Decoded, DeflateError> {
		let mut reader = BitReader::new(data, start);
		match Self::read(&mut reader) {
			Ok(mut block) => {
				block.bits = reader.position() - start;
				Ok(Decoded::Block(block))
			},
			Err(DeflateError::Incomplete) => Ok(Decoded::Incomplete),
			Err(e) => Err(e),
		}
	}

	/// # Read.
	fn read(reader: &mut BitReader<'_>) -> Result<Self, DeflateError> {
		let (last, start) = read_block_start(reader)?;
		let (kind, symbols) = match start {
			BlockStart::Stored(len) => {
				let data = reader.read_bytes(len)?;
				let mut symbols: Vec<Symbol> = data.iter().copied().map(Symbol::Literal).collect();
				symbols.push(Symbol::End);
				(BlockKind::Stored, symbols)
			},
			BlockStart::Fixed => {
				let symbols = read_symbols(
					reader,
					CanonicalHuffmanTree::fixed_ll(),
					CanonicalHuffmanTree::fixed_d(),
				)?;
				(BlockKind::Fixed, symbols)
			},
			BlockStart::Dynamic(tables) => {
				let (ll, d) = tables.trees()?;
				let symbols = read_symbols(reader, &ll, &d)?;
				(BlockKind::Dynamic(tables), symbols)
			},
		};

		Ok(Self { kind, last, symbols, bits: 0 })
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Block Start.
///
/// Everything in a block ahead of its data: the stored length, or the
/// tables for the symbols to follow.
pub(crate) enum BlockStart {
	/// # Stored (Length).
	Stored(usize),

	/// # Fixed Trees.
	Fixed,

	/// # Dynamic Trees.
	Dynamic(DynamicTables),
}

/// # Read Block Start.
///
/// Read the final flag, the block type, and whatever header that type
/// carries. For stored blocks the reader is left on the first data byte.
///
/// ## Errors
///
/// Returns `Incomplete` if the data runs out, or `CorruptStream` for a bad
/// header.
pub(crate) fn read_block_start(reader: &mut BitReader<'_>)
-> Result<(bool, BlockStart), DeflateError> {
	let last = reader.read_bit()? == 1;
	let start = match reader.read_bits(2)? {
		0 => {
			let &[a, b, c, d] = reader.read_bytes(4)? else {
				return Err(DeflateError::CorruptStream);
			};
			let len = u16::from_le_bytes([a, b]);
			if u16::from_le_bytes([c, d]) != ! len {
				return Err(DeflateError::CorruptStream);
			}
			BlockStart::Stored(usize::from(len))
		},
		1 => BlockStart::Fixed,
		2 => BlockStart::Dynamic(DynamicTables::read(reader)?),
		_ => return Err(DeflateError::CorruptStream),
	};
	Ok((last, start))
}

/// # Read Symbols.
///
/// Decode symbols through the end-of-block marker.
fn read_symbols(
	reader: &mut BitReader<'_>,
	ll: &CanonicalHuffmanTree,
	d: &CanonicalHuffmanTree,
) -> Result<Vec<Symbol>, DeflateError> {
	let mut out = Vec::new();
	loop {
		let symbol = read_symbol(reader, ll, d)?;
		out.push(symbol);
		if matches!(symbol, Symbol::End) { return Ok(out); }
	}
}

/// # Read Symbol.
///
/// Decode a single literal, match, or end-of-block marker. If the data runs
/// out partway, the reader may have moved; start over from a copy.
///
/// ## Errors
///
/// Returns `Incomplete` if the data runs out, or `CorruptStream` for an
/// invalid code.
pub(crate) fn read_symbol(
	reader: &mut BitReader<'_>,
	ll: &CanonicalHuffmanTree,
	d: &CanonicalHuffmanTree,
) -> Result<Symbol, DeflateError> {
	let symbol = ll.decode(reader)?;
	if let Ok(b) = u8::try_from(symbol) { return Ok(Symbol::Literal(b)); }
	if symbol == END_SYMBOL { return Ok(Symbol::End); }

	let (base, bits) = length_base(symbol)?;
	let length = base + reader.read_bits(bits)? as u16;

	let (base, bits) = distance_base(d.decode(reader)?)?;
	let distance = base + reader.read_bits(bits)? as u16;

	Ok(Symbol::Match { length, distance })
}



#[cfg(test)]
mod test {
	use super::*;
	use proptest::prelude::*;

	/// # Encode to Bytes.
	fn encode(block: &DeflateBlock) -> Vec<u8> {
		let mut out = BitWriter::new();
		let bits = block.encode(&mut out).unwrap();
		assert_eq!(bits, out.bit_len());
		assert_eq!(bits, block.bit_size(0).unwrap());
		out.into_parts().0
	}

	/// # Decode a Whole Block.
	fn decode(data: &[u8]) -> DeflateBlock {
		match DeflateBlock::decode(data, 0) {
			Ok(Decoded::Block(b)) => b,
			other => panic!("Decode failed: {other:?}"),
		}
	}

	#[test]
	fn t_fixed_known() {
		// A lone "a", as produced by zlib.
		let block = DeflateBlock::fixed(vec![Symbol::Literal(b'a')], true);
		assert_eq!(encode(&block), [0x4B, 0x04, 0x00]);

		let block2 = decode(&[0x4B, 0x04, 0x00]);
		assert_eq!(block2.kind(), &BlockKind::Fixed);
		assert!(block2.is_last());
		assert_eq!(block2.symbols(), block.symbols());
		assert_eq!(block2.bits(), 18);
	}

	#[test]
	fn t_stored() {
		let block = DeflateBlock::stored(b"hello", false).unwrap();
		let enc = encode(&block);
		assert_eq!(enc, [0x00, 0x05, 0x00, 0xFA, 0xFF, b'h', b'e', b'l', b'l', b'o']);

		// LEN and NLEN.
		let len = u16::from_le_bytes([enc[1], enc[2]]);
		let nlen = u16::from_le_bytes([enc[3], enc[4]]);
		assert_eq!(usize::from(len), 5);
		assert_eq!(nlen, ! len);

		let block2 = decode(&enc);
		assert_eq!(block2.symbols(), block.symbols());
		assert!(! block2.is_last());
		assert_eq!(block2.bits(), 80);

		// Padding depends on where we start.
		assert_eq!(block.bit_size(0).unwrap(), 80);
		assert_eq!(block.bit_size(3).unwrap(), 3 + 2 + 72);
		assert_eq!(block.bit_size(6).unwrap(), 3 + 7 + 72);

		// Too big!
		assert_eq!(
			DeflateBlock::stored(&[0; MAX_STORED + 1], true),
			Err(DeflateError::Unstorable),
		);
		assert!(DeflateBlock::stored(&[0; MAX_STORED], true).is_ok());

		// No matches allowed.
		let bad = DeflateBlock::new(
			BlockKind::Stored,
			vec![Symbol::Match { length: 3, distance: 1 }],
			true,
		);
		assert_eq!(bad.encode(&mut BitWriter::new()), Err(DeflateError::Unstorable));
	}

	#[test]
	fn t_stored_nlen() {
		let mut enc = encode(&DeflateBlock::stored(b"hello", true).unwrap());
		enc[3] ^= 1;
		assert_eq!(DeflateBlock::decode(&enc, 0), Err(DeflateError::CorruptStream));
	}

	#[test]
	fn t_reserved() {
		// Final + type 3.
		assert_eq!(DeflateBlock::decode(&[0b111], 0), Err(DeflateError::CorruptStream));
	}

	#[test]
	fn t_incomplete() {
		let symbols = b"abracadabra abracadabra".iter()
			.copied()
			.map(Symbol::Literal)
			.chain([Symbol::Match { length: 10, distance: 12 }])
			.collect::<Vec<_>>();

		let tables = DynamicTables::for_symbols(&symbols).unwrap();
		for block in [
			DeflateBlock::stored(b"abracadabra", true).unwrap(),
			DeflateBlock::fixed(symbols.clone(), true),
			DeflateBlock::dynamic(tables, symbols.clone(), true),
		] {
			let enc = encode(&block);
			for i in 0..enc.len() {
				assert_eq!(
					DeflateBlock::decode(&enc[..i], 0),
					Ok(Decoded::Incomplete),
					"{:?} cut at {i}.", block.kind(),
				);
			}
			assert_eq!(decode(&enc).symbols(), block.symbols());
		}
	}

	#[test]
	fn t_offset() {
		// Blocks can start anywhere.
		let a = DeflateBlock::fixed(vec![Symbol::Literal(1), Symbol::Literal(200)], false);
		let b = DeflateBlock::stored(b"xyz", false).unwrap();
		let c = DeflateBlock::fixed(vec![Symbol::Match { length: 258, distance: 32_768 }], true);

		let mut out = BitWriter::new();
		let a_bits = a.encode(&mut out).unwrap();
		let b_bits = b.encode(&mut out).unwrap();
		c.encode(&mut out).unwrap();
		let (enc, _) = out.into_parts();

		let a2 = decode(&enc);
		assert_eq!(a2.bits(), a_bits);
		let Ok(Decoded::Block(b2)) = DeflateBlock::decode(&enc, a_bits) else { panic!("Bad b."); };
		assert_eq!(b2.bits(), b_bits);
		assert_eq!(b2.symbols(), b.symbols());
		let Ok(Decoded::Block(c2)) = DeflateBlock::decode(&enc, a_bits + b_bits) else { panic!("Bad c."); };
		assert_eq!(c2.symbols(), c.symbols());
		assert!(c2.is_last());
	}

	#[test]
	fn t_rle() {
		/// # Shorthand.
		const fn t(symbol: u8, extra: u8) -> RleToken { RleToken { symbol, extra } }

		// Repeat only kicks in after a literal.
		assert_eq!(
			rle_lengths(&[8, 8, 8, 8, 8, 8, 8, 8]),
			[t(8, 0), t(16, 3), t(8, 0)],
		);
		assert_eq!(rle_lengths(&[5, 5, 5]), [t(5, 0), t(5, 0), t(5, 0)]);

		// Zeroes.
		assert_eq!(rle_lengths(&[0, 0]), [t(0, 0), t(0, 0)]);
		assert_eq!(rle_lengths(&[0; 3]), [t(17, 0)]);
		assert_eq!(rle_lengths(&[0; 10]), [t(17, 7)]);
		assert_eq!(rle_lengths(&[0; 11]), [t(18, 0)]);
		assert_eq!(rle_lengths(&[0; 138]), [t(18, 127)]);
		assert_eq!(rle_lengths(&[0; 140]), [t(18, 127), t(0, 0), t(0, 0)]);
		assert_eq!(rle_lengths(&[0; 150]), [t(18, 127), t(18, 1)]);

		// Mixed.
		assert_eq!(
			rle_lengths(&[3, 3, 3, 3, 0, 0, 0, 0, 4]),
			[t(3, 0), t(16, 0), t(17, 1), t(4, 0)],
		);
	}

	#[test]
	fn t_dynamic_header() {
		let symbols: Vec<Symbol> = b"the quick brown fox jumps over the lazy dog"
			.iter()
			.copied()
			.map(Symbol::Literal)
			.chain([Symbol::Match { length: 4, distance: 31 }])
			.collect();

		let tables = DynamicTables::for_symbols(&symbols).unwrap();
		assert_eq!(tables.hlit(), 259);
		assert_eq!(tables.hdist(), 10);
		assert!((4..=19).contains(&tables.hclen()));

		let block = DeflateBlock::dynamic(tables.clone(), symbols, true);
		let enc = encode(&block);
		let block2 = decode(&enc);
		assert_eq!(block2, DeflateBlock { bits: block2.bits(), ..block.clone() });
		let BlockKind::Dynamic(tables2) = block2.kind() else { panic!("Not dynamic!"); };
		assert_eq!(tables2, &tables);

		// The header estimate should match reality.
		let mut out = BitWriter::new();
		tables.write(&mut out).unwrap();
		assert_eq!(out.bit_len(), tables.header_bits());
	}

	#[test]
	fn t_dynamic_bad() {
		// Over-subscribed.
		assert_eq!(
			DynamicTables::new(&[1; 257], &[1]).unwrap_err(),
			DeflateError::CorruptStream,
		);

		// Symbol 286.
		let mut ll = [0; 287];
		ll[0] = 1;
		ll[286] = 1;
		assert_eq!(DynamicTables::new(&ll, &[1]).unwrap_err(), DeflateError::UnknownSymbol);

		// Missing codes.
		let mut ll = [0; 257];
		ll[b'a' as usize] = 1;
		ll[256] = 1;
		let tables = DynamicTables::new(&ll, &[1, 1]).unwrap();
		let block = DeflateBlock::dynamic(tables, vec![Symbol::Literal(b'b')], true);
		assert_eq!(block.encode(&mut BitWriter::new()), Err(DeflateError::UnknownSymbol));
	}

	/// # Random Symbol.
	fn symbol() -> impl Strategy<Value = Symbol> {
		prop_oneof![
			3 => any::<u8>().prop_map(Symbol::Literal),
			1 => (3_u16..=258, 1_u16..=32_768)
				.prop_map(|(length, distance)| Symbol::Match { length, distance }),
		]
	}

	proptest! {
		#[test]
		fn t_round_trip_fixed(symbols in prop::collection::vec(symbol(), 0..300), last in any::<bool>()) {
			let block = DeflateBlock::fixed(symbols, last);
			let block2 = decode(&encode(&block));
			prop_assert_eq!(block2.symbols(), block.symbols());
			prop_assert_eq!(block2.is_last(), last);
		}

		#[test]
		fn t_round_trip_dynamic(symbols in prop::collection::vec(symbol(), 0..300), last in any::<bool>()) {
			let tables = DynamicTables::for_symbols(&symbols).unwrap();
			let block = DeflateBlock::dynamic(tables, symbols, last);
			let block2 = decode(&encode(&block));
			prop_assert_eq!(block2.kind(), block.kind());
			prop_assert_eq!(block2.symbols(), block.symbols());
		}

		#[test]
		fn t_round_trip_stored(data in prop::collection::vec(any::<u8>(), 0..2000), offset in 0_u8..8) {
			let block = DeflateBlock::stored(&data, true).unwrap();
			let mut out = BitWriter::resume(vec![0], offset);
			let start = out.bit_len();
			let bits = block.encode(&mut out).unwrap();
			let (enc, _) = out.into_parts();
			let Ok(Decoded::Block(block2)) = DeflateBlock::decode(&enc, start) else {
				panic!("Decode failed.");
			};
			prop_assert_eq!(block2.bits(), bits);
			prop_assert_eq!(block2.symbols(), block.symbols());
		}
	}
}
