/*!
# Flapflate: Inflate.

A small streaming decoder. Blocks are decoded a symbol (or a stored run) at
a time, so input can arrive in pieces of any size without anything being
decoded twice.
*/

use crate::{
	BitReader,
	block::{
		BlockStart,
		read_block_start,
		read_symbol,
	},
	CanonicalHuffmanTree,
	container::{
		adler32,
		ZlibHeader,
	},
	DeflateError,
	HISTORY_SIZE,
	Symbol,
};



#[derive(Debug, Clone)]
/// # Block Body.
///
/// What is left of the block being decoded.
enum Body {
	/// # Stored Bytes Remaining.
	Stored(usize),

	/// # Fixed Codes.
	Fixed,

	/// # Dynamic Codes.
	Dynamic(Box<(CanonicalHuffmanTree, CanonicalHuffmanTree)>),
}



#[derive(Debug, Clone, Default)]
/// # Inflater.
///
/// Feed it DEFLATE bytes in whatever size pieces are convenient; each call
/// decodes as far as the data allows and holds onto any partial code.
///
/// ## Examples
///
/// ```
/// use flapflate::Inflater;
///
/// let raw = flapflate::compress_raw(b"Hello Hello Hello", 1).unwrap();
/// let mut inflater = Inflater::new();
/// for b in &raw { inflater.feed(std::slice::from_ref(b)).unwrap(); }
/// assert!(inflater.is_done());
/// assert_eq!(inflater.output(), b"Hello Hello Hello");
/// ```
pub struct Inflater {
	/// # Undecoded Input.
	pending: Vec<u8>,

	/// # Bit Position Within `pending`.
	bit: usize,

	/// # Dictionary and Output.
	window: Vec<u8>,

	/// # Dictionary Length.
	dictionary: usize,

	/// # Current Block.
	///
	/// `None` between blocks.
	body: Option<Body>,

	/// # Current Block Is Final?
	last: bool,

	/// # Done?
	done: bool,
}

impl Inflater {
	#[must_use]
	/// # New.
	pub fn new() -> Self { Self::default() }

	#[must_use]
	/// # With Dictionary.
	///
	/// Start with a preset dictionary. Only its last 32 KiB can be
	/// referenced.
	pub fn with_dictionary(dictionary: &[u8]) -> Self {
		let window = dictionary[dictionary.len().saturating_sub(HISTORY_SIZE)..].to_vec();
		Self {
			dictionary: window.len(),
			window,
			..Self::default()
		}
	}

	/// # Feed.
	///
	/// Add `data` to the input and decode as much of it as possible,
	/// returning the number of bytes produced. Once the final block has been
	/// decoded, anything else is set aside (see `Inflater::remainder`).
	///
	/// ## Errors
	///
	/// Returns `CorruptStream` if the stream is invalid. The inflater is no
	/// good after that.
	pub fn feed(&mut self, data: &[u8]) -> Result<usize, DeflateError> {
		self.pending.extend_from_slice(data);
		if self.done { return Ok(0); }

		let before = self.window.len();
		while ! self.done {
			match self.step() {
				Ok(()) => {},
				Err(DeflateError::Incomplete) => break,
				Err(e) => return Err(e),
			}
		}

		// Drop the bytes we're finished with.
		let used = self.bit / 8;
		if used != 0 {
			self.pending.drain(..used);
			self.bit -= used * 8;
		}

		Ok(self.window.len() - before)
	}

	/// # Step.
	///
	/// Read the next block header, or finish the current block. If the data
	/// runs out partway, everything up to the last whole symbol is kept and
	/// `Incomplete` is returned.
	fn step(&mut self) -> Result<(), DeflateError> {
		let Some(mut body) = self.body.take() else {
			let mut reader = BitReader::new(&self.pending, self.bit);
			let (last, start) = read_block_start(&mut reader)?;
			self.bit = reader.position();
			self.last = last;
			self.body = Some(match start {
				BlockStart::Stored(len) => Body::Stored(len),
				BlockStart::Fixed => Body::Fixed,
				BlockStart::Dynamic(tables) => Body::Dynamic(Box::new(tables.trees()?)),
			});
			return Ok(());
		};

		let res = match &mut body {
			Body::Stored(len) => self.read_stored(len),
			Body::Fixed => self.read_codes(
				CanonicalHuffmanTree::fixed_ll(),
				CanonicalHuffmanTree::fixed_d(),
			),
			Body::Dynamic(trees) => self.read_codes(&trees.0, &trees.1),
		};

		match res {
			Ok(()) => {
				self.done = self.last;
				Ok(())
			},
			Err(e) => {
				if e.is_incomplete() { self.body = Some(body); }
				Err(e)
			},
		}
	}

	/// # Read Stored Bytes.
	///
	/// Copy as much of the remaining `len` as is available.
	fn read_stored(&mut self, len: &mut usize) -> Result<(), DeflateError> {
		// Stored data is always byte-aligned.
		let chunk = self.pending.get(self.bit / 8..).unwrap_or_default();
		let take = chunk.len().min(*len);
		self.window.extend_from_slice(&chunk[..take]);
		self.bit += take * 8;
		*len -= take;

		if *len == 0 { Ok(()) }
		else { Err(DeflateError::Incomplete) }
	}

	/// # Read Codes.
	///
	/// Decode symbols through the end of the block, committing each one as
	/// it completes.
	fn read_codes(&mut self, ll: &CanonicalHuffmanTree, d: &CanonicalHuffmanTree)
	-> Result<(), DeflateError> {
		loop {
			let mut reader = BitReader::new(&self.pending, self.bit);
			let symbol = read_symbol(&mut reader, ll, d)?;
			let pos = reader.position();
			self.push(symbol)?;
			self.bit = pos;
			if matches!(symbol, Symbol::End) { return Ok(()); }
		}
	}

	/// # Push Symbol.
	fn push(&mut self, symbol: Symbol) -> Result<(), DeflateError> {
		match symbol {
			Symbol::Literal(b) => { self.window.push(b); },
			Symbol::Match { length, distance } => {
				let distance = usize::from(distance);
				if distance == 0 || self.window.len() < distance {
					return Err(DeflateError::CorruptStream);
				}

				// Byte-by-byte, since the source and destination can overlap.
				let start = self.window.len() - distance;
				self.window.reserve(usize::from(length));
				for i in start..start + usize::from(length) {
					self.window.push(self.window[i]);
				}
			},
			Symbol::End => {},
		}
		Ok(())
	}
}

impl Inflater {
	#[must_use]
	/// # Is Done?
	///
	/// Returns `true` once the final block has been decoded.
	pub const fn is_done(&self) -> bool { self.done }

	#[must_use]
	/// # Output.
	///
	/// Everything decoded so far.
	pub fn output(&self) -> &[u8] { &self.window[self.dictionary..] }

	#[must_use]
	/// # Into Output.
	pub fn into_output(mut self) -> Vec<u8> {
		self.window.drain(..self.dictionary);
		self.window
	}

	#[must_use]
	/// # Remainder.
	///
	/// Once done, the bytes following the stream (a container trailer, for
	/// example). Before then, nothing.
	pub fn remainder(&self) -> &[u8] {
		if self.done { self.pending.get(self.bit.div_ceil(8)..).unwrap_or_default() }
		else { &[] }
	}
}



/// # Decompress (Raw).
///
/// ## Errors
///
/// Returns `Incomplete` if the stream has no final block, or
/// `CorruptStream` if it is invalid.
///
/// ## Examples
///
/// ```
/// // A single empty fixed block.
/// assert_eq!(flapflate::decompress_raw(&[3, 0]).unwrap(), b"");
/// ```
pub fn decompress_raw(data: &[u8]) -> Result<Vec<u8>, DeflateError> {
	let mut inflater = Inflater::new();
	inflater.feed(data)?;
	if inflater.is_done() { Ok(inflater.into_output()) }
	else { Err(DeflateError::Incomplete) }
}

/// # Decompress (Zlib).
///
/// ## Errors
///
/// Returns `Incomplete` if the stream is truncated, `CorruptStream` if it
/// is invalid, `UnsupportedDictionary` if it needs a preset dictionary, or
/// `ChecksumMismatch` if the Adler-32 is wrong.
pub fn decompress_zlib(data: &[u8]) -> Result<Vec<u8>, DeflateError> {
	let header = ZlibHeader::parse(data)?;
	if header.dictionary.is_some() { return Err(DeflateError::UnsupportedDictionary); }
	finish_zlib(Inflater::new(), &data[header.len..])
}

/// # Decompress (Zlib) With Dictionary.
///
/// Same as `decompress_zlib`, but for streams compressed with a preset
/// dictionary.
///
/// ## Errors
///
/// Same as `decompress_zlib`, except a stream asking for a different
/// dictionary returns `ChecksumMismatch`.
pub fn decompress_zlib_with_dictionary(data: &[u8], dictionary: &[u8])
-> Result<Vec<u8>, DeflateError> {
	let header = ZlibHeader::parse(data)?;
	let inflater = match header.dictionary {
		Some(id) if id == adler32(dictionary) => Inflater::with_dictionary(dictionary),
		Some(_) => return Err(DeflateError::ChecksumMismatch),
		None => Inflater::new(),
	};
	finish_zlib(inflater, &data[header.len..])
}

/// # Inflate and Verify.
fn finish_zlib(mut inflater: Inflater, data: &[u8]) -> Result<Vec<u8>, DeflateError> {
	inflater.feed(data)?;
	if ! inflater.is_done() { return Err(DeflateError::Incomplete); }

	let &[a, b, c, d, ..] = inflater.remainder() else {
		return Err(DeflateError::Incomplete);
	};
	let out = inflater.into_output();
	if u32::from_be_bytes([a, b, c, d]) == adler32(&out) { Ok(out) }
	else { Err(DeflateError::ChecksumMismatch) }
}
