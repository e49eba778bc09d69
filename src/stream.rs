/*!
# Flapflate: Stream Compressor.

A zlib-style compression session. Input is buffered until a master block
fills up (or a flush is requested), then handed off to a `BlockOptimizer`
along with the tail end of everything before it, so matches can reach back
across pass boundaries.
*/

use crate::{
	BitWriter,
	Container,
	container::Checksum,
	DeflateBlock,
	DeflateError,
	Squeeze,
	symbols::MAX_DISTANCE,
};
use dactyl::NiceU64;
use std::num::{
	NonZeroU32,
	NonZeroUsize,
};



/// # Default Master Block Size.
///
/// Input is buffered until it exceeds this many bytes.
pub const MASTER_BLOCK_SIZE: usize = 20_000_000;

/// # History Size.
///
/// The most bytes of prior input kept around for back-references.
pub const HISTORY_SIZE: usize = MAX_DISTANCE as usize;

/// # Pending Tail Size.
///
/// The last bytes of each pass are held back so the next pass can finish
/// the partial byte.
const TAIL_SIZE: usize = 32;

/// # Default Master Block Size (Non-Zero).
const NZ_MASTER_BLOCK_SIZE: NonZeroUsize = match NonZeroUsize::new(MASTER_BLOCK_SIZE) {
	Some(n) => n,
	None => panic!("Master block size must be non-zero."),
};



/// # Block Optimizer.
///
/// The thing that actually turns bytes into DEFLATE blocks. The session
/// takes care of buffering, history, flushing, and framing; the optimizer
/// only has to encode `data[history..]`.
pub trait BlockOptimizer {
	/// # Optimize.
	///
	/// Encode the new bytes of the request as one or more blocks, appending
	/// them to the request's tail, and return the lot along with the bit
	/// offset of the final byte.
	///
	/// ## Errors
	///
	/// Implementations should return an error rather than produce a bad
	/// stream.
	fn optimize(&mut self, req: OptimizeRequest<'_>) -> Result<Optimized, DeflateError>;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Optimization Request.
pub struct OptimizeRequest<'a> {
	/// # History and New Data.
	pub data: &'a [u8],

	/// # History Length.
	///
	/// The first `history` bytes of `data` were already compressed. They may
	/// be referenced, but must not be encoded again.
	pub history: usize,

	/// # Previous Output Tail.
	///
	/// The returned bytes must begin with these.
	pub tail: &'a [u8],

	/// # Bit Offset.
	///
	/// The number of bits used in the last byte of `tail`, `0` meaning it
	/// is full.
	pub bit_offset: u8,

	/// # Final?
	///
	/// If `true`, the last block written must have its final flag set.
	pub last: bool,

	/// # Effort.
	///
	/// Roughly, the number of improvement rounds to try.
	pub effort: NonZeroU32,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Optimization Result.
pub struct Optimized {
	/// # Bytes (Tail Included).
	pub bytes: Vec<u8>,

	/// # Bit Offset.
	///
	/// The number of bits used in the last byte, `0` meaning it is full.
	pub bit_offset: u8,
}



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Flush Mode.
pub enum FlushMode {
	/// # No Flush.
	///
	/// Only the container header (if not yet written) is returned.
	NoFlush,

	/// # Sync Flush.
	///
	/// Compress everything buffered, then byte-align the output with an
	/// empty stored block.
	SyncFlush,

	/// # Full Flush.
	///
	/// Same as `SyncFlush`, but the history is discarded too, so output
	/// that follows can be decoded on its own.
	FullFlush,

	/// # Finish.
	///
	/// Compress everything buffered, close out the stream, and append the
	/// container trailer. The session cannot be used afterwards.
	Finish,
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Compression Options.
///
/// Settings for a `StreamCompressor`, in builder form. Nothing is validated
/// until the compressor is created.
///
/// ## Examples
///
/// ```
/// use flapflate::{CompressOptions, StreamCompressor};
///
/// let opts = CompressOptions::default()
///     .with_level(9)
///     .with_window_bits(-15);
/// assert!(StreamCompressor::new(opts).is_ok());
///
/// // Gzip can't do dictionaries.
/// let opts = CompressOptions::default()
///     .with_window_bits(31)
///     .with_dictionary(b"hello");
/// assert!(StreamCompressor::new(opts).is_err());
/// ```
pub struct CompressOptions {
	/// # Level (`-1..=9`).
	level: i32,

	/// # Method.
	method: i32,

	/// # Window Bits.
	window_bits: i32,

	/// # Iteration Override.
	iterations: Option<NonZeroU32>,

	/// # Preset Dictionary.
	dictionary: Option<Vec<u8>>,

	/// # Master Block Size.
	master_block_size: NonZeroUsize,
}

impl Default for CompressOptions {
	fn default() -> Self {
		Self {
			level: -1,
			method: 8,
			window_bits: 15,
			iterations: None,
			dictionary: None,
			master_block_size: NZ_MASTER_BLOCK_SIZE,
		}
	}
}

impl CompressOptions {
	#[must_use]
	/// # With Level.
	///
	/// Set the compression level, `-1..=9`. Higher levels run more
	/// optimization rounds.
	pub const fn with_level(mut self, level: i32) -> Self {
		self.level = level;
		self
	}

	#[must_use]
	/// # With Method.
	///
	/// Only `8` (DEFLATE) is supported.
	pub const fn with_method(mut self, method: i32) -> Self {
		self.method = method;
		self
	}

	#[must_use]
	/// # With Window Bits.
	///
	/// Choose the container: `8..=15` for zlib, `-8..=-15` for raw DEFLATE,
	/// or `24..=31` for gzip.
	pub const fn with_window_bits(mut self, bits: i32) -> Self {
		self.window_bits = bits;
		self
	}

	#[must_use]
	/// # With Iterations.
	///
	/// Set the optimizer effort directly, ignoring the level.
	pub const fn with_iterations(mut self, iterations: NonZeroU32) -> Self {
		self.iterations = Some(iterations);
		self
	}

	#[must_use]
	/// # With Dictionary.
	///
	/// Prime the history with a preset dictionary. The decoder will need the
	/// same one.
	pub fn with_dictionary(mut self, dictionary: &[u8]) -> Self {
		self.dictionary = Some(dictionary.to_vec());
		self
	}

	#[must_use]
	/// # With Master Block Size.
	///
	/// Set how many bytes may be buffered before a pass is forced.
	pub const fn with_master_block_size(mut self, size: NonZeroUsize) -> Self {
		self.master_block_size = size;
		self
	}
}

impl CompressOptions {
	#[must_use]
	/// # Effort.
	///
	/// Return the optimizer effort for the options, if the level is valid
	/// or overridden.
	pub const fn effort(&self) -> Option<NonZeroU32> {
		if let Some(n) = self.iterations { return Some(n); }
		let n = match self.level {
			-1 | 5 => 15,
			0 | 1 => 1,
			2 => 3,
			3 => 5,
			4 => 10,
			6 => 20,
			7 => 30,
			8 => 50,
			9 => 100,
			_ => return None,
		};
		NonZeroU32::new(n)
	}
}



#[derive(Debug)]
/// # Stream Compressor.
///
/// A compression session. Feed it with `StreamCompressor::compress`, then
/// close it out with `StreamCompressor::flush` and `FlushMode::Finish`.
/// Everything returned along the way, concatenated, is the compressed
/// stream.
///
/// ## Examples
///
/// ```
/// use flapflate::{FlushMode, StreamCompressor};
///
/// let mut enc = StreamCompressor::new(Default::default()).unwrap();
/// let mut out = enc.compress(b"abcabcabcabcabcabcabc").unwrap();
/// out.extend(enc.flush(FlushMode::Finish).unwrap());
/// assert_eq!(&out[..2], &[0x78, 0x01]);
///
/// // All done.
/// assert!(enc.compress(b"more").is_err());
/// ```
pub struct StreamCompressor<O: BlockOptimizer = Squeeze> {
	/// # Optimizer.
	optimizer: O,

	/// # Container.
	container: Container,

	/// # Effort.
	effort: NonZeroU32,

	/// # Master Block Size.
	master_block_size: NonZeroUsize,

	/// # Buffered Input.
	buf: Vec<u8>,

	/// # History.
	prehist: Vec<u8>,

	/// # Pending Output Tail.
	tail: Vec<u8>,

	/// # Tail Bit Offset.
	bit_offset: u8,

	/// # Running Checksum.
	checksum: Checksum,

	/// # Dictionary ID.
	dictionary: Option<u32>,

	/// # Header Written?
	header: bool,

	/// # Closed?
	closed: bool,
}

impl StreamCompressor<Squeeze> {
	/// # New.
	///
	/// Start a session using the default `Squeeze` optimizer.
	///
	/// ## Errors
	///
	/// See `StreamCompressor::with_optimizer`.
	pub fn new(options: CompressOptions) -> Result<Self, DeflateError> {
		Self::with_optimizer(options, Squeeze)
	}
}

impl<O: BlockOptimizer> StreamCompressor<O> {
	/// # With Optimizer.
	///
	/// Start a session using a custom optimizer.
	///
	/// ## Errors
	///
	/// Returns `UnsupportedMethod` if the method is not DEFLATE,
	/// `InvalidWindowSize` for bad window bits, `InvalidLevel` for a level
	/// outside `-1..=9` (unless iterations were set explicitly), or
	/// `UnsupportedDictionary` for a gzip session with a dictionary.
	pub fn with_optimizer(options: CompressOptions, optimizer: O)
	-> Result<Self, DeflateError> {
		if options.method != 8 { return Err(DeflateError::UnsupportedMethod); }
		let container = Container::from_window_bits(options.window_bits)?;
		let effort = options.effort().ok_or(DeflateError::InvalidLevel)?;

		let mut prehist = Vec::new();
		let mut dictionary = None;
		if let Some(dict) = options.dictionary.as_deref() {
			if matches!(container, Container::Gzip) {
				return Err(DeflateError::UnsupportedDictionary);
			}
			prehist.extend_from_slice(&dict[dict.len().saturating_sub(HISTORY_SIZE)..]);
			if matches!(container, Container::Zlib) {
				dictionary = Some(crate::container::adler32(dict));
			}
		}

		Ok(Self {
			optimizer,
			container,
			effort,
			master_block_size: options.master_block_size,
			buf: Vec::new(),
			prehist,
			tail: Vec::new(),
			bit_offset: 0,
			checksum: Checksum::new(container),
			dictionary,
			header: false,
			closed: false,
		})
	}

	#[must_use]
	/// # Container.
	pub const fn container(&self) -> Container { self.container }

	#[must_use]
	/// # Effort.
	pub const fn effort(&self) -> NonZeroU32 { self.effort }

	#[must_use]
	/// # Is Closed?
	pub const fn is_closed(&self) -> bool { self.closed }
}

impl<O: BlockOptimizer> StreamCompressor<O> {
	/// # Compress.
	///
	/// Add `data` to the stream. Nothing is returned until the buffer
	/// exceeds the master block size, at which point everything buffered is
	/// compressed and whatever output is settled gets returned.
	///
	/// ## Errors
	///
	/// Returns `ClosedSession` if the session was finished, or any error from
	/// the optimizer. In the latter case `data` is still accepted; it stays
	/// buffered for the next pass.
	pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>, DeflateError> {
		if self.closed { return Err(DeflateError::ClosedSession); }

		self.checksum.update(data);
		self.buf.extend_from_slice(data);

		let mut out = Vec::new();
		if self.master_block_size.get() < self.buf.len() {
			let header = self.header;
			self.write_header(&mut out);
			if let Err(e) = self.pass(false, &mut out) {
				self.header = header;
				return Err(e);
			}
		}

		Ok(out)
	}

	/// # Flush.
	///
	/// See `FlushMode` for the details.
	///
	/// ## Errors
	///
	/// Returns `ClosedSession` if the session was finished, or any error from
	/// the optimizer. An optimizer error leaves the session as it was, buffer
	/// and all, so the flush can be tried again. (This holds for
	/// `FlushMode::Finish` too; the session only closes once it succeeds.)
	pub fn flush(&mut self, mode: FlushMode) -> Result<Vec<u8>, DeflateError> {
		if self.closed { return Err(DeflateError::ClosedSession); }

		let header = self.header;
		let mut out = Vec::new();
		self.write_header(&mut out);
		if let Err(e) = self.flush_mode(mode, &mut out) {
			self.header = header;
			return Err(e);
		}

		log::debug!(
			"Flushed ({mode:?}): {} bytes out.",
			NiceU64::from(out.len() as u64),
		);
		Ok(out)
	}

	/// # Flush (Mode).
	///
	/// The mode-specific part of `StreamCompressor::flush`.
	fn flush_mode(&mut self, mode: FlushMode, out: &mut Vec<u8>) -> Result<(), DeflateError> {
		match mode {
			FlushMode::NoFlush => {},
			FlushMode::SyncFlush | FlushMode::FullFlush => {
				self.pass(false, out)?;

				// Byte-align with an empty stored block.
				let mut writer = BitWriter::resume(std::mem::take(&mut self.tail), self.bit_offset);
				DeflateBlock::stored(&[], false)?.encode(&mut writer)?;
				out.extend_from_slice(writer.as_bytes());
				self.bit_offset = 0;

				if matches!(mode, FlushMode::FullFlush) { self.prehist.clear(); }
			},
			FlushMode::Finish => {
				self.pass(true, out)?;
				self.closed = true;
				out.extend_from_slice(&self.tail);
				self.tail.clear();
				self.bit_offset = 0;
				out.extend(self.checksum.trailer());
			},
		}

		Ok(())
	}

	/// # Write Header.
	///
	/// Add the container header to `out` unless it has been written already.
	fn write_header(&mut self, out: &mut Vec<u8>) {
		if ! self.header {
			self.header = true;
			out.extend(self.container.header(self.dictionary));
		}
	}

	/// # Compression Pass.
	///
	/// Send the buffer through the optimizer, keep the new history and
	/// pending tail, and move everything else to `out`.
	///
	/// If the optimizer fails, the history and buffer are put back the way
	/// they were.
	fn pass(&mut self, last: bool, out: &mut Vec<u8>) -> Result<(), DeflateError> {
		let history = self.prehist.len();
		let new = self.buf.len();
		let mut data = std::mem::take(&mut self.prehist);
		data.append(&mut self.buf);

		let res = match self.optimizer.optimize(OptimizeRequest {
			data: &data,
			history,
			tail: &self.tail,
			bit_offset: self.bit_offset,
			last,
			effort: self.effort,
		}) {
			Ok(res) => res,
			Err(e) => {
				self.buf = data.split_off(history);
				self.prehist = data;
				return Err(e);
			},
		};

		// Hang onto the end of the data.
		data.drain(..data.len().saturating_sub(HISTORY_SIZE));
		self.prehist = data;

		// Hang onto the end of the output too.
		let Optimized { mut bytes, bit_offset } = res;
		let split = bytes.len().saturating_sub(TAIL_SIZE);
		self.tail = bytes.split_off(split);
		self.bit_offset = bit_offset;
		out.append(&mut bytes);

		log::debug!(
			"Compressed {} bytes ({} history); {} settled.",
			NiceU64::from(new as u64),
			NiceU64::from(history as u64),
			NiceU64::from(out.len() as u64),
		);

		Ok(())
	}
}



/// # Compress (Zlib).
///
/// Compress `data` into a complete zlib stream in one go.
///
/// ## Errors
///
/// Returns `InvalidLevel` if the level is outside `-1..=9`.
///
/// ## Examples
///
/// ```
/// let out = flapflate::compress_zlib(b"Hello World", 6).unwrap();
/// assert_eq!(flapflate::decompress_zlib(&out).unwrap(), b"Hello World");
/// ```
pub fn compress_zlib(data: &[u8], level: i32) -> Result<Vec<u8>, DeflateError> {
	compress_oneshot(data, CompressOptions::default().with_level(level))
}

/// # Compress (Gzip).
///
/// Compress `data` into a complete gzip member in one go.
///
/// ## Errors
///
/// Returns `InvalidLevel` if the level is outside `-1..=9`.
pub fn compress_gzip(data: &[u8], level: i32) -> Result<Vec<u8>, DeflateError> {
	compress_oneshot(data, CompressOptions::default().with_level(level).with_window_bits(31))
}

/// # Compress (Raw).
///
/// Compress `data` into a bare DEFLATE stream in one go.
///
/// ## Errors
///
/// Returns `InvalidLevel` if the level is outside `-1..=9`.
pub fn compress_raw(data: &[u8], level: i32) -> Result<Vec<u8>, DeflateError> {
	compress_oneshot(data, CompressOptions::default().with_level(level).with_window_bits(-15))
}

/// # Compress (One Shot).
fn compress_oneshot(data: &[u8], options: CompressOptions) -> Result<Vec<u8>, DeflateError> {
	let mut enc = StreamCompressor::new(options)?;
	let mut out = enc.compress(data)?;
	out.extend(enc.flush(FlushMode::Finish)?);
	Ok(out)
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		decompress_raw,
		decompress_zlib,
	};

	#[derive(Debug, Default)]
	/// # Recording Optimizer.
	///
	/// Stores everything as stored blocks and remembers what it was asked.
	struct Recorder {
		calls: Vec<(usize, usize, bool)>,
	}

	impl BlockOptimizer for Recorder {
		fn optimize(&mut self, req: OptimizeRequest<'_>) -> Result<Optimized, DeflateError> {
			self.calls.push((req.data.len(), req.history, req.last));
			let mut out = BitWriter::resume(req.tail.to_vec(), req.bit_offset);
			DeflateBlock::stored(&req.data[req.history..], req.last)?.encode(&mut out)?;
			let (bytes, bit_offset) = out.into_parts();
			Ok(Optimized { bytes, bit_offset })
		}
	}

	#[derive(Debug)]
	/// # Unreliable Optimizer.
	///
	/// Fails the first `failures` calls, then behaves like `Recorder`.
	struct Unreliable {
		failures: usize,
		inner: Recorder,
	}

	impl Unreliable {
		fn new(failures: usize) -> Self {
			Self { failures, inner: Recorder::default() }
		}
	}

	impl BlockOptimizer for Unreliable {
		fn optimize(&mut self, req: OptimizeRequest<'_>) -> Result<Optimized, DeflateError> {
			if self.failures == 0 { self.inner.optimize(req) }
			else {
				self.failures -= 1;
				Err(DeflateError::UnknownSymbol)
			}
		}
	}

	#[test]
	fn t_effort() {
		for (level, effort) in [
			(-1, 15), (0, 1), (1, 1), (2, 3), (3, 5), (4, 10),
			(5, 15), (6, 20), (7, 30), (8, 50), (9, 100),
		] {
			let opts = CompressOptions::default().with_level(level);
			assert_eq!(opts.effort().map(NonZeroU32::get), Some(effort));
		}

		let opts = CompressOptions::default().with_level(10);
		assert_eq!(opts.effort(), None);
		assert_eq!(StreamCompressor::new(opts.clone()).err(), Some(DeflateError::InvalidLevel));

		// An override fixes it.
		let opts = opts.with_iterations(NonZeroU32::new(7).unwrap());
		let enc = StreamCompressor::new(opts).unwrap();
		assert_eq!(enc.effort().get(), 7);
	}

	#[test]
	fn t_validation() {
		let opts = CompressOptions::default().with_method(9).with_window_bits(99).with_level(99);
		assert_eq!(StreamCompressor::new(opts.clone()).err(), Some(DeflateError::UnsupportedMethod));

		let opts = opts.with_method(8);
		assert_eq!(StreamCompressor::new(opts.clone()).err(), Some(DeflateError::InvalidWindowSize));

		let opts = opts.with_window_bits(12);
		assert_eq!(StreamCompressor::new(opts.clone()).err(), Some(DeflateError::InvalidLevel));

		let opts = opts.with_level(3).with_window_bits(25).with_dictionary(b"dict");
		assert_eq!(StreamCompressor::new(opts).err(), Some(DeflateError::UnsupportedDictionary));
	}

	#[test]
	fn t_noflush() {
		let mut enc = StreamCompressor::new(CompressOptions::default()).unwrap();
		assert!(enc.compress(b"Hello").unwrap().is_empty());
		assert_eq!(enc.flush(FlushMode::NoFlush).unwrap(), [0x78, 0x01]);
		assert!(enc.flush(FlushMode::NoFlush).unwrap().is_empty());

		let mut enc = StreamCompressor::new(CompressOptions::default().with_window_bits(-9)).unwrap();
		assert!(enc.flush(FlushMode::NoFlush).unwrap().is_empty());
	}

	#[test]
	fn t_closed() {
		let mut enc = StreamCompressor::new(CompressOptions::default()).unwrap();
		assert!(! enc.is_closed());
		enc.flush(FlushMode::Finish).unwrap();
		assert!(enc.is_closed());
		assert_eq!(enc.compress(b"hi"), Err(DeflateError::ClosedSession));
		assert_eq!(enc.flush(FlushMode::NoFlush), Err(DeflateError::ClosedSession));
		assert_eq!(enc.flush(FlushMode::Finish), Err(DeflateError::ClosedSession));
	}

	#[test]
	fn t_empty() {
		// Header, empty fixed block, Adler-32 of nothing.
		let out = compress_zlib(&[], -1).unwrap();
		assert_eq!(out, [0x78, 0x01, 0x03, 0x00, 0, 0, 0, 1]);
		assert_eq!(decompress_zlib(&out).unwrap(), b"");
	}

	#[test]
	fn t_sync_flush() {
		let opts = CompressOptions::default().with_window_bits(-15);
		let mut enc = StreamCompressor::new(opts).unwrap();
		assert!(enc.compress(b"Hello Hello Hello").unwrap().is_empty());

		// Everything settles, ending with an empty stored block.
		let mut out = enc.flush(FlushMode::SyncFlush).unwrap();
		assert!(out.ends_with(&[0, 0, 0xff, 0xff]));
		assert_eq!(decompress_raw(&out), Err(DeflateError::Incomplete));

		out.extend(enc.compress(b" World").unwrap());
		out.extend(enc.flush(FlushMode::Finish).unwrap());
		assert_eq!(decompress_raw(&out).unwrap(), b"Hello Hello Hello World");
	}

	#[test]
	fn t_master_blocks() {
		let opts = CompressOptions::default()
			.with_window_bits(-15)
			.with_master_block_size(NonZeroUsize::new(100).unwrap());
		let mut enc = StreamCompressor::with_optimizer(opts, Recorder::default()).unwrap();

		let data: Vec<u8> = (0..=255).cycle().take(45_000).collect();
		let mut out = Vec::new();
		for chunk in data.chunks(150) { out.extend(enc.compress(chunk).unwrap()); }
		out.extend(enc.flush(FlushMode::Finish).unwrap());
		assert_eq!(decompress_raw(&out).unwrap(), data);

		// Every chunk crossed the threshold, plus one for the finish.
		let calls = &enc.optimizer.calls;
		assert_eq!(calls.len(), 301);
		assert_eq!(calls[0], (150, 0, false));
		assert_eq!(calls[1], (300, 150, false));

		// History tops out.
		assert!(calls.iter().all(|c| c.1 <= HISTORY_SIZE));
		assert_eq!(calls[300].1, HISTORY_SIZE);

		// The finish has nothing new.
		let last = calls.last().unwrap();
		assert_eq!(last.0, last.1);
		assert!(last.2);
	}

	#[test]
	fn t_optimizer_error_flush() {
		let mut enc = StreamCompressor::with_optimizer(
			CompressOptions::default(),
			Unreliable::new(1),
		).unwrap();

		assert!(enc.compress(b"hello world ").unwrap().is_empty());
		assert_eq!(enc.flush(FlushMode::SyncFlush), Err(DeflateError::UnknownSymbol));
		assert!(! enc.is_closed());

		// Nothing was lost, header included.
		let mut out = enc.flush(FlushMode::SyncFlush).unwrap();
		assert_eq!(&out[..2], &[0x78, 0x01]);
		out.extend(enc.compress(b"goodbye").unwrap());
		out.extend(enc.flush(FlushMode::Finish).unwrap());
		assert_eq!(decompress_zlib(&out).unwrap(), b"hello world goodbye");

		// The failed call never reached the recorder.
		assert_eq!(enc.optimizer.inner.calls, [(12, 0, false), (19, 12, true)]);
	}

	#[test]
	fn t_optimizer_error_finish() {
		let mut enc = StreamCompressor::with_optimizer(
			CompressOptions::default(),
			Unreliable::new(2),
		).unwrap();

		let mut out = enc.compress(b"one two three").unwrap();
		assert_eq!(enc.flush(FlushMode::Finish), Err(DeflateError::UnknownSymbol));
		assert!(! enc.is_closed());
		assert_eq!(enc.flush(FlushMode::Finish), Err(DeflateError::UnknownSymbol));
		assert!(! enc.is_closed());

		out.extend(enc.flush(FlushMode::Finish).unwrap());
		assert!(enc.is_closed());
		assert_eq!(decompress_zlib(&out).unwrap(), b"one two three");
	}

	#[test]
	fn t_optimizer_error_compress() {
		let opts = CompressOptions::default()
			.with_master_block_size(NonZeroUsize::new(4).unwrap());
		let mut enc = StreamCompressor::with_optimizer(opts, Unreliable::new(1)).unwrap();

		// The pass fails, but the data stays buffered.
		assert_eq!(enc.compress(b"abcdef"), Err(DeflateError::UnknownSymbol));
		let mut out = enc.compress(b"ghi").unwrap();
		assert_eq!(&out[..2], &[0x78, 0x01]);
		out.extend(enc.flush(FlushMode::Finish).unwrap());
		assert_eq!(decompress_zlib(&out).unwrap(), b"abcdefghi");
	}

	#[test]
	fn t_full_flush() {
		let opts = CompressOptions::default().with_window_bits(-15);
		let mut enc = StreamCompressor::with_optimizer(opts, Recorder::default()).unwrap();
		enc.compress(b"one").unwrap();
		enc.flush(FlushMode::SyncFlush).unwrap();
		enc.compress(b"two").unwrap();
		enc.flush(FlushMode::FullFlush).unwrap();
		enc.compress(b"three").unwrap();
		enc.flush(FlushMode::Finish).unwrap();

		assert_eq!(
			enc.optimizer.calls,
			[(3, 0, false), (6, 3, false), (5, 0, true)],
		);
	}

	#[test]
	fn t_dictionary() {
		let opts = CompressOptions::default().with_window_bits(-15).with_dictionary(b"abcdef");
		let mut enc = StreamCompressor::with_optimizer(opts, Recorder::default()).unwrap();
		enc.compress(b"xyz").unwrap();
		enc.flush(FlushMode::Finish).unwrap();
		assert_eq!(enc.optimizer.calls, [(9, 6, true)]);

		// Zlib gets an ID in the header.
		let opts = CompressOptions::default().with_dictionary(b"abcdef");
		let mut enc = StreamCompressor::new(opts).unwrap();
		let out = enc.flush(FlushMode::NoFlush).unwrap();
		assert_eq!(out.len(), 6);
		assert_eq!(out[..2], [0x78, 0x20]);
		assert_eq!(out[2..], crate::container::adler32(b"abcdef").to_be_bytes());
	}
}
