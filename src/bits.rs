/*!
# Flapflate: Bits.

DEFLATE packs everything least-significant-bit first, with the lone
exception of Huffman codes, which go in most-significant-bit first. This
module holds the tiny conversion helpers for that, as well as the stateful
bit writer and reader the rest of the crate builds on.
*/

use crate::DeflateError;



/// # Integer to Bits.
///
/// Split the lowest `len` bits of `value` into a sequence, least significant
/// bit first. Bits beyond `len` are ignored.
///
/// ## Examples
///
/// ```
/// use flapflate::int_to_bits;
///
/// assert_eq!(int_to_bits(6, 4), [false, true, true, false]);
/// ```
pub fn int_to_bits(value: u32, len: u8) -> Vec<bool> {
	(0..u32::from(len.min(32))).map(|i| (value >> i) & 1 == 1).collect()
}

/// # Bits to Integer.
///
/// The inverse of [`int_to_bits`]: the first bit is the least significant.
/// Anything past the thirty-second bit is ignored.
///
/// ## Examples
///
/// ```
/// use flapflate::bits_to_int;
///
/// assert_eq!(bits_to_int(&[false, true, true, false]), 6);
/// ```
pub fn bits_to_int(bits: &[bool]) -> u32 {
	bits.iter()
		.take(32)
		.enumerate()
		.fold(0, |acc, (i, &b)| acc | (u32::from(b) << i))
}



#[derive(Debug, Clone, Default, Eq, PartialEq)]
/// # Bit Writer.
///
/// An LSB-first bit packer. Bits are ORed on top of the last output byte
/// until it fills up, at which point a fresh zero byte is appended.
///
/// A writer can be resumed on top of previously-written output whose last
/// byte was only partially used; see [`BitWriter::resume`].
pub struct BitWriter {
	/// # Output.
	out: Vec<u8>,

	/// # Bit Pointer.
	///
	/// The number of bits already used in the last byte, or zero if the
	/// next bit begins a new byte.
	bp: u8,
}

impl BitWriter {
	#[must_use]
	/// # New.
	pub const fn new() -> Self {
		Self { out: Vec::new(), bp: 0 }
	}

	#[must_use]
	/// # Resume.
	///
	/// Continue writing after `out`, the last byte of which has
	/// `bit_offset` bits already in use. (An offset of zero means `out` ends
	/// on a byte boundary.)
	pub fn resume(out: Vec<u8>, bit_offset: u8) -> Self {
		let bp = if out.is_empty() { 0 } else { bit_offset & 7 };
		Self { out, bp }
	}

	#[must_use]
	/// # Bit Offset.
	///
	/// The number of bits in use in the last byte, zero if aligned.
	pub const fn bit_offset(&self) -> u8 { self.bp }

	#[must_use]
	/// # Total Bits Written.
	pub const fn bit_len(&self) -> usize {
		if self.bp == 0 { self.out.len() * 8 }
		else { (self.out.len() - 1) * 8 + self.bp as usize }
	}

	#[must_use]
	/// # Written Bytes.
	pub fn as_bytes(&self) -> &[u8] { &self.out }

	#[must_use]
	/// # Into Parts.
	///
	/// Return the output along with the bit offset of its last byte.
	pub fn into_parts(self) -> (Vec<u8>, u8) { (self.out, self.bp) }
}

impl BitWriter {
	#[inline]
	/// # Add Bit.
	///
	/// Only the lowest bit of `bit` is used.
	pub fn add_bit(&mut self, bit: u8) {
		if self.bp == 0 { self.out.push(0); }
		if let Some(last) = self.out.last_mut() { *last |= (bit & 1) << self.bp; }
		self.bp = (self.bp + 1) & 7;
	}

	/// # Add Multiple Bits.
	///
	/// Write the lowest `length` bits of `value`, least significant first.
	pub fn add_bits(&mut self, value: u32, length: u8) {
		for i in 0..length.min(32) {
			self.add_bit(((value >> i) & 1) as u8);
		}
	}

	/// # Add Huffman Bits.
	///
	/// Same as `BitWriter::add_bits`, but the bits are written in reverse,
	/// most significant first.
	pub fn add_huffman_bits(&mut self, code: u32, length: u8) {
		for i in (0..length.min(32)).rev() {
			self.add_bit(((code >> i) & 1) as u8);
		}
	}

	/// # Add Block Header.
	///
	/// Write the final flag followed by the two-bit block type.
	pub fn add_header(&mut self, last_block: bool, kind: u8) {
		self.add_bit(u8::from(last_block));
		self.add_bit(kind & 1);
		self.add_bit((kind & 2) >> 1);
	}

	/// # Align.
	///
	/// Skip the rest of the current byte, if any. The skipped bits stay
	/// zero.
	pub fn align(&mut self) { self.bp = 0; }

	/// # Add Bytes.
	///
	/// Align, then copy `bytes` straight to the output.
	pub fn add_bytes(&mut self, bytes: &[u8]) {
		self.align();
		self.out.extend_from_slice(bytes);
	}
}



#[derive(Debug, Clone, Copy)]
/// # Bit Reader.
///
/// The reading counterpart to [`BitWriter`]. The cursor is an absolute bit
/// position within the borrowed slice. Reading past the end returns
/// [`DeflateError::Incomplete`] and leaves the cursor where it was, so a
/// caller can discard the reader and retry with a longer slice.
pub struct BitReader<'a> {
	/// # Data.
	data: &'a [u8],

	/// # Bit Position.
	pos: usize,
}

impl<'a> BitReader<'a> {
	#[must_use]
	/// # New.
	///
	/// Start reading `data` at bit position `pos`.
	pub const fn new(data: &'a [u8], pos: usize) -> Self { Self { data, pos } }

	#[must_use]
	/// # Bit Position.
	pub const fn position(&self) -> usize { self.pos }

	/// # Read Bit.
	///
	/// ## Errors
	///
	/// Returns `Incomplete` if there are no more bits.
	pub fn read_bit(&mut self) -> Result<u8, DeflateError> {
		let byte = self.data.get(self.pos >> 3).ok_or(DeflateError::Incomplete)?;
		let bit = (byte >> (self.pos & 7)) & 1;
		self.pos += 1;
		Ok(bit)
	}

	/// # Read Bits.
	///
	/// Read `length` bits (up to 32), least significant first.
	///
	/// ## Errors
	///
	/// Returns `Incomplete` if the data runs out first, in which case the
	/// position is left unchanged.
	pub fn read_bits(&mut self, length: u8) -> Result<u32, DeflateError> {
		let length = usize::from(length.min(32));
		if self.data.len() * 8 < self.pos + length {
			return Err(DeflateError::Incomplete);
		}

		let mut out = 0_u32;
		for i in 0..length {
			out |= u32::from(self.read_bit()?) << i;
		}
		Ok(out)
	}

	/// # Align.
	///
	/// Skip ahead to the next byte boundary.
	pub fn align(&mut self) { self.pos = (self.pos + 7) & ! 7; }

	/// # Read Bytes.
	///
	/// Align, then borrow the next `len` whole bytes.
	///
	/// ## Errors
	///
	/// Returns `Incomplete` if fewer than `len` bytes remain.
	pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DeflateError> {
		let start = (self.pos + 7) >> 3;
		let out = self.data.get(start..start + len).ok_or(DeflateError::Incomplete)?;
		self.pos = (start + len) * 8;
		Ok(out)
	}
}
