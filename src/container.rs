/*!
# Flapflate: Containers.

The framing around a raw DEFLATE stream: RFC 1950 (zlib), RFC 1952 (gzip),
or nothing at all.
*/

use crc32fast::Hasher as Crc32;
use crate::DeflateError;
use simd_adler32::Adler32;



/// # Gzip Header.
///
/// No name, no comment, no timestamp, maximum compression, Unix.
const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 8, 0, 0, 0, 0, 0, 2, 3];

/// # Zlib CMF.
///
/// DEFLATE with a 32 KiB window.
const ZLIB_CMF: u8 = 0x78;

/// # Zlib Preset Dictionary Flag.
const ZLIB_FDICT: u8 = 0b0010_0000;



#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
/// # Container.
pub enum Container {
	/// # Zlib (RFC 1950).
	Zlib,

	/// # Raw DEFLATE (RFC 1951).
	Raw,

	/// # Gzip (RFC 1952).
	Gzip,
}

impl Container {
	/// # From Window Bits.
	///
	/// Window bits follow the zlib convention: `8..=15` for zlib, the
	/// negatives for raw DEFLATE, and `24..=31` (sixteen plus the window) for
	/// gzip.
	///
	/// ## Errors
	///
	/// Anything else returns `InvalidWindowSize`.
	pub const fn from_window_bits(bits: i32) -> Result<Self, DeflateError> {
		match bits {
			8..=15 => Ok(Self::Zlib),
			-15..=-8 => Ok(Self::Raw),
			24..=31 => Ok(Self::Gzip),
			_ => Err(DeflateError::InvalidWindowSize),
		}
	}

	#[must_use]
	/// # Header.
	///
	/// Return the bytes that open the container. For zlib, `dictionary` is
	/// the Adler-32 of the preset dictionary, if any.
	pub fn header(self, dictionary: Option<u32>) -> Vec<u8> {
		match self {
			Self::Zlib => {
				let flg = if dictionary.is_some() { ZLIB_FDICT } else { 0 };
				let v = u16::from_be_bytes([ZLIB_CMF, flg]);
				let fcheck = (31 - v % 31) % 31;
				let mut out = (v + fcheck).to_be_bytes().to_vec();
				if let Some(id) = dictionary { out.extend_from_slice(&id.to_be_bytes()); }
				out
			},
			Self::Raw => Vec::new(),
			Self::Gzip => GZIP_HEADER.to_vec(),
		}
	}
}



#[must_use]
/// # Adler-32.
///
/// Return the Adler-32 of `data` in one go.
pub(crate) fn adler32(data: &[u8]) -> u32 { adler32_resume(1, data) }

#[must_use]
/// # Adler-32 (Continued).
///
/// Pick up a running Adler-32 where it left off.
fn adler32_resume(checksum: u32, data: &[u8]) -> u32 {
	let mut a = Adler32::from_checksum(checksum);
	a.write(data);
	a.finish()
}



#[derive(Debug, Clone)]
/// # Running Checksum.
pub(crate) enum Checksum {
	/// # Adler-32 (Zlib).
	Adler(u32),

	/// # CRC-32 and Size (Gzip).
	Crc(Crc32, u32),

	/// # Nothing (Raw).
	None,
}

impl Checksum {
	/// # New.
	pub(crate) fn new(container: Container) -> Self {
		match container {
			Container::Zlib => Self::Adler(1),
			Container::Raw => Self::None,
			Container::Gzip => Self::Crc(Crc32::new(), 0),
		}
	}

	#[allow(clippy::cast_possible_truncation, reason = "ISIZE is modular.")]
	/// # Update.
	pub(crate) fn update(&mut self, data: &[u8]) {
		match self {
			Self::Adler(a) => { *a = adler32_resume(*a, data); },
			Self::Crc(c, size) => {
				c.update(data);
				// ISIZE is the length modulo 2^32.
				*size = size.wrapping_add(data.len() as u32);
			},
			Self::None => {},
		}
	}

	#[must_use]
	/// # Trailer.
	///
	/// Return the bytes that close the container.
	pub(crate) fn trailer(&self) -> Vec<u8> {
		match self {
			Self::Adler(a) => a.to_be_bytes().to_vec(),
			Self::Crc(c, size) => {
				let mut out = c.clone().finalize().to_le_bytes().to_vec();
				out.extend_from_slice(&size.to_le_bytes());
				out
			},
			Self::None => Vec::new(),
		}
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Zlib Header.
///
/// A parsed RFC 1950 header.
pub(crate) struct ZlibHeader {
	/// # Header Length.
	pub(crate) len: usize,

	/// # Dictionary ID.
	pub(crate) dictionary: Option<u32>,
}

impl ZlibHeader {
	/// # Parse.
	///
	/// ## Errors
	///
	/// Returns `Incomplete` if `data` is too short, `CorruptStream` if the
	/// check bits are off, or `UnsupportedMethod` for anything but DEFLATE.
	pub(crate) fn parse(data: &[u8]) -> Result<Self, DeflateError> {
		let [cmf, flg, rest @ ..] = data else { return Err(DeflateError::Incomplete); };
		if u16::from_be_bytes([*cmf, *flg]) % 31 != 0 {
			return Err(DeflateError::CorruptStream);
		}
		if cmf & 0x0f != 8 { return Err(DeflateError::UnsupportedMethod); }
		if 7 < cmf >> 4 { return Err(DeflateError::InvalidWindowSize); }

		if flg & ZLIB_FDICT == 0 { Ok(Self { len: 2, dictionary: None }) }
		else {
			let [a, b, c, d, ..] = rest else { return Err(DeflateError::Incomplete); };
			Ok(Self {
				len: 6,
				dictionary: Some(u32::from_be_bytes([*a, *b, *c, *d])),
			})
		}
	}
}
