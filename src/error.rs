/*!
# Flapflate: Errors
*/

use std::{
	error::Error,
	fmt,
};



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Deflate Error.
///
/// Every fallible operation in the crate reports one of these. Only
/// `DeflateError::Incomplete` is recoverable: it means the input ran dry
/// before a field (or block) was finished, and the same call can be retried
/// once more bytes are available.
pub enum DeflateError {
	/// # Checksum Mismatch.
	ChecksumMismatch,

	/// # Session Closed.
	ClosedSession,

	/// # Corrupt Stream.
	CorruptStream,

	/// # Need More Input.
	Incomplete,

	/// # Invalid Compression Level.
	InvalidLevel,

	/// # Invalid Window Size.
	InvalidWindowSize,

	/// # Dictionary Not Supported.
	UnsupportedDictionary,

	/// # Unsupported Method.
	UnsupportedMethod,

	/// # Symbol Not In Tree.
	UnknownSymbol,

	/// # Stored Block Overflow.
	///
	/// Stored blocks can only hold up to `u16::MAX` literal bytes.
	Unstorable,
}

impl Error for DeflateError {}

impl fmt::Display for DeflateError {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl DeflateError {
	#[must_use]
	/// # As Str.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ChecksumMismatch => "The stream checksum does not match its data.",
			Self::ClosedSession => "The compression session has already been finished.",
			Self::CorruptStream => "The DEFLATE stream is corrupt.",
			Self::Incomplete => "More input is required.",
			Self::InvalidLevel => "The compression level must be between -1 and 9.",
			Self::InvalidWindowSize => "The window size must be between 8 and 15 bits.",
			Self::UnsupportedDictionary => "Preset dictionaries cannot be used with gzip.",
			Self::UnsupportedMethod => "Only the DEFLATE method (8) is supported.",
			Self::UnknownSymbol => "The symbol has no code in this tree.",
			Self::Unstorable => "Stored blocks are limited to 65535 literal bytes.",
		}
	}

	#[must_use]
	/// # Is Incomplete?
	///
	/// Returns `true` if the error only means "try again with more input".
	pub const fn is_incomplete(self) -> bool { matches!(self, Self::Incomplete) }
}
