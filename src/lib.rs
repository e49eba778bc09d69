/*!
# Flapflate

Flapflate is a streaming zlib/DEFLATE compressor that trades speed for size,
squeezing each block zopfli-style until it can't get any smaller.

The pieces are exposed for anyone who wants to build (or pick apart)
DEFLATE streams by hand: bit-level writers and readers, canonical Huffman
trees, length-limited code lengths, and individual block encoding and
decoding. A small inflater rounds things out.

## Examples

```
use flapflate::{CompressOptions, FlushMode, StreamCompressor};

let mut enc = StreamCompressor::new(CompressOptions::default().with_level(9)).unwrap();
let mut out = enc.compress(b"Hello Hello Hello").unwrap();
out.extend(enc.flush(FlushMode::Finish).unwrap());

assert_eq!(flapflate::decompress_zlib(&out).unwrap(), b"Hello Hello Hello");
```
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

#[cfg(test)] use flate2 as _;

mod bits;
mod block;
mod container;
mod error;
mod huffman;
mod inflate;
mod kat;
mod squeeze;
mod stream;
mod symbols;

pub use bits::{
	BitReader,
	BitWriter,
	bits_to_int,
	int_to_bits,
};
pub use block::{
	BlockKind,
	Decoded,
	DeflateBlock,
	DynamicTables,
	MAX_STORED,
	Symbol,
};
pub use container::Container;
pub use error::DeflateError;
pub use huffman::{
	CanonicalHuffmanTree,
	Code,
	MAX_CODE_LENGTH,
	Prefix,
	Step,
};
pub use inflate::{
	decompress_raw,
	decompress_zlib,
	decompress_zlib_with_dictionary,
	Inflater,
};
pub use kat::length_limited_code_lengths;
pub use squeeze::Squeeze;
pub use stream::{
	BlockOptimizer,
	compress_gzip,
	compress_raw,
	compress_zlib,
	CompressOptions,
	FlushMode,
	HISTORY_SIZE,
	MASTER_BLOCK_SIZE,
	OptimizeRequest,
	Optimized,
	StreamCompressor,
};
pub use symbols::{
	MAX_DISTANCE,
	MAX_MATCH,
	MIN_MATCH,
};
