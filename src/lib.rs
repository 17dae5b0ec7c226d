//! # nitrolz Library
//!
//! Compress or expand the sibling LZ formats used by GBA/DS firmware and
//! content pipelines
//! * `lz10` is the classic `0x10` codec with two-byte back-references
//! * `lzx` covers the extended `0x11` (LZ11) and `0x40` (LZ40) codecs with
//!   three-way length classes
//!
//! The codecs are pure byte-buffer transforms; file handling belongs to the
//! caller (the `lz10` and `lzx` binaries are thin wrappers).  Decoding is
//! lenient and returns whatever could be reconstructed together with a list
//! of [`Warning`]s; encoding is strict and fails on oversized input.
//!
//! ## Example
//!
//! ```rs
//! use nitrolz::{lz10, Strategy};
//! let raw = "I am Sam. Sam I am. I do not like this Sam I am.".as_bytes();
//! let packed = lz10::encode(raw, Strategy::Lazy, false).expect("encoding failed");
//! let (expanded, warnings) = lz10::decode(&packed);
//! assert!(warnings.is_empty());
//! assert_eq!(expanded, raw);
//! ```

mod tools;
pub mod lz10;
pub mod lzx;

/// largest raw buffer expressible by the 24-bit length field
pub const RAW_MAXIM: usize = 0x00FF_FFFF;

/// Fatal encoder errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("input exceeds 16 MiB - 1")]
    InputTooLarge
}

/// Decoder diagnostics.  Decoding never fails outright; these accompany
/// the (possibly partial) output.
#[derive(thiserror::Error,Debug,Clone,Copy,PartialEq,Eq)]
pub enum Warning {
    #[error("not an LZ packed stream")]
    BadMagic,
    #[error("unexpected end of packed stream")]
    TruncatedInput,
    #[error("wrong decoded length")]
    LengthOverrun,
    #[error("decoded data ended early")]
    ShortOutput,
    #[error("back-reference reaches before start of data")]
    BadDistance
}

/// Magic byte in the low 8 bits of the header word
#[derive(num_derive::FromPrimitive,Clone,Copy,PartialEq,Eq,Debug)]
pub enum Magic {
    Lz10 = 0x10,
    Lz11 = 0x11,
    Lz40 = 0x40
}

/// LZ10 encoder strategies, trading compression quality for time
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum Strategy {
    /// linear window scan, longest match wins
    Greedy,
    /// BST-indexed sliding window, fastest
    Fast,
    /// linear scan plus one-byte lookahead
    Lazy
}
