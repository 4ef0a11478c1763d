//! Byte-level helpers shared by structured attribute decoders.

pub mod bits;

pub use bits::{hex_to_ascii, hex_to_bytes, word_bits};
