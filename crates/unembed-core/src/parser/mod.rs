//! Parsers for embed pages
//!
//! Contains the packed-script decoder and the extraction strategies that
//! providers chain together.

pub mod packed;
pub mod strategies;
pub mod unbase;

pub use packed::{PackedScript, find_packed_script, is_packed, unpack, unpack_nested};
pub use strategies::{EmbedPage, Strategy, normalize_candidate, run_strategies};
pub use unbase::Unbaser;
