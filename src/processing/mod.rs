//! Image conversion pipeline.
//!
//! - [`convert`]: decode, resize to exact dimensions, re-encode, verify on disk
//! - [`formats`]: format name → encoder mapping and per-encoder pixel preparation
//! - [`resize`]: fixed-size stretch resize
//! - [`random_name`]: randomized output file names

mod converter;
mod formats;
mod naming;
mod resize;

pub use converter::{Conversion, convert, decode};
pub use formats::{OutputFormat, flatten_onto_white, prepare_for};
pub use naming::{NAME_LENGTH, random_name};
pub use resize::resize_exact;
