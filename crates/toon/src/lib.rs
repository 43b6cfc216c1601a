//! TOON: a compact, indentation-based rendering of JSON aimed at LLM context windows.
//!
//! Uniform record lists (the common shape of meeting listings) collapse into one header line plus
//! one delimited row per record, which is where most of the size saving over JSON comes from.

mod classify;
mod decode;
mod encode;
mod error;
mod literal;

pub use classify::tabular_fields;
pub use decode::decode;
pub use encode::encode;
pub use error::{Result, ToonError};
