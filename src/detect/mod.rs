//! Format autodetection: a bounded sample reader, content validators, and
//! the extension/content detection algorithm that picks a parser kind.

pub mod engine;
pub mod generated;
pub mod patterns;
pub mod sample;
pub mod validators;

pub use engine::{detect, ParserKind};
