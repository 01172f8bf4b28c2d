//! CLI command implementations.

pub mod parse;
pub mod resolve;
