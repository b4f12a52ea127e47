//! Minimal Recursion Semantics for grammar testing
//!
//! Decodes the SimpleMRS serialization stored in profile `result` tables and
//! answers the structural questions a grammar test asks of it: is it
//! well-formed, is it connected, is every predication reachable from the top,
//! and is it the same structure as another MRS up to variable renaming.

#![warn(clippy::all)]

pub mod checks;
pub mod compare;
pub mod mrs;
pub mod simplemrs;

pub use compare::{compare_bags, is_isomorphic, BagComparison};
pub use mrs::{Arg, ElementaryPredication, HandleConstraint, IndividualConstraint, Mrs, Var};
pub use simplemrs::decode;

/// Reasons a serialized MRS could not be decoded
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty semantic representation")]
    Empty,

    #[error("Unexpected end of input; expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("Unexpected token '{found}' at offset {offset}; expected {expected}")]
    UnexpectedToken { found: String, offset: usize, expected: &'static str },

    #[error("Invalid variable '{found}' at offset {offset}")]
    InvalidVariable { found: String, offset: usize },

    #[error("Unsupported representation format: {format}")]
    Unsupported { format: String },
}

impl DecodeError {
    /// True for syntax errors in SimpleMRS text; false when the input is in
    /// some other format altogether
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }
}
