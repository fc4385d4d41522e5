//! Fault types for marshal and unmarshal calls.
//!
//! Faults abort only the triggering call; recoverable read inconsistencies
//! (missing fields, stale elements, values that no longer fit) are `log`
//! diagnostics instead and never surface here.

use thiserror::Error;

// -----------------------------------------------------------------------------
// MarshalError

/// A fault while writing a value out.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// No registered converter accepts the value.
    #[error("no converter accepts values of type `{type_path}`")]
    NoConverter {
        /// Wire name of the rejected type.
        type_path: &'static str,
    },
}

// -----------------------------------------------------------------------------
// UnmarshalError

/// A fault while reading a document back.
#[derive(Debug, Error)]
pub enum UnmarshalError {
    /// The input cannot be read as a value of the required type.
    #[error(transparent)]
    Malformed(#[from] MalformedInput),

    /// The input names a forbidden shape. Never downgraded.
    #[error(transparent)]
    Security(#[from] SecurityVeto),
}

/// Ways input text can fail to produce a value.
#[derive(Debug, Error)]
pub enum MalformedInput {
    /// The input could not be read at all.
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not well-formed.
    #[error("malformed document at byte {offset}: {reason}")]
    Syntax {
        /// Byte offset where reading stopped.
        offset: usize,
        /// What went wrong.
        reason: String,
    },

    /// A required name resolves to no registered type or alias.
    #[error("`{name}` does not resolve to any registered type")]
    UnknownType {
        /// The unresolvable wire name, as found in the input.
        name: String,
    },

    /// No registered converter can reconstruct the required type.
    #[error("no converter accepts values of type `{type_path}`")]
    NoConverter {
        /// Wire name of the rejected type.
        type_path: &'static str,
    },

    /// A scalar's text form does not parse.
    #[error("cannot parse `{text}` as a `{type_path}` value")]
    Scalar {
        /// Wire name of the expected scalar type.
        type_path: &'static str,
        /// The offending text.
        text: String,
    },

    /// The document root holds a different type than the caller asked for.
    #[error("expected the document root to hold `{expected}`, found `{found}`")]
    UnexpectedRoot {
        /// Wire name the caller asked for.
        expected: &'static str,
        /// Wire name actually found.
        found: &'static str,
    },
}

// -----------------------------------------------------------------------------
// SecurityVeto

/// Refusal to reconstruct a forbidden shape from input.
///
/// Raised before any lookup or construction happens for the offending name,
/// and propagated out of any nesting depth without downgrade.
#[derive(Debug, Error)]
#[error("refusing to reconstruct forbidden shape `{shape}` from input")]
pub struct SecurityVeto {
    /// The forbidden shape name found in the input.
    pub shape: String,
}
