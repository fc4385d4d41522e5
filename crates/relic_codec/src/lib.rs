#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod codec;
mod error;
mod mangle;
mod security;
mod version;

pub mod convert;
pub mod xml;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use codec::{MarshalContext, UnmarshalContext, XmlCodec};
pub use error::{MalformedInput, MarshalError, SecurityVeto, UnmarshalError};
pub use mangle::{mangle, unmangle};
pub use version::trim_version;
