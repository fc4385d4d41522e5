//! Converters map between reflected values and document elements.
//!
//! The engine walks the object graph and, at every value, asks the highest
//! ranked converter whose [`can_convert`](Converter::can_convert) accepts the
//! value's shape to produce or consume the element. Matching is by exact
//! shape kind and container family, never by structure: a struct that happens
//! to embed a specially-converted family is still handled field-by-field by
//! the reflective converter, while the embedded container gets its
//! specialized form when the engine descends into it.

use std::sync::Arc;

use relic_reflect::info::TypeInfo;
use relic_reflect::Reflect;
use relic_reflect::registry::TypeMeta;

use crate::error::{MarshalError, UnmarshalError};
use crate::xml::Element;
use crate::{MarshalContext, UnmarshalContext};

mod collections;
mod concurrent;
mod immutable;
mod reflective;
mod scalar;

pub use collections::{ListConverter, MapConverter};
pub use concurrent::ConcurrentMapConverter;
pub use immutable::{ImmutableMapConverter, ImmutableSeqConverter};
pub use reflective::ReflectiveConverter;
pub use scalar::ScalarConverter;

// -----------------------------------------------------------------------------
// Converter

/// Maps values of some shapes to and from document elements.
///
/// Converters never recurse themselves: nested values go back through the
/// context (`write_field` / `write_item`, `read_value` / `read_slot`) so the
/// binding table is consulted again at every level.
pub trait Converter: Send + Sync {
    /// Returns `true` if this converter handles values of the given shape.
    fn can_convert(&self, info: &TypeInfo) -> bool;

    /// Fills `target` from `value`. The engine has already named the element
    /// and attached the `class` attribute when the slot required one.
    fn marshal(
        &self,
        value: &dyn Reflect,
        target: &mut Element,
        ctx: &MarshalContext<'_>,
    ) -> Result<(), MarshalError>;

    /// Reconstructs a value of the `target` type from `element`.
    fn unmarshal(
        &self,
        element: &Element,
        target: &TypeMeta,
        ctx: &UnmarshalContext<'_>,
    ) -> Result<Box<dyn Reflect>, UnmarshalError>;
}

// -----------------------------------------------------------------------------
// ConverterBinding

/// A converter registered at a priority.
#[derive(Clone)]
pub(crate) struct ConverterBinding {
    pub(crate) priority: i32,
    pub(crate) converter: Arc<dyn Converter>,
}

impl ConverterBinding {
    pub(crate) fn new(priority: i32, converter: Arc<dyn Converter>) -> Self {
        Self { priority, converter }
    }
}

/// Priority tiers for converter bindings.
///
/// Lookup scans tiers from high to low; within a tier the most recently
/// registered binding is asked first, so a caller's converter at
/// [`NORMAL`](priority::NORMAL) overrides any built-in for the shapes it
/// accepts.
pub mod priority {
    /// The reflective converter lives here; it accepts every struct.
    pub const FALLBACK: i32 = -20;
    /// Below the built-in specialized converters.
    pub const LOW: i32 = -10;
    /// The built-in specialized converters.
    pub const NORMAL: i32 = 0;
    /// Above everything built in.
    pub const HIGH: i32 = 10;
}
