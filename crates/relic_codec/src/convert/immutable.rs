//! Converters for the immutable collection family.
//!
//! The family's containers pick a concrete form from their entry count
//! ([`ImmutableForm`]), and reconstruction goes through the same counting
//! inserts, so a reload lands on exactly the form the writer held. The text
//! itself stays anonymous: entries only, no family name and no `class`
//! attribute unless the declared slot was dynamic and the engine had to name
//! the type.
//!
//! [`ImmutableForm`]: relic_reflect::collections::ImmutableForm

use relic_reflect::info::{CollectionFamily, TypeInfo};
use relic_reflect::registry::TypeMeta;
use relic_reflect::{Reflect, ReflectRef};

use crate::error::{MarshalError, UnmarshalError};
use crate::xml::Element;
use crate::{MarshalContext, UnmarshalContext};

use super::collections::{read_entries_into, read_sequence, write_entries};
use super::Converter;

// -----------------------------------------------------------------------------
// ImmutableSeqConverter

/// Handles `ImmutableList` and `ImmutableSet` (both list-shaped).
pub struct ImmutableSeqConverter;

impl Converter for ImmutableSeqConverter {
    fn can_convert(&self, info: &TypeInfo) -> bool {
        matches!(info.family(), Some(CollectionFamily::Immutable)) && info.as_list().is_some()
    }

    fn marshal(
        &self,
        value: &dyn Reflect,
        target: &mut Element,
        ctx: &MarshalContext<'_>,
    ) -> Result<(), MarshalError> {
        let ReflectRef::List(list) = value.reflect_ref() else {
            return Ok(());
        };
        for item in list.iter() {
            target.push_child(ctx.write_item(item)?);
        }
        Ok(())
    }

    fn unmarshal(
        &self,
        element: &Element,
        target: &TypeMeta,
        ctx: &UnmarshalContext<'_>,
    ) -> Result<Box<dyn Reflect>, UnmarshalError> {
        let Some(shape) = target.type_info().as_list() else {
            return Ok(target.default_value());
        };
        // The default is the Empty form; each insert reclassifies, so the
        // item count alone determines the form that comes back.
        read_sequence(element, target, shape, ctx)
    }
}

// -----------------------------------------------------------------------------
// ImmutableMapConverter

/// Handles `ImmutableMap`.
pub struct ImmutableMapConverter;

impl Converter for ImmutableMapConverter {
    fn can_convert(&self, info: &TypeInfo) -> bool {
        matches!(info.family(), Some(CollectionFamily::Immutable)) && info.as_map().is_some()
    }

    fn marshal(
        &self,
        value: &dyn Reflect,
        target: &mut Element,
        ctx: &MarshalContext<'_>,
    ) -> Result<(), MarshalError> {
        write_entries(value, target, ctx)
    }

    fn unmarshal(
        &self,
        element: &Element,
        target: &TypeMeta,
        ctx: &UnmarshalContext<'_>,
    ) -> Result<Box<dyn Reflect>, UnmarshalError> {
        let Some(shape) = target.type_info().as_map() else {
            return Ok(target.default_value());
        };
        let mut value = target.default_value();
        read_entries_into(&mut value, element.children(), target, shape, ctx)?;
        Ok(value)
    }
}
