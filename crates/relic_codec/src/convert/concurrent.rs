//! Converter for the concurrent map family.

use relic_reflect::info::{CollectionFamily, TypeInfo};
use relic_reflect::registry::TypeMeta;
use relic_reflect::Reflect;

use crate::error::{MarshalError, UnmarshalError};
use crate::xml::Element;
use crate::{MarshalContext, UnmarshalContext};

use super::collections::{read_entries_into, write_entries, ENTRY_ELEMENT};
use super::Converter;

const TABLE_ELEMENT: &str = "table";

/// Handles `DashMap`, writing the compact entry shape only.
///
/// The read path accepts two shapes. New documents hold nothing but `<entry>`
/// children. Documents written by the old reflective dump nested the entries
/// under a `<table>` child beside scalar synchronization internals such as
/// `<capacity>` and `<load__factor>`; those internals are skipped and never
/// re-emitted, so one rewrite migrates the document to the compact shape.
pub struct ConcurrentMapConverter;

impl Converter for ConcurrentMapConverter {
    fn can_convert(&self, info: &TypeInfo) -> bool {
        matches!(info.family(), Some(CollectionFamily::Concurrent)) && info.as_map().is_some()
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
        let compact = element
            .children()
            .iter()
            .all(|child| child.name() == ENTRY_ELEMENT);
        if compact {
            read_entries_into(&mut value, element.children(), target, shape, ctx)?;
            return Ok(value);
        }
        for child in element.children() {
            if child.name() == TABLE_ELEMENT {
                read_entries_into(&mut value, child.children(), target, shape, ctx)?;
            } else if child.name() == ENTRY_ELEMENT {
                read_entries_into(
                    &mut value,
                    core::slice::from_ref(child),
                    target,
                    shape,
                    ctx,
                )?;
            } else {
                log::debug!(
                    "skipping `{}` synchronization internals of `{}`",
                    child.name(),
                    target.type_path(),
                );
            }
        }
        Ok(value)
    }
}
