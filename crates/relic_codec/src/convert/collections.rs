//! Converters for the plain container family, plus the entry-shaped helpers
//! shared by every map-like converter.

use relic_reflect::info::{CollectionFamily, ListInfo, MapInfo, TypeInfo};
use relic_reflect::registry::TypeMeta;
use relic_reflect::{Reflect, ReflectMut, ReflectRef};

use crate::error::{MarshalError, UnmarshalError};
use crate::xml::Element;
use crate::{MarshalContext, UnmarshalContext};

use super::Converter;

pub(crate) const ENTRY_ELEMENT: &str = "entry";

// -----------------------------------------------------------------------------
// ListConverter

/// Writes plain sequences as one child element per item, named by the item's
/// runtime type, with `<null/>` for absent optional items.
pub struct ListConverter;

impl Converter for ListConverter {
    fn can_convert(&self, info: &TypeInfo) -> bool {
        matches!(info.family(), Some(CollectionFamily::Plain)) && info.as_list().is_some()
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
        read_sequence(element, target, shape, ctx)
    }
}

// -----------------------------------------------------------------------------
// MapConverter

/// Writes plain maps as `<entry>` children, each holding the key element and
/// the value element in that order.
pub struct MapConverter;

impl Converter for MapConverter {
    fn can_convert(&self, info: &TypeInfo) -> bool {
        matches!(info.family(), Some(CollectionFamily::Plain)) && info.as_map().is_some()
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

// -----------------------------------------------------------------------------
// Shared helpers

/// Reads one item child per list slot, tolerating items that fail.
pub(super) fn read_sequence(
    element: &Element,
    target: &TypeMeta,
    shape: &ListInfo,
    ctx: &UnmarshalContext<'_>,
) -> Result<Box<dyn Reflect>, UnmarshalError> {
    let mut value = target.default_value();
    let Some(item_meta) = ctx.types().get(shape.item_id()) else {
        log::warn!(
            "item type of `{}` is not registered; reading it empty",
            target.type_path(),
        );
        return Ok(value);
    };
    for child in element.children() {
        match ctx.read_slot(child, item_meta) {
            Ok(item) => {
                let pushed = match (&mut *value).reflect_mut() {
                    ReflectMut::List(list) => list.push_boxed(item).is_ok(),
                    _ => false,
                };
                if !pushed {
                    log::warn!(
                        "dropping `{}` item that does not fit a `{}`",
                        child.name(),
                        target.type_path(),
                    );
                }
            }
            Err(UnmarshalError::Security(veto)) => return Err(UnmarshalError::Security(veto)),
            Err(fault) => {
                log::warn!("skipping unreadable `{}` item: {fault}", target.type_path());
            }
        }
    }
    Ok(value)
}

/// Writes every entry of a map-shaped value as an `<entry>` child.
pub(super) fn write_entries(
    value: &dyn Reflect,
    target: &mut Element,
    ctx: &MarshalContext<'_>,
) -> Result<(), MarshalError> {
    let ReflectRef::Map(map) = value.reflect_ref() else {
        return Ok(());
    };
    let mut first_fault = None;
    map.for_each_entry(&mut |key, entry_value| {
        if first_fault.is_some() {
            return;
        }
        let written = ctx
            .write_item(key)
            .and_then(|key_el| ctx.write_item(entry_value).map(|value_el| (key_el, value_el)));
        match written {
            Ok((key_el, value_el)) => {
                let mut entry = Element::new(ENTRY_ELEMENT);
                entry.push_child(key_el);
                entry.push_child(value_el);
                target.push_child(entry);
            }
            Err(fault) => first_fault = Some(fault),
        }
    });
    match first_fault {
        Some(fault) => Err(fault),
        None => Ok(()),
    }
}

/// Reads `<entry>` children into a map-shaped value, tolerating entries that
/// fail.
pub(super) fn read_entries_into(
    value: &mut Box<dyn Reflect>,
    children: &[Element],
    target: &TypeMeta,
    shape: &MapInfo,
    ctx: &UnmarshalContext<'_>,
) -> Result<(), UnmarshalError> {
    let (Some(key_meta), Some(value_meta)) = (
        ctx.types().get(shape.key_id()),
        ctx.types().get(shape.value_id()),
    ) else {
        log::warn!(
            "entry types of `{}` are not registered; reading it empty",
            target.type_path(),
        );
        return Ok(());
    };
    for child in children {
        if child.name() != ENTRY_ELEMENT {
            log::warn!(
                "ignoring `{}` inside a `{}`",
                child.name(),
                target.type_path(),
            );
            continue;
        }
        let mut slots = child.children().iter();
        let (Some(key_el), Some(value_el)) = (slots.next(), slots.next()) else {
            log::warn!(
                "skipping `{}` entry with fewer than two children",
                target.type_path(),
            );
            continue;
        };
        if slots.next().is_some() {
            log::warn!(
                "entry of `{}` carries extra children; reading the first two",
                target.type_path(),
            );
        }
        let key = match ctx.read_slot(key_el, key_meta) {
            Ok(key) => key,
            Err(UnmarshalError::Security(veto)) => return Err(UnmarshalError::Security(veto)),
            Err(fault) => {
                log::warn!("skipping entry with unreadable key: {fault}");
                continue;
            }
        };
        let entry_value = match ctx.read_slot(value_el, value_meta) {
            Ok(entry_value) => entry_value,
            Err(UnmarshalError::Security(veto)) => return Err(UnmarshalError::Security(veto)),
            Err(fault) => {
                log::warn!("skipping entry with unreadable value: {fault}");
                continue;
            }
        };
        let inserted = match (&mut **value).reflect_mut() {
            ReflectMut::Map(map) => map.insert_boxed(key, entry_value).is_ok(),
            _ => false,
        };
        if !inserted {
            log::warn!(
                "dropping entry that does not fit a `{}`",
                target.type_path(),
            );
        }
    }
    Ok(())
}
