//! The generic field-by-field converter.

use relic_reflect::info::TypeInfo;
use relic_reflect::registry::TypeMeta;
use relic_reflect::{Reflect, ReflectMut, ReflectRef};

use crate::error::{MarshalError, UnmarshalError};
use crate::mangle::unmangle;
use crate::xml::Element;
use crate::{MarshalContext, UnmarshalContext};

use super::Converter;

/// Handles every struct the registry knows about.
///
/// The write path emits one child per field, default values included, with
/// `None` options omitted. The read path starts from the type's default and
/// fills in whatever the document provides:
///
/// - a child matching no declared field is skipped with a diagnostic, so
///   documents mentioning long-dropped fields keep loading;
/// - a declared field the document never mentions keeps its default;
/// - a field value that fails to read or fit is logged and left at its
///   default, except for security vetoes, which always propagate.
pub struct ReflectiveConverter;

impl Converter for ReflectiveConverter {
    fn can_convert(&self, info: &TypeInfo) -> bool {
        matches!(info, TypeInfo::Struct(_))
    }

    fn marshal(
        &self,
        value: &dyn Reflect,
        target: &mut Element,
        ctx: &MarshalContext<'_>,
    ) -> Result<(), MarshalError> {
        let ReflectRef::Struct(value) = value.reflect_ref() else {
            return Ok(());
        };
        for (name, field) in value.iter_fields() {
            if let Some(child) = ctx.write_field(name, field)? {
                target.push_child(child);
            }
        }
        Ok(())
    }

    fn unmarshal(
        &self,
        element: &Element,
        target: &TypeMeta,
        ctx: &UnmarshalContext<'_>,
    ) -> Result<Box<dyn Reflect>, UnmarshalError> {
        let mut value = target.default_value();
        let Some(shape) = target.type_info().as_struct() else {
            return Ok(value);
        };
        for child in element.children() {
            let field_name = unmangle(child.name());
            let Some(field) = shape.field(&field_name) else {
                log::warn!(
                    "ignoring unknown element `{}` while reading a `{}`",
                    child.name(),
                    target.type_path(),
                );
                continue;
            };
            let Some(field_meta) = ctx.types().get(field.ty_id()) else {
                log::warn!(
                    "field `{}` of `{}` has an unregistered type; keeping its default",
                    field.name(),
                    target.type_path(),
                );
                continue;
            };
            match ctx.read_value(child, field_meta) {
                Ok(field_value) => {
                    let assigned = match (&mut *value).reflect_mut() {
                        ReflectMut::Struct(target_struct) => {
                            match target_struct.field_mut(&field_name) {
                                Some(slot) => slot.set(field_value).is_ok(),
                                None => false,
                            }
                        }
                        _ => false,
                    };
                    if !assigned {
                        log::warn!(
                            "value read for `{}.{}` does not fit the field; keeping its default",
                            target.type_path(),
                            field.name(),
                        );
                    }
                }
                Err(UnmarshalError::Security(veto)) => {
                    return Err(UnmarshalError::Security(veto));
                }
                Err(fault) => {
                    log::warn!(
                        "keeping `{}.{}` at its default: {fault}",
                        target.type_path(),
                        field.name(),
                    );
                }
            }
        }
        Ok(value)
    }
}
