//! Converter for leaf values with a text form.

use relic_reflect::info::TypeInfo;
use relic_reflect::registry::TypeMeta;
use relic_reflect::{Reflect, ReflectRef};

use crate::error::{MalformedInput, MarshalError, UnmarshalError};
use crate::xml::Element;
use crate::{MarshalContext, UnmarshalContext};

use super::Converter;

/// Writes scalars as element character data and parses them back through
/// their registered text parser.
pub struct ScalarConverter;

impl Converter for ScalarConverter {
    fn can_convert(&self, info: &TypeInfo) -> bool {
        matches!(info, TypeInfo::Scalar(_))
    }

    fn marshal(
        &self,
        value: &dyn Reflect,
        target: &mut Element,
        _ctx: &MarshalContext<'_>,
    ) -> Result<(), MarshalError> {
        if let ReflectRef::Scalar(scalar) = value.reflect_ref() {
            target.set_text(scalar.to_text());
        }
        Ok(())
    }

    fn unmarshal(
        &self,
        element: &Element,
        target: &TypeMeta,
        _ctx: &UnmarshalContext<'_>,
    ) -> Result<Box<dyn Reflect>, UnmarshalError> {
        target.parse_text(element.text()).ok_or_else(|| {
            MalformedInput::Scalar {
                type_path: target.type_path(),
                text: element.text().to_owned(),
            }
            .into()
        })
    }
}
