//! Scalar impls for the primitives.
//!
//! Wire names are short and language-neutral (`u32`, `string`, `bool`), so
//! container items read naturally in persisted text.

use std::borrow::Cow;

use crate::cell::NonGenericTypeInfoCell;
use crate::info::{ScalarInfo, TypeInfo, TypePath, Typed};
use crate::ops::Scalar;
use crate::registry::{GetTypeMeta, TypeMeta};
use crate::{Reflect, ReflectMut, ReflectRef};

crate::impl_reflect_scalar!(bool => "bool");
crate::impl_reflect_scalar!(char => "char");
crate::impl_reflect_scalar!(u8 => "u8");
crate::impl_reflect_scalar!(u16 => "u16");
crate::impl_reflect_scalar!(u32 => "u32");
crate::impl_reflect_scalar!(u64 => "u64");
crate::impl_reflect_scalar!(u128 => "u128");
crate::impl_reflect_scalar!(usize => "usize");
crate::impl_reflect_scalar!(i8 => "i8");
crate::impl_reflect_scalar!(i16 => "i16");
crate::impl_reflect_scalar!(i32 => "i32");
crate::impl_reflect_scalar!(i64 => "i64");
crate::impl_reflect_scalar!(i128 => "i128");
crate::impl_reflect_scalar!(isize => "isize");
crate::impl_reflect_scalar!(f32 => "f32");
crate::impl_reflect_scalar!(f64 => "f64");

// -----------------------------------------------------------------------------
// String

// Spelled out instead of using the macro so `to_text` can borrow.

impl TypePath for String {
    fn type_path() -> &'static str {
        "string"
    }
}

impl Typed for String {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Scalar(ScalarInfo::new::<String>()))
    }
}

impl Reflect for String {
    fn reflect_type_path(&self) -> &'static str {
        <Self as TypePath>::type_path()
    }

    fn reflect_type_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        *self = value.take::<Self>()?;
        Ok(())
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Scalar(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Scalar(self)
    }
}

impl Scalar for String {
    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl GetTypeMeta for String {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::scalar_of::<String>()
    }
}

// -----------------------------------------------------------------------------
// Unit

// `()` has no `Display` / `FromStr`, so the macro does not apply.

impl TypePath for () {
    fn type_path() -> &'static str {
        "unit"
    }
}

impl Typed for () {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Scalar(ScalarInfo::new::<()>()))
    }
}

impl Reflect for () {
    fn reflect_type_path(&self) -> &'static str {
        <Self as TypePath>::type_path()
    }

    fn reflect_type_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        value.take::<Self>()?;
        Ok(())
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Scalar(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Scalar(self)
    }
}

impl Scalar for () {
    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }
}

fn parse_unit(_text: &str) -> Option<Box<dyn Reflect>> {
    Some(Box::new(()))
}

impl GetTypeMeta for () {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<()>().with_parser(parse_unit)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_text_forms_round_trip() {
        assert_eq!(17_u32.to_text(), "17");
        assert_eq!((-3_i8).to_text(), "-3");
        assert_eq!(0.75_f32.to_text(), "0.75");
        assert_eq!(true.to_text(), "true");

        let meta = TypeMeta::scalar_of::<f32>();
        let parsed = meta.parse_text("0.75").unwrap();
        assert_eq!(parsed.take::<f32>().ok(), Some(0.75));
    }

    #[test]
    fn string_borrows_its_text() {
        let text = String::from("persisted");
        assert!(matches!(text.to_text(), Cow::Borrowed("persisted")));
    }
}
