//! `Box<dyn Reflect>` as a type-erased slot.
//!
//! A dynamic slot holds any reflected value; the slot's own descriptor says
//! nothing about the content, so persisted text must name the concrete type
//! explicitly wherever one of these appears.

use crate::cell::NonGenericTypeInfoCell;
use crate::info::{DynamicInfo, TypeInfo, TypePath, Typed};
use crate::registry::{GetTypeMeta, TypeMeta};
use crate::{Reflect, ReflectMut, ReflectRef};

impl Default for Box<dyn Reflect> {
    fn default() -> Self {
        Box::new(())
    }
}

impl TypePath for Box<dyn Reflect> {
    fn type_path() -> &'static str {
        "object"
    }
}

impl Typed for Box<dyn Reflect> {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Dynamic(DynamicInfo::new::<Box<dyn Reflect>>()))
    }
}

impl Reflect for Box<dyn Reflect> {
    fn reflect_type_path(&self) -> &'static str {
        <Self as TypePath>::type_path()
    }

    fn reflect_type_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    // Accepts either another slot (its content moves over) or a bare value.
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        match value.take::<Self>() {
            Ok(inner) => *self = inner,
            Err(value) => *self = value,
        }
        Ok(())
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Dynamic(&**self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Dynamic(&mut **self)
    }
}

impl GetTypeMeta for Box<dyn Reflect> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_slot_reports_its_content() {
        let slot: Box<dyn Reflect> = Box::new(5_u32);
        let ReflectRef::Dynamic(inner) = Reflect::reflect_ref(&slot) else {
            panic!("a slot must classify as dynamic");
        };
        assert_eq!(inner.reflect_type_path(), "u32");
    }

    #[test]
    fn set_unwraps_nested_slots() {
        let mut slot: Box<dyn Reflect> = Box::new(());
        let nested: Box<dyn Reflect> = Box::new(String::from("inner"));
        Reflect::set(&mut slot, Box::new(nested)).unwrap();
        assert!((&*slot).is::<String>());

        Reflect::set(&mut slot, Box::new(7_u8)).unwrap();
        assert!((&*slot).is::<u8>());
    }
}
