//! `Option<T>` as an optional slot.

use crate::cell::GenericTypeInfoCell;
use crate::info::{NullableInfo, TypeInfo, TypePath, Typed};
use crate::ops::Nullable;
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Reflect, ReflectMut, ReflectRef};

impl<T: Reflect + GetTypeMeta> TypePath for Option<T> {
    fn type_path() -> &'static str {
        "option"
    }
}

impl<T: Reflect + GetTypeMeta> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::Nullable(NullableInfo::new::<Self, T>()))
    }
}

impl<T: Reflect + GetTypeMeta> Reflect for Option<T> {
    fn reflect_type_path(&self) -> &'static str {
        <Self as TypePath>::type_path()
    }

    fn reflect_type_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    // Accepts either a whole `Option<T>` or a bare `T`, which becomes `Some`.
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        match value.take::<Self>() {
            Ok(replacement) => {
                *self = replacement;
                Ok(())
            }
            Err(value) => {
                *self = Some(value.take::<T>()?);
                Ok(())
            }
        }
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Nullable(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Nullable(self)
    }
}

impl<T: Reflect + GetTypeMeta> Nullable for Option<T> {
    fn contained(&self) -> Option<&dyn Reflect> {
        self.as_ref().map(|value| value as &dyn Reflect)
    }

    fn set_contained(&mut self, value: Option<Box<dyn Reflect>>) -> Result<(), Box<dyn Reflect>> {
        match value {
            None => {
                *self = None;
                Ok(())
            }
            Some(value) => {
                *self = Some(value.take::<T>()?);
                Ok(())
            }
        }
    }
}

impl<T: Reflect + GetTypeMeta> GetTypeMeta for Option<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_accepts_bare_values() {
        let mut slot: Option<u32> = None;
        slot.set(Box::new(9_u32)).unwrap();
        assert_eq!(slot, Some(9));

        slot.set(Box::new(None::<u32>)).unwrap();
        assert_eq!(slot, None);
    }

    #[test]
    fn set_contained_rejects_mismatches() {
        let mut slot: Option<u32> = Some(1);
        assert!(slot.set_contained(Some(Box::new(String::new()))).is_err());
        assert_eq!(slot, Some(1));

        slot.set_contained(None).unwrap();
        assert_eq!(slot, None);
    }
}
