//! `Vec<T>` as a plain ordered sequence.

use crate::cell::GenericTypeInfoCell;
use crate::info::{CollectionFamily, ListInfo, TypeInfo, TypePath, Typed};
use crate::ops::List;
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Reflect, ReflectMut, ReflectRef};

impl<T: Reflect + GetTypeMeta> TypePath for Vec<T> {
    fn type_path() -> &'static str {
        "list"
    }
}

impl<T: Reflect + GetTypeMeta> Typed for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::List(ListInfo::new::<Self, T>(CollectionFamily::Plain))
        })
    }
}

impl<T: Reflect + GetTypeMeta> Reflect for Vec<T> {
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
        ReflectRef::List(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::List(self)
    }
}

impl<T: Reflect + GetTypeMeta> List for Vec<T> {
    fn len(&self) -> usize {
        self.len()
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|item| item as &dyn Reflect)
    }

    fn push_boxed(&mut self, item: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        self.push(item.take::<T>()?);
        Ok(())
    }
}

impl<T: Reflect + GetTypeMeta> GetTypeMeta for Vec<T> {
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
    fn push_boxed_keeps_order_and_rejects_mismatches() {
        let mut items: Vec<String> = Vec::new();
        let list: &mut dyn List = &mut items;
        list.push_boxed(Box::new(String::from("a"))).unwrap();
        list.push_boxed(Box::new(String::from("b"))).unwrap();
        assert!(list.push_boxed(Box::new(3_u32)).is_err());
        assert_eq!(items, vec!["a".to_string(), "b".to_string()]);
    }
}
