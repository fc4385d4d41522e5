//! `HashMap<K, V>` as a plain key-value container.

use core::hash::Hash;
use std::collections::HashMap;

use crate::cell::GenericTypeInfoCell;
use crate::info::{CollectionFamily, MapInfo, TypeInfo, TypePath, Typed};
use crate::ops::Map;
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Reflect, ReflectMut, ReflectRef};

impl<K, V> TypePath for HashMap<K, V>
where
    K: Reflect + GetTypeMeta + Eq + Hash,
    V: Reflect + GetTypeMeta,
{
    fn type_path() -> &'static str {
        "map"
    }
}

impl<K, V> Typed for HashMap<K, V>
where
    K: Reflect + GetTypeMeta + Eq + Hash,
    V: Reflect + GetTypeMeta,
{
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Map(MapInfo::new::<Self, K, V>(CollectionFamily::Plain))
        })
    }
}

impl<K, V> Reflect for HashMap<K, V>
where
    K: Reflect + GetTypeMeta + Eq + Hash,
    V: Reflect + GetTypeMeta,
{
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
        ReflectRef::Map(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Map(self)
    }
}

impl<K, V> Map for HashMap<K, V>
where
    K: Reflect + GetTypeMeta + Eq + Hash,
    V: Reflect + GetTypeMeta,
{
    fn len(&self) -> usize {
        self.len()
    }

    fn for_each_entry(&self, f: &mut dyn FnMut(&dyn Reflect, &dyn Reflect)) {
        for (key, value) in self.iter() {
            f(key, value);
        }
    }

    fn insert_boxed(
        &mut self,
        key: Box<dyn Reflect>,
        value: Box<dyn Reflect>,
    ) -> Result<(), (Box<dyn Reflect>, Box<dyn Reflect>)> {
        let key = match key.take::<K>() {
            Ok(key) => key,
            Err(key) => return Err((key, value)),
        };
        let value = match value.take::<V>() {
            Ok(value) => value,
            Err(value) => return Err((Box::new(key), value)),
        };
        self.insert(key, value);
        Ok(())
    }
}

impl<K, V> GetTypeMeta for HashMap<K, V>
where
    K: Reflect + GetTypeMeta + Eq + Hash,
    V: Reflect + GetTypeMeta,
{
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<K>();
        registry.register::<V>();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_boxed_returns_both_boxes_on_mismatch() {
        let mut map: HashMap<String, u32> = HashMap::new();
        let erased: &mut dyn Map = &mut map;
        erased
            .insert_boxed(Box::new(String::from("a")), Box::new(1_u32))
            .unwrap();
        let (key, value) = erased
            .insert_boxed(Box::new(2_u64), Box::new(1_u32))
            .unwrap_err();
        assert!((&*key).is::<u64>());
        assert!((&*value).is::<u32>());
        assert_eq!(map.get("a"), Some(&1));
    }
}
