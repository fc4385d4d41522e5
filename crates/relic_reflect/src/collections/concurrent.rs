//! `dashmap::DashMap<K, V>` as a concurrent key-value container.
//!
//! Entry iteration goes through [`Map::for_each_entry`] so each callback runs
//! while the shard guard for that entry is held; an iterator returning plain
//! references could not outlive the guards.

use core::hash::Hash;

use dashmap::DashMap;

use crate::cell::GenericTypeInfoCell;
use crate::info::{CollectionFamily, MapInfo, TypeInfo, TypePath, Typed};
use crate::ops::Map;
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Reflect, ReflectMut, ReflectRef};

impl<K, V> TypePath for DashMap<K, V>
where
    K: Reflect + GetTypeMeta + Eq + Hash,
    V: Reflect + GetTypeMeta,
{
    fn type_path() -> &'static str {
        "concurrent-map"
    }
}

impl<K, V> Typed for DashMap<K, V>
where
    K: Reflect + GetTypeMeta + Eq + Hash,
    V: Reflect + GetTypeMeta,
{
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Map(MapInfo::new::<Self, K, V>(CollectionFamily::Concurrent))
        })
    }
}

impl<K, V> Reflect for DashMap<K, V>
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

impl<K, V> Map for DashMap<K, V>
where
    K: Reflect + GetTypeMeta + Eq + Hash,
    V: Reflect + GetTypeMeta,
{
    fn len(&self) -> usize {
        self.len()
    }

    fn for_each_entry(&self, f: &mut dyn FnMut(&dyn Reflect, &dyn Reflect)) {
        for entry in self.iter() {
            f(entry.key(), entry.value());
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

impl<K, V> GetTypeMeta for DashMap<K, V>
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
    fn entries_are_visible_through_the_erased_map() {
        let map: DashMap<String, u32> = DashMap::new();
        map.insert("abc".into(), 1);
        map.insert("def".into(), 2);

        let erased: &dyn Map = &map;
        assert_eq!(erased.len(), 2);

        let mut seen = Vec::new();
        erased.for_each_entry(&mut |key, value| {
            let key = key.downcast_ref::<String>().cloned().unwrap_or_default();
            let value = value.downcast_ref::<u32>().copied().unwrap_or_default();
            seen.push((key, value));
        });
        seen.sort();
        assert_eq!(seen, vec![("abc".into(), 1), ("def".into(), 2)]);
    }
}
