//! The immutable collection family.
//!
//! Each container is an enum whose variants are distinct concrete forms picked
//! deterministically by entry count: [`Empty`](ImmutableForm::Empty) for zero,
//! [`Singleton`](ImmutableForm::Singleton) for one,
//! [`Packed`](ImmutableForm::Packed) for more. Building a container with a
//! given count always yields the same form, so a reload restores not just the
//! entries but the exact concrete representation.

use core::mem;
use core::slice;

use crate::cell::GenericTypeInfoCell;
use crate::info::{CollectionFamily, ListInfo, MapInfo, TypeInfo, TypePath, Typed};
use crate::ops::{List, Map};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Reflect, ReflectMut, ReflectRef};

// -----------------------------------------------------------------------------
// ImmutableForm

/// The concrete form of an immutable container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImmutableForm {
    /// No entries.
    Empty,
    /// Exactly one entry.
    Singleton,
    /// Two or more entries.
    Packed,
}

// -----------------------------------------------------------------------------
// ImmutableMap

/// An insertion-ordered map with count-determined concrete forms.
#[derive(Clone, Debug, PartialEq)]
pub enum ImmutableMap<K, V> {
    /// No entries.
    Empty,
    /// Exactly one entry.
    Singleton(K, V),
    /// Two or more entries, in insertion order.
    Packed(Vec<(K, V)>),
}

impl<K, V> Default for ImmutableMap<K, V> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<K, V> ImmutableMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::Empty
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Singleton(..) => 1,
            Self::Packed(entries) => entries.len(),
        }
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the concrete form.
    pub fn form(&self) -> ImmutableForm {
        match self {
            Self::Empty => ImmutableForm::Empty,
            Self::Singleton(..) => ImmutableForm::Singleton,
            Self::Packed(_) => ImmutableForm::Packed,
        }
    }

    /// An iterator over the entries in insertion order.
    pub fn iter(&self) -> ImmutableMapIter<'_, K, V> {
        match self {
            Self::Empty => ImmutableMapIter::Empty,
            Self::Singleton(key, value) => ImmutableMapIter::One(Some((key, value))),
            Self::Packed(entries) => ImmutableMapIter::Many(entries.iter()),
        }
    }
}

impl<K: PartialEq, V> ImmutableMap<K, V> {
    /// Returns the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        match self {
            Self::Empty => None,
            Self::Singleton(k, v) => (k == key).then_some(v),
            Self::Packed(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
        }
    }

    /// Inserts an entry, reclassifying the form as the count changes.
    /// Returns the previous value stored under `key`, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match mem::take(self) {
            Self::Empty => {
                *self = Self::Singleton(key, value);
                None
            }
            Self::Singleton(k0, v0) => {
                if k0 == key {
                    *self = Self::Singleton(key, value);
                    Some(v0)
                } else {
                    *self = Self::Packed(vec![(k0, v0), (key, value)]);
                    None
                }
            }
            Self::Packed(mut entries) => {
                let mut previous = None;
                match entries.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => previous = Some(mem::replace(&mut slot.1, value)),
                    None => entries.push((key, value)),
                }
                *self = Self::Packed(entries);
                previous
            }
        }
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for ImmutableMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::Empty;
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// An iterator over the entries of an [`ImmutableMap`].
pub enum ImmutableMapIter<'a, K, V> {
    #[doc(hidden)]
    Empty,
    #[doc(hidden)]
    One(Option<(&'a K, &'a V)>),
    #[doc(hidden)]
    Many(slice::Iter<'a, (K, V)>),
}

impl<'a, K, V> Iterator for ImmutableMapIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Empty => None,
            Self::One(entry) => entry.take(),
            Self::Many(entries) => entries.next().map(|(k, v)| (k, v)),
        }
    }
}

impl<K, V> TypePath for ImmutableMap<K, V>
where
    K: Reflect + GetTypeMeta + PartialEq,
    V: Reflect + GetTypeMeta,
{
    fn type_path() -> &'static str {
        "immutable-map"
    }
}

impl<K, V> Typed for ImmutableMap<K, V>
where
    K: Reflect + GetTypeMeta + PartialEq,
    V: Reflect + GetTypeMeta,
{
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Map(MapInfo::new::<Self, K, V>(CollectionFamily::Immutable))
        })
    }
}

impl<K, V> Reflect for ImmutableMap<K, V>
where
    K: Reflect + GetTypeMeta + PartialEq,
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

impl<K, V> Map for ImmutableMap<K, V>
where
    K: Reflect + GetTypeMeta + PartialEq,
    V: Reflect + GetTypeMeta,
{
    fn len(&self) -> usize {
        ImmutableMap::len(self)
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

impl<K, V> GetTypeMeta for ImmutableMap<K, V>
where
    K: Reflect + GetTypeMeta + PartialEq,
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
// ImmutableList

/// An ordered immutable sequence with count-determined concrete forms.
#[derive(Clone, Debug, PartialEq)]
pub enum ImmutableList<T> {
    /// No items.
    Empty,
    /// Exactly one item.
    Singleton(T),
    /// Two or more items, in order.
    Packed(Vec<T>),
}

impl<T> Default for ImmutableList<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> ImmutableList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::Empty
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Singleton(_) => 1,
            Self::Packed(items) => items.len(),
        }
    }

    /// Returns `true` if there are no items.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the concrete form.
    pub fn form(&self) -> ImmutableForm {
        match self {
            Self::Empty => ImmutableForm::Empty,
            Self::Singleton(_) => ImmutableForm::Singleton,
            Self::Packed(_) => ImmutableForm::Packed,
        }
    }

    /// Returns the item at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Singleton(item) => (index == 0).then_some(item),
            Self::Packed(items) => items.get(index),
        }
    }

    /// Appends an item, reclassifying the form as the count changes.
    pub fn push(&mut self, item: T) {
        match mem::take(self) {
            Self::Empty => *self = Self::Singleton(item),
            Self::Singleton(first) => *self = Self::Packed(vec![first, item]),
            Self::Packed(mut items) => {
                items.push(item);
                *self = Self::Packed(items);
            }
        }
    }

    /// An iterator over the items in order.
    pub fn iter(&self) -> ImmutableSeqIter<'_, T> {
        match self {
            Self::Empty => ImmutableSeqIter::Empty,
            Self::Singleton(item) => ImmutableSeqIter::One(Some(item)),
            Self::Packed(items) => ImmutableSeqIter::Many(items.iter()),
        }
    }
}

impl<T> FromIterator<T> for ImmutableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::Empty;
        for item in iter {
            list.push(item);
        }
        list
    }
}

/// An iterator over the items of an [`ImmutableList`] or [`ImmutableSet`].
pub enum ImmutableSeqIter<'a, T> {
    #[doc(hidden)]
    Empty,
    #[doc(hidden)]
    One(Option<&'a T>),
    #[doc(hidden)]
    Many(slice::Iter<'a, T>),
}

impl<'a, T> Iterator for ImmutableSeqIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Empty => None,
            Self::One(item) => item.take(),
            Self::Many(items) => items.next(),
        }
    }
}

impl<T: Reflect + GetTypeMeta> TypePath for ImmutableList<T> {
    fn type_path() -> &'static str {
        "immutable-list"
    }
}

impl<T: Reflect + GetTypeMeta> Typed for ImmutableList<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::List(ListInfo::new::<Self, T>(CollectionFamily::Immutable))
        })
    }
}

impl<T: Reflect + GetTypeMeta> Reflect for ImmutableList<T> {
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

impl<T: Reflect + GetTypeMeta> List for ImmutableList<T> {
    fn len(&self) -> usize {
        ImmutableList::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        ImmutableList::get(self, index).map(|item| item as &dyn Reflect)
    }

    fn push_boxed(&mut self, item: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        self.push(item.take::<T>()?);
        Ok(())
    }
}

impl<T: Reflect + GetTypeMeta> GetTypeMeta for ImmutableList<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

// -----------------------------------------------------------------------------
// ImmutableSet

/// An insertion-ordered immutable set with count-determined concrete forms.
///
/// Inserting an item already present leaves the set unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum ImmutableSet<T> {
    /// No items.
    Empty,
    /// Exactly one item.
    Singleton(T),
    /// Two or more distinct items, in insertion order.
    Packed(Vec<T>),
}

impl<T> Default for ImmutableSet<T> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<T> ImmutableSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::Empty
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Singleton(_) => 1,
            Self::Packed(items) => items.len(),
        }
    }

    /// Returns `true` if there are no items.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the concrete form.
    pub fn form(&self) -> ImmutableForm {
        match self {
            Self::Empty => ImmutableForm::Empty,
            Self::Singleton(_) => ImmutableForm::Singleton,
            Self::Packed(_) => ImmutableForm::Packed,
        }
    }

    /// An iterator over the items in insertion order.
    pub fn iter(&self) -> ImmutableSeqIter<'_, T> {
        match self {
            Self::Empty => ImmutableSeqIter::Empty,
            Self::Singleton(item) => ImmutableSeqIter::One(Some(item)),
            Self::Packed(items) => ImmutableSeqIter::Many(items.iter()),
        }
    }
}

impl<T: PartialEq> ImmutableSet<T> {
    /// Returns `true` if `item` is present.
    pub fn contains(&self, item: &T) -> bool {
        self.iter().any(|existing| existing == item)
    }

    /// Inserts an item, reclassifying the form as the count changes.
    /// Returns `false` when the item was already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.contains(&item) {
            return false;
        }
        match mem::take(self) {
            Self::Empty => *self = Self::Singleton(item),
            Self::Singleton(first) => *self = Self::Packed(vec![first, item]),
            Self::Packed(mut items) => {
                items.push(item);
                *self = Self::Packed(items);
            }
        }
        true
    }
}

impl<T: PartialEq> FromIterator<T> for ImmutableSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::Empty;
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<T: Reflect + GetTypeMeta + PartialEq> TypePath for ImmutableSet<T> {
    fn type_path() -> &'static str {
        "immutable-set"
    }
}

impl<T: Reflect + GetTypeMeta + PartialEq> Typed for ImmutableSet<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::List(ListInfo::new::<Self, T>(CollectionFamily::Immutable))
        })
    }
}

impl<T: Reflect + GetTypeMeta + PartialEq> Reflect for ImmutableSet<T> {
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

impl<T: Reflect + GetTypeMeta + PartialEq> List for ImmutableSet<T> {
    fn len(&self) -> usize {
        ImmutableSet::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        match self {
            Self::Empty => None,
            Self::Singleton(item) => (index == 0).then_some(item as &dyn Reflect),
            Self::Packed(items) => items.get(index).map(|item| item as &dyn Reflect),
        }
    }

    fn push_boxed(&mut self, item: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        self.insert(item.take::<T>()?);
        Ok(())
    }
}

impl<T: Reflect + GetTypeMeta + PartialEq> GetTypeMeta for ImmutableSet<T> {
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
    fn map_forms_follow_the_entry_count() {
        let mut map: ImmutableMap<String, u32> = ImmutableMap::new();
        assert_eq!(map.form(), ImmutableForm::Empty);

        map.insert("one".into(), 1);
        assert_eq!(map.form(), ImmutableForm::Singleton);

        map.insert("two".into(), 2);
        assert_eq!(map.form(), ImmutableForm::Packed);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"one".into()), Some(&1));
    }

    #[test]
    fn map_insert_replaces_without_reclassifying() {
        let mut map: ImmutableMap<String, u32> = ImmutableMap::new();
        map.insert("one".into(), 1);
        assert_eq!(map.insert("one".into(), 10), Some(1));
        assert_eq!(map.form(), ImmutableForm::Singleton);
        assert_eq!(map.get(&"one".into()), Some(&10));
    }

    #[test]
    fn list_keeps_order_through_reclassification() {
        let list: ImmutableList<u32> = [3, 1, 2].into_iter().collect();
        assert_eq!(list.form(), ImmutableForm::Packed);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(list.get(1), Some(&1));
    }

    #[test]
    fn set_ignores_duplicates() {
        let set: ImmutableSet<String> = ["a", "b", "a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.form(), ImmutableForm::Packed);
        assert!(set.contains(&"a".into()));

        let single: ImmutableSet<u32> = [5, 5, 5].into_iter().collect();
        assert_eq!(single.form(), ImmutableForm::Singleton);
    }
}
