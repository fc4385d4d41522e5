//! Kind-specific access traits behind [`Reflect`].
//!
//! Each trait corresponds to one [`ReflectRef`](crate::ReflectRef) variant:
//!
//! - [`Struct`]: named fields (e.g. `A { .. }`).
//! - [`List`]: ordered sequences (e.g. `Vec<T>`, the immutable lists/sets).
//! - [`Map`]: key-value containers (e.g. `HashMap<K, V>`, `DashMap<K, V>`).
//! - [`Nullable`]: optional slots (`Option<T>`).
//! - [`Scalar`]: leaves with a text form.
//!
//! The erased mutators hand values back on a concrete-type mismatch so a
//! caller can report the problem without losing the value.

use std::borrow::Cow;

use crate::Reflect;

// -----------------------------------------------------------------------------
// Struct

/// Erased access to a struct with named fields.
pub trait Struct: Reflect {
    /// Returns the field named `name`.
    fn field(&self, name: &str) -> Option<&dyn Reflect>;

    /// Returns the field named `name` mutably.
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect>;

    /// Returns the field at `index` in declaration order.
    fn field_at(&self, index: usize) -> Option<&dyn Reflect>;

    /// Returns the name of the field at `index`.
    fn name_at(&self, index: usize) -> Option<&'static str>;

    /// Returns the number of fields.
    fn field_len(&self) -> usize;
}

impl dyn Struct {
    /// An iterator over `(name, value)` pairs in declaration order.
    pub fn iter_fields(&self) -> FieldIter<'_> {
        FieldIter { target: self, index: 0 }
    }
}

/// An iterator over the fields of a [`Struct`].
pub struct FieldIter<'a> {
    target: &'a dyn Struct,
    index: usize,
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = (&'static str, &'a dyn Reflect);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.target.name_at(self.index)?;
        let field = self.target.field_at(self.index)?;
        self.index += 1;
        Some((name, field))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.target.field_len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

// -----------------------------------------------------------------------------
// List

/// Erased access to an ordered sequence.
pub trait List: Reflect {
    /// Returns the number of items.
    fn len(&self) -> usize;

    /// Returns the item at `index`.
    fn get(&self, index: usize) -> Option<&dyn Reflect>;

    /// Appends `item`, returning it back when its type does not fit.
    fn push_boxed(&mut self, item: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;
}

impl dyn List {
    /// An iterator over the items in order.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { target: self, index: 0 }
    }
}

/// An iterator over the items of a [`List`].
pub struct ListIter<'a> {
    target: &'a dyn List,
    index: usize,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a dyn Reflect;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.target.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.target.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

// -----------------------------------------------------------------------------
// Map

/// Erased access to a key-value container.
///
/// Iteration is visitor-shaped rather than iterator-shaped so concurrent maps
/// can hold their shard guards for the duration of each entry callback.
pub trait Map: Reflect {
    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Calls `f` once per entry. Order is container-defined.
    fn for_each_entry(&self, f: &mut dyn FnMut(&dyn Reflect, &dyn Reflect));

    /// Inserts an entry, returning both boxes back when either type does not
    /// fit.
    fn insert_boxed(
        &mut self,
        key: Box<dyn Reflect>,
        value: Box<dyn Reflect>,
    ) -> Result<(), (Box<dyn Reflect>, Box<dyn Reflect>)>;
}

// -----------------------------------------------------------------------------
// Nullable

/// Erased access to an optional slot.
pub trait Nullable: Reflect {
    /// Returns the contained value, if present.
    fn contained(&self) -> Option<&dyn Reflect>;

    /// Replaces the contents. `None` always succeeds; `Some` returns the box
    /// back when its type does not fit.
    fn set_contained(&mut self, value: Option<Box<dyn Reflect>>) -> Result<(), Box<dyn Reflect>>;
}

// -----------------------------------------------------------------------------
// Scalar

/// Erased access to a leaf value with a canonical text form.
///
/// The inverse direction (text to value) lives on
/// [`TypeMeta`](crate::registry::TypeMeta) because it constructs a new value
/// rather than reading an existing one.
pub trait Scalar: Reflect {
    /// Returns the text form.
    fn to_text(&self) -> Cow<'_, str>;
}
