use core::any::{Any, TypeId};
use core::fmt;

use crate::info::TypeInfo;
use crate::ops::{List, Map, Nullable, Scalar, Struct};

// -----------------------------------------------------------------------------
// Reflect

/// Type-erased access to a persistable value.
///
/// Implementations are generated by [`reflect_struct!`](crate::reflect_struct)
/// and [`impl_reflect_scalar!`](crate::impl_reflect_scalar), or provided by
/// this crate for the standard containers. A `&dyn Reflect` can be classified
/// through [`reflect_ref`](Reflect::reflect_ref) and then walked through the
/// matching ops trait without knowing the concrete type.
///
/// # Example
///
/// ```
/// use relic_reflect::{Reflect, ReflectRef};
///
/// let value: Box<dyn Reflect> = Box::new(42_u32);
/// let ReflectRef::Scalar(scalar) = (&*value).reflect_ref() else {
///     unreachable!()
/// };
///
/// assert_eq!(scalar.to_text(), "42");
/// assert_eq!((&*value).downcast_ref::<u32>(), Some(&42));
/// ```
pub trait Reflect: Any + Send + Sync {
    /// Returns the wire name of the underlying type.
    fn reflect_type_path(&self) -> &'static str;

    /// Returns the [`TypeInfo`] of the underlying type.
    fn reflect_type_info(&self) -> &'static TypeInfo;

    /// Returns the `TypeId` of the underlying type.
    fn ty_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Overwrites this value with `value`.
    ///
    /// Returns `value` back unchanged when its concrete type does not fit.
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;

    /// Classifies this value for read access.
    fn reflect_ref(&self) -> ReflectRef<'_>;

    /// Classifies this value for write access.
    fn reflect_mut(&mut self) -> ReflectMut<'_>;
}

impl dyn Reflect {
    /// Returns `true` if the underlying type is `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.ty_id() == TypeId::of::<T>()
    }

    /// Downcasts to a shared reference of `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }

    /// Downcasts to an exclusive reference of `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut()
    }

    /// Downcasts the box to `T`, returning it unchanged on mismatch.
    pub fn downcast<T: Any>(self: Box<Self>) -> Result<Box<T>, Box<Self>> {
        if self.is::<T>() {
            let any: Box<dyn Any> = self;
            // The `is` check above guarantees the concrete type matches.
            Ok(any.downcast().unwrap_or_else(|_| unreachable!()))
        } else {
            Err(self)
        }
    }

    /// Moves the value out of the box as `T`, returning the box on mismatch.
    pub fn take<T: Any>(self: Box<Self>) -> Result<T, Box<Self>> {
        self.downcast().map(|value| *value)
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dyn Reflect({})", self.reflect_type_path())
    }
}

// -----------------------------------------------------------------------------
// ReflectRef / ReflectMut

/// A shared reference classified by value kind.
pub enum ReflectRef<'a> {
    /// A struct with named fields.
    Struct(&'a dyn Struct),
    /// An ordered sequence.
    List(&'a dyn List),
    /// A key-value container.
    Map(&'a dyn Map),
    /// An optional slot.
    Nullable(&'a dyn Nullable),
    /// A leaf encoded as text.
    Scalar(&'a dyn Scalar),
    /// The current content of a type-erased slot.
    Dynamic(&'a dyn Reflect),
}

/// An exclusive reference classified by value kind.
pub enum ReflectMut<'a> {
    /// A struct with named fields.
    Struct(&'a mut dyn Struct),
    /// An ordered sequence.
    List(&'a mut dyn List),
    /// A key-value container.
    Map(&'a mut dyn Map),
    /// An optional slot.
    Nullable(&'a mut dyn Nullable),
    /// A leaf encoded as text.
    Scalar(&'a mut dyn Scalar),
    /// The current content of a type-erased slot.
    Dynamic(&'a mut dyn Reflect),
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_ref_checks_the_concrete_type() {
        let value: Box<dyn Reflect> = Box::new(String::from("relic"));
        assert!((&*value).is::<String>());
        assert!(!(&*value).is::<u32>());
        assert_eq!(
            (&*value).downcast_ref::<String>().map(String::as_str),
            Some("relic")
        );
        assert!((&*value).downcast_ref::<u32>().is_none());
    }

    #[test]
    fn take_returns_the_box_on_mismatch() {
        let value: Box<dyn Reflect> = Box::new(7_i64);
        let value = match value.take::<u32>() {
            Ok(_) => panic!("an i64 must not come out as a u32"),
            Err(original) => original,
        };
        assert_eq!(value.take::<i64>().ok(), Some(7));
    }

    #[test]
    fn set_replaces_matching_values() {
        let mut slot = 1_u32;
        let result = slot.set(Box::new(5_u32));
        assert!(result.is_ok());
        assert_eq!(slot, 5);

        let rejected = slot.set(Box::new(String::from("nope")));
        assert!(rejected.is_err());
        assert_eq!(slot, 5);
    }
}
