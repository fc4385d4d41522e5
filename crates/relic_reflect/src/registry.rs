//! Runtime registration of persistable types.
//!
//! A [`TypeRegistry`] maps `TypeId`s and wire names to [`TypeMeta`] entries.
//! The codec resolves every name it finds in input text through a registry, so
//! only registered types can ever be constructed from text.

use core::any::TypeId;
use core::str::FromStr;
use std::collections::HashMap;

use crate::Reflect;
use crate::info::{TypeInfo, Typed};

// -----------------------------------------------------------------------------
// TypeMeta

/// Runtime metadata for one registered type.
///
/// Besides the shape descriptor this carries the two capabilities the read
/// path needs: constructing a default instance to populate, and (for scalars)
/// parsing a value out of its text form.
///
/// # Example
///
/// ```
/// use relic_reflect::registry::TypeMeta;
///
/// let meta = TypeMeta::scalar_of::<u32>();
/// let value = meta.parse_text("17").unwrap();
///
/// assert_eq!(value.take::<u32>().ok(), Some(17));
/// ```
#[derive(Clone)]
pub struct TypeMeta {
    type_info: &'static TypeInfo,
    default_fn: fn() -> Box<dyn Reflect>,
    parse_fn: Option<fn(&str) -> Option<Box<dyn Reflect>>>,
}

fn make_default<T: Reflect + Default>() -> Box<dyn Reflect> {
    Box::new(T::default())
}

fn parse_scalar<T: Reflect + FromStr>(text: &str) -> Option<Box<dyn Reflect>> {
    text.parse::<T>()
        .ok()
        .map(|value| Box::new(value) as Box<dyn Reflect>)
}

impl TypeMeta {
    /// Creates the [`TypeMeta`] of a non-scalar type.
    pub fn of<T: Reflect + Typed + Default>() -> Self {
        Self {
            type_info: T::type_info(),
            default_fn: make_default::<T>,
            parse_fn: None,
        }
    }

    /// Creates the [`TypeMeta`] of a scalar type, parsing text via [`FromStr`].
    pub fn scalar_of<T: Reflect + Typed + Default + FromStr>() -> Self {
        Self {
            parse_fn: Some(parse_scalar::<T>),
            ..Self::of::<T>()
        }
    }

    /// Replaces the text parser.
    pub fn with_parser(mut self, parser: fn(&str) -> Option<Box<dyn Reflect>>) -> Self {
        self.parse_fn = Some(parser);
        self
    }

    /// Returns the [`TypeInfo`].
    pub const fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    /// Returns the wire name.
    pub const fn type_path(&self) -> &'static str {
        self.type_info.type_path()
    }

    /// Returns the `TypeId`.
    pub const fn ty_id(&self) -> TypeId {
        self.type_info.ty_id()
    }

    /// Constructs a default instance.
    pub fn default_value(&self) -> Box<dyn Reflect> {
        (self.default_fn)()
    }

    /// Parses a value out of its text form.
    ///
    /// Returns `None` when the type has no text form or the text does not
    /// parse.
    pub fn parse_text(&self, text: &str) -> Option<Box<dyn Reflect>> {
        self.parse_fn.and_then(|parse| parse(text))
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

/// A trait which allows a type to generate its [`TypeMeta`] for registration
/// into the [`TypeRegistry`].
///
/// Implemented by [`reflect_struct!`](crate::reflect_struct) and
/// [`impl_reflect_scalar!`](crate::impl_reflect_scalar); the generated
/// `register_dependencies` pulls in every type reachable through fields or
/// container parameters, so registering a root type registers its whole graph.
pub trait GetTypeMeta: Typed {
    /// Returns the [`TypeMeta`] for this type.
    fn get_type_meta() -> TypeMeta;

    /// Registers other types needed by this type.
    /// **Allow** not to register oneself.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of [`TypeMeta`] entries, addressable by `TypeId` and wire name.
///
/// Wire names are not guaranteed unique across generic instantiations (every
/// `ImmutableMap<K, V>` shares `immutable-map`); the last registration wins
/// the name slot while both instantiations stay reachable by `TypeId`.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    metas: HashMap<TypeId, TypeMeta>,
    path_to_id: HashMap<&'static str, TypeId>,
}

impl TypeRegistry {
    /// Creates a registry preloaded with the primitive scalars.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<()>();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<u128>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<i128>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry
    }

    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers `T` and everything it depends on. Idempotent.
    pub fn register<T: GetTypeMeta>(&mut self) {
        if self.metas.contains_key(&TypeId::of::<T>()) {
            return;
        }
        self.add_meta(T::get_type_meta());
        T::register_dependencies(self);
    }

    /// Inserts a prebuilt [`TypeMeta`], claiming its wire name.
    pub fn add_meta(&mut self, meta: TypeMeta) {
        self.path_to_id.insert(meta.type_path(), meta.ty_id());
        self.metas.insert(meta.ty_id(), meta);
    }

    /// Returns `true` if the given type is registered.
    pub fn contains(&self, ty_id: TypeId) -> bool {
        self.metas.contains_key(&ty_id)
    }

    /// Returns the [`TypeMeta`] registered for `ty_id`.
    pub fn get(&self, ty_id: TypeId) -> Option<&TypeMeta> {
        self.metas.get(&ty_id)
    }

    /// Returns the [`TypeMeta`] whose wire name is `path`.
    pub fn get_with_path(&self, path: &str) -> Option<&TypeMeta> {
        self.path_to_id.get(path).and_then(|id| self.metas.get(id))
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// An iterator visiting every registered [`TypeMeta`] in arbitrary order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.metas.values()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_resolve_by_wire_name() {
        let registry = TypeRegistry::new();
        let meta = registry.get_with_path("u32").unwrap();
        assert_eq!(meta.ty_id(), TypeId::of::<u32>());
        assert!(registry.get_with_path("uint32").is_none());
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = TypeRegistry::empty();
        registry.register::<String>();
        registry.register::<String>();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registering_a_struct_pulls_in_field_types() {
        crate::reflect_struct! {
            #[derive(Default)]
            struct Station {
                label: String,
                altitude: f64,
            }
        }

        let mut registry = TypeRegistry::empty();
        registry.register::<Station>();
        assert!(registry.contains(TypeId::of::<Station>()));
        assert!(registry.contains(TypeId::of::<String>()));
        assert!(registry.contains(TypeId::of::<f64>()));
    }

    #[test]
    fn scalar_meta_parses_and_rejects() {
        let meta = TypeMeta::scalar_of::<bool>();
        assert!(meta.parse_text("true").is_some());
        assert!(meta.parse_text("yes").is_none());

        let opaque = TypeMeta::of::<bool>();
        assert!(opaque.parse_text("true").is_none());
    }
}
