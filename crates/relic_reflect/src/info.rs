//! Compile-time shape descriptors.
//!
//! Every persistable type exposes a [`TypeInfo`] describing what kind of value
//! it is and, for containers and structs, which types it reaches. The codec
//! drives all of its decisions off these descriptors rather than off the
//! values themselves.

use core::any::TypeId;

// -----------------------------------------------------------------------------
// TypePath

/// Stable wire name of a type.
///
/// For structs this is the full module path (`my_app::jobs::Build`); generic
/// containers use an erased family name instead (`list`, `immutable-map`),
/// mirroring how the persisted text never spells out item types on container
/// elements. Distinct instantiations of a generic container therefore share
/// one wire name and are told apart by the declared slot that holds them.
pub trait TypePath: 'static {
    /// Returns the wire name.
    fn type_path() -> &'static str;
}

/// A type with a registered shape descriptor.
pub trait Typed: TypePath {
    /// Returns the [`TypeInfo`] for this type.
    fn type_info() -> &'static TypeInfo;
}

// -----------------------------------------------------------------------------
// Type

/// The identity half of a descriptor: `TypeId` plus wire name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Type {
    id: TypeId,
    path: &'static str,
}

impl Type {
    /// Creates the [`Type`] of `T`.
    pub fn of<T: TypePath>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: T::type_path(),
        }
    }

    /// Returns the `TypeId`.
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the wire name.
    pub const fn path(&self) -> &'static str {
        self.path
    }
}

// -----------------------------------------------------------------------------
// CollectionFamily

/// Marker distinguishing container families with specialized wire formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionFamily {
    /// Ordinary growable containers (`Vec`, `HashMap`).
    Plain,
    /// The immutable family in [`collections`](crate::collections).
    Immutable,
    /// Concurrent maps (`dashmap::DashMap`).
    Concurrent,
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Shape descriptor for a persistable type.
#[derive(Debug)]
pub enum TypeInfo {
    /// A struct with named fields.
    Struct(StructInfo),
    /// An ordered sequence.
    List(ListInfo),
    /// A key-value container.
    Map(MapInfo),
    /// An optional slot (`Option<T>`).
    Nullable(NullableInfo),
    /// A leaf encoded as text.
    Scalar(ScalarInfo),
    /// A type-erased slot (`Box<dyn Reflect>`).
    Dynamic(DynamicInfo),
}

impl TypeInfo {
    /// Returns the [`Type`] identity.
    pub const fn ty(&self) -> &Type {
        match self {
            Self::Struct(info) => &info.ty,
            Self::List(info) => &info.ty,
            Self::Map(info) => &info.ty,
            Self::Nullable(info) => &info.ty,
            Self::Scalar(info) => &info.ty,
            Self::Dynamic(info) => &info.ty,
        }
    }

    /// Returns the `TypeId`.
    pub const fn ty_id(&self) -> TypeId {
        self.ty().id()
    }

    /// Returns the wire name.
    pub const fn type_path(&self) -> &'static str {
        self.ty().path()
    }

    /// Returns the [`StructInfo`] if this is a struct.
    pub const fn as_struct(&self) -> Option<&StructInfo> {
        match self {
            Self::Struct(info) => Some(info),
            _ => None,
        }
    }

    /// Returns the [`ListInfo`] if this is a list.
    pub const fn as_list(&self) -> Option<&ListInfo> {
        match self {
            Self::List(info) => Some(info),
            _ => None,
        }
    }

    /// Returns the [`MapInfo`] if this is a map.
    pub const fn as_map(&self) -> Option<&MapInfo> {
        match self {
            Self::Map(info) => Some(info),
            _ => None,
        }
    }

    /// Returns the [`NullableInfo`] if this is an optional slot.
    pub const fn as_nullable(&self) -> Option<&NullableInfo> {
        match self {
            Self::Nullable(info) => Some(info),
            _ => None,
        }
    }

    /// Returns `true` for a type-erased slot.
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    /// Returns the container family for lists and maps.
    pub const fn family(&self) -> Option<CollectionFamily> {
        match self {
            Self::List(info) => Some(info.family),
            Self::Map(info) => Some(info.family),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// NamedField

/// Information for a named struct field.
#[derive(Clone, Debug)]
pub struct NamedField {
    ty_id: TypeId,
    name: &'static str,
    // `TypeInfo` is created on first access; using a function pointer delays it.
    type_info: fn() -> &'static TypeInfo,
}

impl NamedField {
    /// Creates a new [`NamedField`] for the given field `name` and type `T`.
    pub const fn new<T: Typed>(name: &'static str) -> Self {
        Self {
            name,
            type_info: T::type_info,
            ty_id: TypeId::of::<T>(),
        }
    }

    /// Returns the `TypeId` of the field value.
    pub const fn ty_id(&self) -> TypeId {
        self.ty_id
    }

    /// Returns the field name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the field value's [`TypeInfo`].
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    /// Check if the given type matches this field's value type.
    pub fn type_is<T: TypePath>(&self) -> bool {
        self.ty_id == TypeId::of::<T>()
    }
}

// -----------------------------------------------------------------------------
// StructInfo

/// Shape of a struct with named fields, in declaration order.
#[derive(Debug)]
pub struct StructInfo {
    ty: Type,
    fields: Box<[NamedField]>,
}

impl StructInfo {
    /// Creates a new [`StructInfo`] for `T` with the given fields.
    pub fn new<T: TypePath>(fields: Vec<NamedField>) -> Self {
        Self {
            ty: Type::of::<T>(),
            fields: fields.into_boxed_slice(),
        }
    }

    /// Returns the field named `name`, if any.
    pub fn field(&self, name: &str) -> Option<&NamedField> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns the field at `index`.
    pub fn field_at(&self, index: usize) -> Option<&NamedField> {
        self.fields.get(index)
    }

    /// Returns the number of fields.
    pub fn field_len(&self) -> usize {
        self.fields.len()
    }

    /// An iterator over the fields in declaration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &NamedField> {
        self.fields.iter()
    }
}

// -----------------------------------------------------------------------------
// ListInfo

/// Shape of an ordered sequence.
#[derive(Debug)]
pub struct ListInfo {
    ty: Type,
    family: CollectionFamily,
    item_id: TypeId,
    item_info: fn() -> &'static TypeInfo,
}

impl ListInfo {
    /// Creates a new [`ListInfo`] for `T` with item type `I`.
    pub fn new<T: TypePath, I: Typed>(family: CollectionFamily) -> Self {
        Self {
            ty: Type::of::<T>(),
            family,
            item_id: TypeId::of::<I>(),
            item_info: I::type_info,
        }
    }

    /// Returns the container family.
    pub const fn family(&self) -> CollectionFamily {
        self.family
    }

    /// Returns the `TypeId` of the items.
    pub const fn item_id(&self) -> TypeId {
        self.item_id
    }

    /// Returns the items' [`TypeInfo`].
    pub fn item_info(&self) -> &'static TypeInfo {
        (self.item_info)()
    }
}

// -----------------------------------------------------------------------------
// MapInfo

/// Shape of a key-value container.
#[derive(Debug)]
pub struct MapInfo {
    ty: Type,
    family: CollectionFamily,
    key_id: TypeId,
    key_info: fn() -> &'static TypeInfo,
    value_id: TypeId,
    value_info: fn() -> &'static TypeInfo,
}

impl MapInfo {
    /// Creates a new [`MapInfo`] for `T` with key type `K` and value type `V`.
    pub fn new<T: TypePath, K: Typed, V: Typed>(family: CollectionFamily) -> Self {
        Self {
            ty: Type::of::<T>(),
            family,
            key_id: TypeId::of::<K>(),
            key_info: K::type_info,
            value_id: TypeId::of::<V>(),
            value_info: V::type_info,
        }
    }

    /// Returns the container family.
    pub const fn family(&self) -> CollectionFamily {
        self.family
    }

    /// Returns the `TypeId` of the keys.
    pub const fn key_id(&self) -> TypeId {
        self.key_id
    }

    /// Returns the keys' [`TypeInfo`].
    pub fn key_info(&self) -> &'static TypeInfo {
        (self.key_info)()
    }

    /// Returns the `TypeId` of the values.
    pub const fn value_id(&self) -> TypeId {
        self.value_id
    }

    /// Returns the values' [`TypeInfo`].
    pub fn value_info(&self) -> &'static TypeInfo {
        (self.value_info)()
    }
}

// -----------------------------------------------------------------------------
// NullableInfo

/// Shape of an optional slot.
#[derive(Debug)]
pub struct NullableInfo {
    ty: Type,
    value_id: TypeId,
    value_info: fn() -> &'static TypeInfo,
}

impl NullableInfo {
    /// Creates a new [`NullableInfo`] for `T` with contained type `V`.
    pub fn new<T: TypePath, V: Typed>() -> Self {
        Self {
            ty: Type::of::<T>(),
            value_id: TypeId::of::<V>(),
            value_info: V::type_info,
        }
    }

    /// Returns the `TypeId` of the contained value.
    pub const fn value_id(&self) -> TypeId {
        self.value_id
    }

    /// Returns the contained value's [`TypeInfo`].
    pub fn value_info(&self) -> &'static TypeInfo {
        (self.value_info)()
    }
}

// -----------------------------------------------------------------------------
// ScalarInfo

/// Shape of a leaf value encoded as text.
#[derive(Debug)]
pub struct ScalarInfo {
    ty: Type,
}

impl ScalarInfo {
    /// Creates a new [`ScalarInfo`] for `T`.
    pub fn new<T: TypePath>() -> Self {
        Self { ty: Type::of::<T>() }
    }
}

// -----------------------------------------------------------------------------
// DynamicInfo

/// Shape of a type-erased slot; the runtime value supplies the concrete type.
#[derive(Debug)]
pub struct DynamicInfo {
    ty: Type,
}

impl DynamicInfo {
    /// Creates a new [`DynamicInfo`] for `T`.
    pub fn new<T: TypePath>() -> Self {
        Self { ty: Type::of::<T>() }
    }
}
