//! Lazy storage cells backing `Typed::type_info`.
//!
//! A [`TypeInfo`] describes an immutable shape, so it is built once and then
//! handed out as a `&'static` reference for the rest of the process lifetime.

use core::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// NonGenericTypeInfoCell

/// Lazily initialized [`TypeInfo`] storage for a non-generic type.
///
/// Intended to live in a `static` inside `Typed::type_info`:
///
/// ```
/// use relic_reflect::cell::NonGenericTypeInfoCell;
/// use relic_reflect::info::{ScalarInfo, TypeInfo, TypePath, Typed};
///
/// struct Mass(f64);
///
/// impl TypePath for Mass {
///     fn type_path() -> &'static str {
///         "mass"
///     }
/// }
///
/// impl Typed for Mass {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::Scalar(ScalarInfo::new::<Self>()))
///     }
/// }
/// ```
pub struct NonGenericTypeInfoCell(OnceLock<TypeInfo>);

impl NonGenericTypeInfoCell {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored [`TypeInfo`], initializing it with `f` on first use.
    pub fn get_or_init(&'static self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        self.0.get_or_init(f)
    }
}

// -----------------------------------------------------------------------------
// GenericTypeInfoCell

/// Lazily initialized [`TypeInfo`] storage for a generic type.
///
/// A `static` inside a generic function is shared by every instantiation, so
/// this cell keys the stored infos by [`TypeId`]. Entries are leaked; a type
/// shape never changes once observed.
pub struct GenericTypeInfoCell(RwLock<BTreeMap<TypeId, &'static TypeInfo>>);

impl GenericTypeInfoCell {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self(RwLock::new(BTreeMap::new()))
    }

    /// Returns the [`TypeInfo`] for `T`, initializing it with `f` on first use.
    pub fn get_or_insert<T: Any>(&self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        let id = TypeId::of::<T>();
        {
            let map = self.0.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(&info) = map.get(&id) {
                return info;
            }
        }
        let mut map = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *map.entry(id).or_insert_with(|| Box::leak(Box::new(f())))
    }
}
