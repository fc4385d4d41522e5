//! Declarative impls for host types.
//!
//! Without derive machinery the registration boilerplate for a struct is
//! sizeable; [`reflect_struct!`](crate::reflect_struct) writes it from the
//! struct definition itself, and
//! [`impl_reflect_scalar!`](crate::impl_reflect_scalar) covers leaf types that
//! already speak `Display` / `FromStr`.

/// Defines a struct and implements the full reflection surface for it:
/// [`TypePath`], [`Typed`], [`Reflect`], [`Struct`] and [`GetTypeMeta`].
///
/// The struct must also implement [`Default`] (derive it alongside the other
/// attributes); the read path constructs defaults before filling fields in.
/// The wire name is the struct's full module path, and every field type must
/// itself implement [`GetTypeMeta`].
///
/// # Example
///
/// ```
/// use relic_reflect::registry::TypeRegistry;
///
/// relic_reflect::reflect_struct! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Station {
///         pub label: String,
///         pub altitude: f64,
///     }
/// }
///
/// let mut registry = TypeRegistry::empty();
/// registry.register::<Station>();
/// ```
///
/// [`TypePath`]: crate::info::TypePath
/// [`Typed`]: crate::info::Typed
/// [`Reflect`]: crate::Reflect
/// [`Struct`]: crate::ops::Struct
/// [`GetTypeMeta`]: crate::registry::GetTypeMeta
#[macro_export]
macro_rules! reflect_struct {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$field_attr:meta])* $field_vis:vis $field:ident : $field_ty:ty ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        $vis struct $name {
            $( $(#[$field_attr])* $field_vis $field : $field_ty, )*
        }

        impl $crate::info::TypePath for $name {
            fn type_path() -> &'static str {
                ::core::concat!(::core::module_path!(), "::", ::core::stringify!($name))
            }
        }

        impl $crate::info::Typed for $name {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static CELL: $crate::cell::NonGenericTypeInfoCell =
                    $crate::cell::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    $crate::info::TypeInfo::Struct($crate::info::StructInfo::new::<$name>(
                        ::std::vec![
                            $( $crate::info::NamedField::new::<$field_ty>(
                                ::core::stringify!($field),
                            ), )*
                        ],
                    ))
                })
            }
        }

        impl $crate::Reflect for $name {
            fn reflect_type_path(&self) -> &'static str {
                <Self as $crate::info::TypePath>::type_path()
            }

            fn reflect_type_info(&self) -> &'static $crate::info::TypeInfo {
                <Self as $crate::info::Typed>::type_info()
            }

            fn set(
                &mut self,
                value: ::std::boxed::Box<dyn $crate::Reflect>,
            ) -> ::core::result::Result<(), ::std::boxed::Box<dyn $crate::Reflect>> {
                *self = value.take::<Self>()?;
                ::core::result::Result::Ok(())
            }

            fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
                $crate::ReflectRef::Struct(self)
            }

            fn reflect_mut(&mut self) -> $crate::ReflectMut<'_> {
                $crate::ReflectMut::Struct(self)
            }
        }

        impl $crate::ops::Struct for $name {
            fn field(&self, name: &str) -> ::core::option::Option<&dyn $crate::Reflect> {
                match name {
                    $( ::core::stringify!($field) => {
                        ::core::option::Option::Some(&self.$field as &dyn $crate::Reflect)
                    } )*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn $crate::Reflect> {
                match name {
                    $( ::core::stringify!($field) => {
                        ::core::option::Option::Some(&mut self.$field as &mut dyn $crate::Reflect)
                    } )*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_at(&self, index: usize) -> ::core::option::Option<&dyn $crate::Reflect> {
                let name = <Self as $crate::ops::Struct>::name_at(self, index)?;
                <Self as $crate::ops::Struct>::field(self, name)
            }

            fn name_at(&self, index: usize) -> ::core::option::Option<&'static str> {
                const NAMES: &[&str] = &[ $( ::core::stringify!($field) ),* ];
                NAMES.get(index).copied()
            }

            fn field_len(&self) -> usize {
                const NAMES: &[&str] = &[ $( ::core::stringify!($field) ),* ];
                NAMES.len()
            }
        }

        impl $crate::registry::GetTypeMeta for $name {
            fn get_type_meta() -> $crate::registry::TypeMeta {
                $crate::registry::TypeMeta::of::<Self>()
            }

            fn register_dependencies(registry: &mut $crate::registry::TypeRegistry) {
                $( registry.register::<$field_ty>(); )*
            }
        }
    };
}

/// Implements the reflection surface for a leaf type with a text form.
///
/// The type must implement `Display`, `FromStr`, `Default`, `Send`, `Sync`
/// and `'static`. The given literal becomes its wire name.
///
/// # Example
///
/// ```
/// use core::fmt;
/// use core::str::FromStr;
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// enum Verdict {
///     #[default]
///     Pass,
///     Fail,
/// }
///
/// impl fmt::Display for Verdict {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str(match self {
///             Verdict::Pass => "PASS",
///             Verdict::Fail => "FAIL",
///         })
///     }
/// }
///
/// impl FromStr for Verdict {
///     type Err = ();
///
///     fn from_str(s: &str) -> Result<Self, ()> {
///         match s {
///             "PASS" => Ok(Verdict::Pass),
///             "FAIL" => Ok(Verdict::Fail),
///             _ => Err(()),
///         }
///     }
/// }
///
/// relic_reflect::impl_reflect_scalar!(Verdict => "verdict");
/// ```
#[macro_export]
macro_rules! impl_reflect_scalar {
    ($ty:ty => $path:literal) => {
        impl $crate::info::TypePath for $ty {
            fn type_path() -> &'static str {
                $path
            }
        }

        impl $crate::info::Typed for $ty {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static CELL: $crate::cell::NonGenericTypeInfoCell =
                    $crate::cell::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    $crate::info::TypeInfo::Scalar($crate::info::ScalarInfo::new::<$ty>())
                })
            }
        }

        impl $crate::Reflect for $ty {
            fn reflect_type_path(&self) -> &'static str {
                <Self as $crate::info::TypePath>::type_path()
            }

            fn reflect_type_info(&self) -> &'static $crate::info::TypeInfo {
                <Self as $crate::info::Typed>::type_info()
            }

            fn set(
                &mut self,
                value: ::std::boxed::Box<dyn $crate::Reflect>,
            ) -> ::core::result::Result<(), ::std::boxed::Box<dyn $crate::Reflect>> {
                *self = value.take::<Self>()?;
                ::core::result::Result::Ok(())
            }

            fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
                $crate::ReflectRef::Scalar(self)
            }

            fn reflect_mut(&mut self) -> $crate::ReflectMut<'_> {
                $crate::ReflectMut::Scalar(self)
            }
        }

        impl $crate::ops::Scalar for $ty {
            fn to_text(&self) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Owned(::std::string::ToString::to_string(self))
            }
        }

        impl $crate::registry::GetTypeMeta for $ty {
            fn get_type_meta() -> $crate::registry::TypeMeta {
                $crate::registry::TypeMeta::scalar_of::<$ty>()
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::Reflect;
    use crate::ops::Struct;

    crate::reflect_struct! {
        #[derive(Debug, Default, PartialEq)]
        struct Probe {
            label: String,
            depth: u32,
        }
    }

    #[test]
    fn fields_are_reachable_by_name_and_index() {
        let probe = Probe { label: "deep".into(), depth: 11 };
        assert_eq!(probe.field_len(), 2);
        assert_eq!(probe.name_at(0), Some("label"));
        assert_eq!(probe.name_at(2), None);
        assert_eq!(probe.field("depth").and_then(|f| f.downcast_ref::<u32>()), Some(&11));
        assert!(probe.field("width").is_none());
        assert_eq!(
            probe.field_at(0).and_then(|f| f.downcast_ref::<String>()).map(String::as_str),
            Some("deep"),
        );
    }

    #[test]
    fn field_mut_writes_through() {
        let mut probe = Probe::default();
        let slot = probe.field_mut("depth").unwrap();
        slot.set(Box::new(42_u32)).unwrap();
        assert_eq!(probe.depth, 42);
    }

    #[test]
    fn type_path_includes_the_module() {
        use crate::info::TypePath;
        assert_eq!(Probe::type_path(), "relic_reflect::macros::tests::Probe");
    }
}
