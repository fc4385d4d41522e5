use core::any::TypeId;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use relic_reflect::info::{TypeInfo, TypePath};
use relic_reflect::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use relic_reflect::{Reflect, ReflectMut, ReflectRef};

use crate::convert::{
    priority, ConcurrentMapConverter, Converter, ConverterBinding, ImmutableMapConverter,
    ImmutableSeqConverter, ListConverter, MapConverter, ReflectiveConverter, ScalarConverter,
};
use crate::error::{MalformedInput, MarshalError, UnmarshalError};
use crate::mangle::{mangle, unmangle};
use crate::security::screen_name;
use crate::xml::{self, Element};

/// Attribute naming the concrete type of a dynamic slot's content.
pub(crate) const CLASS_ATTRIBUTE: &str = "class";

/// Reserved element marking an absent optional item. Not a type name.
pub(crate) const NULL_ELEMENT: &str = "null";

// -----------------------------------------------------------------------------
// XmlCodec

/// The codec engine: registered types, aliases and converter bindings behind
/// a marshal/unmarshal surface.
///
/// Registration is allowed between uses at any time. Each call works on a
/// copy-on-write snapshot of the configuration, so a concurrent registration
/// never tears a running call.
///
/// # Example
///
/// ```
/// use relic_codec::XmlCodec;
///
/// relic_reflect::reflect_struct! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Build {
///         pub number: u32,
///         pub display_name: String,
///     }
/// }
///
/// let codec = XmlCodec::new();
/// codec.register_type::<Build>();
///
/// let build = Build { number: 42, display_name: "nightly".into() };
/// let text = codec.marshal(&build).unwrap();
/// let restored: Build = codec.unmarshal_as(&text).unwrap();
/// assert_eq!(restored, build);
/// ```
pub struct XmlCodec {
    config: RwLock<Arc<CodecConfig>>,
}

#[derive(Clone)]
pub(crate) struct CodecConfig {
    pub(crate) types: TypeRegistry,
    pub(crate) converters: Vec<ConverterBinding>,
    pub(crate) aliases: HashMap<String, TypeId>,
}

impl CodecConfig {
    /// Bindings stay sorted by descending priority; within a tier the most
    /// recent registration sits first.
    fn insert_binding(&mut self, binding: ConverterBinding) {
        let at = self
            .converters
            .iter()
            .position(|existing| existing.priority <= binding.priority)
            .unwrap_or(self.converters.len());
        self.converters.insert(at, binding);
    }

    pub(crate) fn lookup_converter(&self, info: &TypeInfo) -> Option<&dyn Converter> {
        self.converters
            .iter()
            .find(|binding| binding.converter.can_convert(info))
            .map(|binding| &*binding.converter)
    }
}

impl XmlCodec {
    /// Creates a codec with the built-in converters and the primitive scalars
    /// registered.
    pub fn new() -> Self {
        let mut types = TypeRegistry::new();
        types.register::<Box<dyn Reflect>>();

        let mut config = CodecConfig {
            types,
            converters: Vec::new(),
            aliases: HashMap::new(),
        };
        config.insert_binding(ConverterBinding::new(priority::FALLBACK, Arc::new(ReflectiveConverter)));
        config.insert_binding(ConverterBinding::new(priority::NORMAL, Arc::new(ScalarConverter)));
        config.insert_binding(ConverterBinding::new(priority::NORMAL, Arc::new(ListConverter)));
        config.insert_binding(ConverterBinding::new(priority::NORMAL, Arc::new(MapConverter)));
        config.insert_binding(ConverterBinding::new(priority::NORMAL, Arc::new(ImmutableSeqConverter)));
        config.insert_binding(ConverterBinding::new(priority::NORMAL, Arc::new(ImmutableMapConverter)));
        config.insert_binding(ConverterBinding::new(priority::NORMAL, Arc::new(ConcurrentMapConverter)));

        Self {
            config: RwLock::new(Arc::new(config)),
        }
    }

    fn snapshot(&self) -> Arc<CodecConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, mutate: impl FnOnce(&mut CodecConfig)) {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = (**guard).clone();
        mutate(&mut next);
        *guard = Arc::new(next);
    }

    /// Registers `T` and everything it depends on.
    pub fn register_type<T: GetTypeMeta>(&self) {
        self.update(|config| config.types.register::<T>());
    }

    /// Registers a converter at the given [`priority`] tier.
    ///
    /// Within a tier, later registrations are consulted first, so registering
    /// at [`priority::NORMAL`] overrides any built-in converter for the
    /// shapes the new converter accepts.
    pub fn register_converter(&self, tier: i32, converter: Arc<dyn Converter>) {
        self.update(|config| config.insert_binding(ConverterBinding::new(tier, converter)));
    }

    /// Maps a legacy wire name onto `T`, registering `T` if needed.
    ///
    /// Aliases are consulted only when resolving names found in input; the
    /// write path always emits the current wire name, so one rewrite migrates
    /// a document off its legacy names. Idempotent; the last registration for
    /// a name wins.
    pub fn register_alias<T: GetTypeMeta>(&self, legacy: &str) {
        let legacy = legacy.to_owned();
        self.update(|config| {
            config.types.register::<T>();
            config.aliases.insert(legacy, TypeId::of::<T>());
        });
    }

    /// Writes `root` as a complete document.
    ///
    /// Returns either the whole document or a fault, never partial output.
    pub fn marshal(&self, root: &dyn Reflect) -> Result<String, MarshalError> {
        let config = self.snapshot();
        let ctx = MarshalContext { config: &config };
        let element = ctx.write_item(root)?;
        Ok(xml::render(&element))
    }

    /// Reads a document back into a value.
    ///
    /// On any fault no partially constructed value escapes.
    pub fn unmarshal(&self, text: &str) -> Result<Box<dyn Reflect>, UnmarshalError> {
        let config = self.snapshot();
        let root = xml::parse(text)?;
        let ctx = UnmarshalContext { config: &config };
        let meta = ctx.resolve_element_name(root.name())?;
        ctx.read_value(&root, meta)
    }

    /// Reads a document from a byte stream.
    pub fn unmarshal_from(&self, mut reader: impl io::Read) -> Result<Box<dyn Reflect>, UnmarshalError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(MalformedInput::Io)?;
        self.unmarshal(&text)
    }

    /// Reads a document whose root is expected to hold a `T`.
    pub fn unmarshal_as<T: Reflect + TypePath>(&self, text: &str) -> Result<T, UnmarshalError> {
        let value = self.unmarshal(text)?;
        let found = (&*value).reflect_type_path();
        value.take::<T>().map_err(|_| {
            MalformedInput::UnexpectedRoot {
                expected: T::type_path(),
                found,
            }
            .into()
        })
    }
}

// -----------------------------------------------------------------------------
// Peeling

/// What remains of a value once optional and dynamic wrappers are unwrapped.
enum Peeled<'a> {
    /// Nothing: an absent optional somewhere in the wrapper chain.
    Null,
    /// The innermost concrete value; `dynamic` records whether a dynamic
    /// wrapper was crossed, in which case the text must name the type.
    Value { value: &'a dyn Reflect, dynamic: bool },
}

fn peel(value: &dyn Reflect) -> Peeled<'_> {
    match value.reflect_ref() {
        ReflectRef::Nullable(slot) => match slot.contained() {
            None => Peeled::Null,
            Some(inner) => peel(inner),
        },
        ReflectRef::Dynamic(inner) => match peel(inner) {
            Peeled::Null => Peeled::Null,
            Peeled::Value { value, .. } => Peeled::Value { value, dynamic: true },
        },
        _ => Peeled::Value { value, dynamic: false },
    }
}

// -----------------------------------------------------------------------------
// MarshalContext

/// Write-path callbacks handed to converters.
///
/// All recursion runs through here, so every nested value re-consults the
/// converter bindings.
pub struct MarshalContext<'a> {
    pub(crate) config: &'a CodecConfig,
}

impl MarshalContext<'_> {
    /// Writes a concrete value into an element named `name`.
    pub fn write_value(
        &self,
        value: &dyn Reflect,
        name: &str,
        with_class: bool,
    ) -> Result<Element, MarshalError> {
        let info = value.reflect_type_info();
        let Some(converter) = self.config.lookup_converter(info) else {
            return Err(MarshalError::NoConverter {
                type_path: value.reflect_type_path(),
            });
        };
        let mut element = Element::new(name);
        if with_class {
            element.set_attribute(CLASS_ATTRIBUTE, value.reflect_type_path());
        }
        converter.marshal(value, &mut element, self)?;
        Ok(element)
    }

    /// Writes a struct field. Returns `None` for absent optionals, which are
    /// omitted and restored as defaults on read. A `class` attribute is
    /// attached exactly when the declared field is dynamic.
    pub fn write_field(
        &self,
        field_name: &str,
        value: &dyn Reflect,
    ) -> Result<Option<Element>, MarshalError> {
        match peel(value) {
            Peeled::Null => Ok(None),
            Peeled::Value { value, dynamic } => self
                .write_value(value, &mangle(field_name), dynamic)
                .map(Some),
        }
    }

    /// Writes a list item, map key or map value. The element is named by the
    /// runtime type; absent optionals become the reserved `<null/>` element.
    pub fn write_item(&self, value: &dyn Reflect) -> Result<Element, MarshalError> {
        match peel(value) {
            Peeled::Null => Ok(Element::new(NULL_ELEMENT)),
            Peeled::Value { value, .. } => {
                self.write_value(value, &mangle(value.reflect_type_path()), false)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// UnmarshalContext

/// Read-path callbacks handed to converters.
pub struct UnmarshalContext<'a> {
    pub(crate) config: &'a CodecConfig,
}

impl<'a> UnmarshalContext<'a> {
    /// Returns the registered types.
    pub fn types(&self) -> &'a TypeRegistry {
        &self.config.types
    }

    /// Resolves a name found verbatim in input (a `class` attribute value).
    ///
    /// Screening happens first, then aliases, then registered wire names.
    pub fn resolve_name(&self, name: &str) -> Result<&'a TypeMeta, UnmarshalError> {
        screen_name(name)?;
        if let Some(id) = self.config.aliases.get(name) {
            if let Some(meta) = self.config.types.get(*id) {
                return Ok(meta);
            }
        }
        self.config.types.get_with_path(name).ok_or_else(|| {
            MalformedInput::UnknownType {
                name: name.to_owned(),
            }
            .into()
        })
    }

    /// Resolves an element name: screening, then aliases against the raw
    /// name, then registered wire names after unmangling.
    pub fn resolve_element_name(&self, raw: &str) -> Result<&'a TypeMeta, UnmarshalError> {
        screen_name(raw)?;
        if let Some(id) = self.config.aliases.get(raw) {
            if let Some(meta) = self.config.types.get(*id) {
                return Ok(meta);
            }
        }
        let path = unmangle(raw);
        self.config.types.get_with_path(&path).ok_or_else(|| {
            MalformedInput::UnknownType {
                name: raw.to_owned(),
            }
            .into()
        })
    }

    /// Reads `element` as a value of the declared type.
    ///
    /// Optional slots read their contained value and wrap it; dynamic slots
    /// require a `class` attribute; everywhere else a `class` attribute
    /// overrides the declared type, covering slots whose document predates a
    /// field type change.
    pub fn read_value(
        &self,
        element: &Element,
        declared: &'a TypeMeta,
    ) -> Result<Box<dyn Reflect>, UnmarshalError> {
        match declared.type_info() {
            TypeInfo::Nullable(shape) => {
                if element.name() == NULL_ELEMENT {
                    return Ok(declared.default_value());
                }
                let Some(inner_meta) = self.config.types.get(shape.value_id()) else {
                    return Err(MalformedInput::UnknownType {
                        name: shape.value_info().type_path().to_owned(),
                    }
                    .into());
                };
                let inner = self.read_value(element, inner_meta)?;
                let mut wrapped = declared.default_value();
                let filled = match (&mut *wrapped).reflect_mut() {
                    ReflectMut::Nullable(slot) => slot.set_contained(Some(inner)).is_ok(),
                    _ => false,
                };
                if !filled {
                    log::warn!(
                        "value read for `{}` does not fit its optional slot",
                        declared.type_path(),
                    );
                }
                Ok(wrapped)
            }
            TypeInfo::Dynamic(_) => match element.attribute(CLASS_ATTRIBUTE) {
                Some(class_name) => {
                    let named = self.resolve_name(class_name)?;
                    if named.type_info().is_dynamic() {
                        log::warn!(
                            "`{class_name}` does not name a concrete type; keeping the slot default",
                        );
                        return Ok(declared.default_value());
                    }
                    let inner = self.read_value(element, named)?;
                    Ok(Box::new(inner))
                }
                None => {
                    log::warn!(
                        "element `{}` fills a dynamic slot but names no type; keeping the slot default",
                        element.name(),
                    );
                    Ok(declared.default_value())
                }
            },
            _ => {
                let target = match element.attribute(CLASS_ATTRIBUTE) {
                    Some(class_name) => self.resolve_name(class_name)?,
                    None => declared,
                };
                let Some(converter) = self.config.lookup_converter(target.type_info()) else {
                    return Err(MalformedInput::NoConverter {
                        type_path: target.type_path(),
                    }
                    .into());
                };
                converter.unmarshal(element, target, self)
            }
        }
    }

    /// Reads a list item, map key or map value, where the element name (not
    /// the slot) may carry the runtime type.
    pub fn read_slot(
        &self,
        element: &Element,
        declared: &'a TypeMeta,
    ) -> Result<Box<dyn Reflect>, UnmarshalError> {
        if element.name() == NULL_ELEMENT {
            return Ok(declared.default_value());
        }
        if declared.type_info().is_dynamic() && element.attribute(CLASS_ATTRIBUTE).is_none() {
            let named = self.resolve_element_name(element.name())?;
            let inner = self.read_value(element, named)?;
            return Ok(Box::new(inner));
        }
        self.read_value(element, declared)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::fmt;
    use core::str::FromStr;

    use dashmap::DashMap;
    use pretty_assertions::assert_eq;
    use relic_reflect::collections::{ImmutableForm, ImmutableList, ImmutableMap, ImmutableSet};
    use relic_reflect::{impl_reflect_scalar, reflect_struct};

    use super::*;

    reflect_struct! {
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct Point {
            pub x: i32,
            pub y: i32,
        }
    }

    #[test]
    fn writes_declared_fields_in_order() {
        let codec = XmlCodec::new();
        codec.register_type::<Point>();

        let text = codec.marshal(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(
            text,
            "<relic__codec.codec.tests.Point>\n  <x>1</x>\n  <y>2</y>\n</relic__codec.codec.tests.Point>",
        );
        assert_eq!(codec.unmarshal_as::<Point>(&text).unwrap(), Point { x: 1, y: 2 });
    }

    #[test]
    fn scalar_roots_round_trip() {
        let codec = XmlCodec::new();
        let text = codec.marshal(&17_u32).unwrap();
        assert_eq!(text, "<u32>17</u32>");
        assert_eq!(codec.unmarshal_as::<u32>(&text).unwrap(), 17);
    }

    // -------------------------------------------------------------------------
    // Duplication, not reference compression

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    enum BuildResult {
        #[default]
        Success,
        Failure,
    }

    impl fmt::Display for BuildResult {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                BuildResult::Success => "SUCCESS",
                BuildResult::Failure => "FAILURE",
            })
        }
    }

    impl FromStr for BuildResult {
        type Err = ();

        fn from_str(s: &str) -> Result<Self, ()> {
            match s {
                "SUCCESS" => Ok(BuildResult::Success),
                "FAILURE" => Ok(BuildResult::Failure),
                _ => Err(()),
            }
        }
    }

    impl_reflect_scalar!(BuildResult => "build-result");

    reflect_struct! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Outcome {
            pub first: BuildResult,
            pub second: BuildResult,
        }
    }

    #[test]
    fn values_reached_twice_are_written_twice() {
        let codec = XmlCodec::new();
        codec.register_type::<Outcome>();

        let outcome = Outcome {
            first: BuildResult::Failure,
            second: BuildResult::Failure,
        };
        let text = codec.marshal(&outcome).unwrap();
        assert_eq!(text.matches("FAILURE").count(), 2);
        assert_eq!(codec.unmarshal_as::<Outcome>(&text).unwrap(), outcome);
    }

    // -------------------------------------------------------------------------
    // Name mangling

    reflect_struct! {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Default, PartialEq)]
        pub struct __Foo_Bar {
            pub under_1: String,
            pub _leading: u32,
        }
    }

    #[test]
    fn hostile_identifiers_survive_the_wire() {
        let codec = XmlCodec::new();
        codec.register_type::<__Foo_Bar>();

        let value = __Foo_Bar {
            under_1: "deep".into(),
            _leading: 3,
        };
        let text = codec.marshal(&value).unwrap();
        assert!(text.starts_with("<relic__codec.codec.tests.____Foo__Bar>"));
        assert!(text.contains("<under__1>deep</under__1>"));
        assert!(text.contains("<__leading>3</__leading>"));
        assert_eq!(codec.unmarshal_as::<__Foo_Bar>(&text).unwrap(), value);
    }

    // -------------------------------------------------------------------------
    // Tolerant reads

    reflect_struct! {
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct FaultRecord {
            pub detail_message: String,
            pub stack_trace: Vec<String>,
        }
    }

    reflect_struct! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Baz {
            pub my_failure: Option<FaultRecord>,
        }
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let codec = XmlCodec::new();
        codec.register_type::<Baz>();

        let document = "<relic__codec.codec.tests.Baz>\n  <my__failure>\n    \
                        <missing__field>true</missing__field>\n    \
                        <detail__message>hoho</detail__message>\n    <stack__trace>\n      \
                        <string>jobs::poll::tick</string>\n    </stack__trace>\n  \
                        </my__failure>\n</relic__codec.codec.tests.Baz>";
        let baz = codec.unmarshal_as::<Baz>(document).unwrap();
        let failure = baz.my_failure.expect("the failure must be restored");
        assert_eq!(failure.detail_message, "hoho");
        assert_eq!(failure.stack_trace, vec!["jobs::poll::tick".to_string()]);
    }

    #[test]
    fn missing_and_unparsable_fields_keep_defaults() {
        let codec = XmlCodec::new();
        codec.register_type::<Point>();

        let sparse = "<relic__codec.codec.tests.Point>\n  <x>5</x>\n</relic__codec.codec.tests.Point>";
        assert_eq!(codec.unmarshal_as::<Point>(sparse).unwrap(), Point { x: 5, y: 0 });

        let garbled = "<relic__codec.codec.tests.Point>\n  <x>abc</x>\n  <y>2</y>\n</relic__codec.codec.tests.Point>";
        assert_eq!(codec.unmarshal_as::<Point>(garbled).unwrap(), Point { x: 0, y: 2 });
    }

    #[test]
    fn none_fields_are_omitted_and_restored() {
        let codec = XmlCodec::new();
        codec.register_type::<Baz>();

        let text = codec.marshal(&Baz { my_failure: None }).unwrap();
        assert!(!text.contains("my__failure"));
        assert_eq!(codec.unmarshal_as::<Baz>(&text).unwrap(), Baz { my_failure: None });
    }

    // -------------------------------------------------------------------------
    // Null item markers

    reflect_struct! {
        #[derive(Debug, Default, PartialEq)]
        pub struct NoteList {
            pub notes: Vec<Option<String>>,
        }
    }

    #[test]
    fn absent_items_write_one_marker_each() {
        let codec = XmlCodec::new();
        codec.register_type::<NoteList>();

        let value = NoteList {
            notes: vec![None, Some("kept".into()), None],
        };
        let text = codec.marshal(&value).unwrap();
        assert_eq!(text.matches("<null/>").count(), 2);
        assert_eq!(codec.unmarshal_as::<NoteList>(&text).unwrap(), value);
    }

    // -------------------------------------------------------------------------
    // Immutable collections

    reflect_struct! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Tags {
            pub by_name: ImmutableMap<String, String>,
        }
    }

    #[test]
    fn immutable_maps_stay_anonymous_and_keep_their_form() {
        let codec = XmlCodec::new();
        codec.register_type::<Tags>();

        for count in 0..3_usize {
            let by_name: ImmutableMap<String, String> =
                (0..count).map(|i| (format!("k{i}"), format!("v{i}"))).collect();
            let expected_form = by_name.form();

            let text = codec.marshal(&Tags { by_name }).unwrap();
            assert!(!text.contains("class"), "{text}");
            assert!(!text.contains("immutable"), "{text}");

            let restored = codec.unmarshal_as::<Tags>(&text).unwrap();
            assert_eq!(restored.by_name.form(), expected_form);
            assert_eq!(restored.by_name.len(), count);
        }
    }

    reflect_struct! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Batches {
            pub ordered: ImmutableList<u32>,
            pub unique: ImmutableSet<String>,
        }
    }

    #[test]
    fn immutable_sequences_round_trip_with_their_form() {
        let codec = XmlCodec::new();
        codec.register_type::<Batches>();

        let value = Batches {
            ordered: [7, 9].into_iter().collect(),
            unique: ["a"].into_iter().map(String::from).collect(),
        };
        let text = codec.marshal(&value).unwrap();
        assert!(!text.contains("immutable"), "{text}");

        let restored = codec.unmarshal_as::<Batches>(&text).unwrap();
        assert_eq!(restored.ordered.form(), ImmutableForm::Packed);
        assert_eq!(restored.unique.form(), ImmutableForm::Singleton);
        assert_eq!(restored, value);
    }

    reflect_struct! {
        #[derive(Default)]
        pub struct Payload {
            pub value: Box<dyn Reflect>,
        }
    }

    #[test]
    fn dynamic_slots_name_their_content() {
        let codec = XmlCodec::new();
        codec.register_type::<Payload>();
        codec.register_type::<ImmutableMap<String, String>>();

        let map: ImmutableMap<String, String> =
            [("abc".to_string(), "def".to_string())].into_iter().collect();
        let payload = Payload { value: Box::new(map) };

        let text = codec.marshal(&payload).unwrap();
        assert!(text.contains("class=\"immutable-map\""), "{text}");

        let restored = codec.unmarshal_as::<Payload>(&text).unwrap();
        let map = (&*restored.value)
            .downcast_ref::<ImmutableMap<String, String>>()
            .expect("the concrete map type must come back");
        assert_eq!(map.form(), ImmutableForm::Singleton);
        assert_eq!(map.get(&"abc".to_string()), Some(&"def".to_string()));
    }

    #[test]
    fn dynamic_slots_name_sequences_too() {
        let codec = XmlCodec::new();
        codec.register_type::<Payload>();
        codec.register_type::<ImmutableList<u32>>();
        codec.register_type::<ImmutableSet<String>>();

        let list: ImmutableList<u32> = [4, 5].into_iter().collect();
        let text = codec.marshal(&Payload { value: Box::new(list) }).unwrap();
        assert!(text.contains("class=\"immutable-list\""), "{text}");

        let restored = codec.unmarshal_as::<Payload>(&text).unwrap();
        let list = (&*restored.value)
            .downcast_ref::<ImmutableList<u32>>()
            .expect("the concrete list type must come back");
        assert_eq!(list.form(), ImmutableForm::Packed);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![4, 5]);

        let set: ImmutableSet<String> = ["only"].into_iter().map(String::from).collect();
        let text = codec.marshal(&Payload { value: Box::new(set) }).unwrap();
        assert!(text.contains("class=\"immutable-set\""), "{text}");

        let restored = codec.unmarshal_as::<Payload>(&text).unwrap();
        let set = (&*restored.value)
            .downcast_ref::<ImmutableSet<String>>()
            .expect("the concrete set type must come back");
        assert_eq!(set.form(), ImmutableForm::Singleton);
        assert!(set.contains(&"only".to_string()));
    }

    // -------------------------------------------------------------------------
    // Concurrent maps

    reflect_struct! {
        #[derive(Default)]
        pub struct Shared {
            pub by_key: DashMap<String, String>,
        }
    }

    #[test]
    fn concurrent_maps_write_entries_only() {
        let codec = XmlCodec::new();
        codec.register_type::<Shared>();

        let value = Shared { by_key: DashMap::new() };
        value.by_key.insert("abc".into(), "def".into());
        value.by_key.insert("ghi".into(), "jkl".into());

        let text = codec.marshal(&value).unwrap();
        assert!(!text.contains("table"), "{text}");
        assert!(!text.contains("capacity"), "{text}");
        assert!(!text.contains("concurrent"), "{text}");
        assert_eq!(text.matches("<entry>").count(), 2);

        let restored = codec.unmarshal_as::<Shared>(&text).unwrap();
        assert_eq!(restored.by_key.len(), 2);
        assert_eq!(restored.by_key.get("abc").as_deref(), Some(&"def".to_string()));
    }

    #[test]
    fn concurrent_maps_read_the_legacy_dump() {
        let codec = XmlCodec::new();
        codec.register_type::<Shared>();

        let document = "<relic__codec.codec.tests.Shared>\n  <by__key>\n    \
                        <capacity>16</capacity>\n    <load__factor>0.75</load__factor>\n    \
                        <table>\n      <entry>\n        <string>abc</string>\n        \
                        <string>def</string>\n      </entry>\n    </table>\n  \
                        </by__key>\n</relic__codec.codec.tests.Shared>";
        let restored = codec.unmarshal_as::<Shared>(document).unwrap();
        assert_eq!(restored.by_key.len(), 1);
        assert_eq!(restored.by_key.get("abc").as_deref(), Some(&"def".to_string()));
    }

    // -------------------------------------------------------------------------
    // Aliases

    #[test]
    fn aliases_resolve_legacy_names_without_reemitting_them() {
        let codec = XmlCodec::new();
        codec.register_alias::<Point>("legacy.Point");

        let legacy = "<legacy.Point>\n  <x>1</x>\n  <y>2</y>\n</legacy.Point>";
        let point = codec.unmarshal_as::<Point>(legacy).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });

        let rewritten = codec.marshal(&point).unwrap();
        assert!(!rewritten.contains("legacy"), "{rewritten}");
        assert_eq!(codec.unmarshal_as::<Point>(&rewritten).unwrap(), point);
    }

    // -------------------------------------------------------------------------
    // Security gate

    #[test]
    fn proxy_shapes_are_refused_at_the_root() {
        let codec = XmlCodec::new();
        let document = "<dynamic-proxy>\n  <interface>relic.jobs.Listener</interface>\n  \
                        <handler class=\"relic.handlers.Invoker\">\n    <action>oops</action>\n  \
                        </handler>\n</dynamic-proxy>";
        let fault = codec.unmarshal(document).unwrap_err();
        assert!(matches!(fault, UnmarshalError::Security(_)), "{fault}");
    }

    #[test]
    fn proxy_shapes_are_refused_in_nested_slots() {
        let codec = XmlCodec::new();
        codec.register_type::<Payload>();

        let document = "<relic__codec.codec.tests.Payload>\n  \
                        <value class=\"dynamic-proxy\">\n    <action>oops</action>\n  </value>\n\
                        </relic__codec.codec.tests.Payload>";
        let fault = codec.unmarshal(document).unwrap_err();
        assert!(matches!(fault, UnmarshalError::Security(_)), "{fault}");
    }

    // -------------------------------------------------------------------------
    // Converter precedence

    reflect_struct! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Coordinate {
            pub x: i32,
            pub y: i32,
        }
    }

    struct CommaPairConverter;

    impl Converter for CommaPairConverter {
        fn can_convert(&self, info: &TypeInfo) -> bool {
            info.ty_id() == TypeId::of::<Coordinate>()
        }

        fn marshal(
            &self,
            value: &dyn Reflect,
            target: &mut Element,
            _ctx: &MarshalContext<'_>,
        ) -> Result<(), MarshalError> {
            if let Some(pair) = value.downcast_ref::<Coordinate>() {
                target.set_text(format!("{},{}", pair.x, pair.y));
            }
            Ok(())
        }

        fn unmarshal(
            &self,
            element: &Element,
            target: &TypeMeta,
            _ctx: &UnmarshalContext<'_>,
        ) -> Result<Box<dyn Reflect>, UnmarshalError> {
            let malformed = || MalformedInput::Scalar {
                type_path: target.type_path(),
                text: element.text().to_owned(),
            };
            let (x, y) = element.text().split_once(',').ok_or_else(malformed)?;
            let x = x.trim().parse().map_err(|_| malformed())?;
            let y = y.trim().parse().map_err(|_| malformed())?;
            Ok(Box::new(Coordinate { x, y }))
        }
    }

    #[test]
    fn custom_converters_outrank_the_fallback() {
        let codec = XmlCodec::new();
        codec.register_type::<Coordinate>();
        codec.register_converter(priority::NORMAL, Arc::new(CommaPairConverter));

        let text = codec.marshal(&Coordinate { x: 4, y: 2 }).unwrap();
        assert_eq!(
            text,
            "<relic__codec.codec.tests.Coordinate>4,2</relic__codec.codec.tests.Coordinate>",
        );
        assert_eq!(
            codec.unmarshal_as::<Coordinate>(&text).unwrap(),
            Coordinate { x: 4, y: 2 },
        );
    }

    // -------------------------------------------------------------------------
    // Faults

    #[test]
    fn faults_name_what_went_wrong() {
        let codec = XmlCodec::new();
        codec.register_type::<Point>();

        let fault = codec.unmarshal("<oops>").unwrap_err();
        assert!(matches!(
            fault,
            UnmarshalError::Malformed(MalformedInput::Syntax { .. })
        ));

        let fault = codec.unmarshal("<never.Seen/>").unwrap_err();
        assert!(matches!(
            fault,
            UnmarshalError::Malformed(MalformedInput::UnknownType { .. })
        ));

        let fault = codec.unmarshal_as::<u32>("<string>hi</string>").unwrap_err();
        assert!(matches!(
            fault,
            UnmarshalError::Malformed(MalformedInput::UnexpectedRoot { .. })
        ));
    }

    #[test]
    fn unmarshal_from_reads_streams() {
        let codec = XmlCodec::new();
        codec.register_type::<Point>();

        let text = codec.marshal(&Point { x: 9, y: 8 }).unwrap();
        let value = codec.unmarshal_from(text.as_bytes()).unwrap();
        assert_eq!(value.take::<Point>().ok(), Some(Point { x: 9, y: 8 }));
    }
}
