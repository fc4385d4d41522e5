//! Reflection impls for the standard types the codec supports out of the box.

mod dynamic;
mod list;
mod map;
mod option;
mod scalar;
