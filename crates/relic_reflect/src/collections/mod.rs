//! Container families with specialized wire formats.
//!
//! The immutable family ([`ImmutableMap`], [`ImmutableList`], [`ImmutableSet`])
//! carries the `Immutable` marker; `dashmap::DashMap` carries `Concurrent`.
//! The codec keys its specialized converters off these markers.

mod concurrent;
mod immutable;

pub use immutable::{ImmutableForm, ImmutableList, ImmutableMap, ImmutableSet};
