//! Identifier mangling between type paths and element names.
//!
//! Wire names may contain `::` and `_`, neither of which is welcome in an
//! element name: the path separator is not a valid name character, and `_`
//! doubles as our escape introducer. The mapping is
//!
//! - `_`  ⇔ `__`
//! - `::` ⇔ `.`
//!
//! which is total and self-inverse over identifiers the host grammar can
//! produce (segments never contain `.`, and every `_` on the wire arrives
//! doubled).

use std::borrow::Cow;

/// Mangles a type path or field name into an element name.
///
/// ```
/// use relic_codec::mangle;
///
/// assert_eq!(mangle("jobs::build_state::Record"), "jobs.build__state.Record");
/// assert_eq!(mangle("plain"), "plain");
/// ```
pub fn mangle(path: &str) -> Cow<'_, str> {
    if !path.contains(['_', ':']) {
        return Cow::Borrowed(path);
    }
    let mut out = String::with_capacity(path.len() + 4);
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '_' => out.push_str("__"),
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                out.push('.');
            }
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Unmangles an element name back into a type path or field name.
///
/// A lone trailing `_` cannot come out of [`mangle`] but is passed through
/// rather than rejected; name resolution decides what to do with the result.
pub fn unmangle(name: &str) -> Cow<'_, str> {
    if !name.contains(['_', '.']) {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' => out.push_str("::"),
            '_' => {
                if chars.peek() == Some(&'_') {
                    chars.next();
                }
                out.push('_');
            }
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn underscores_double_and_separators_become_dots() {
        assert_eq!(mangle("load_factor"), "load__factor");
        assert_eq!(mangle("a::b::c_d"), "a.b.c__d");
        assert_eq!(mangle("__Leading"), "____Leading");
        assert_eq!(unmangle("load__factor"), "load_factor");
        assert_eq!(unmangle("a.b.c__d"), "a::b::c_d");
        assert_eq!(unmangle("____Leading"), "__Leading");
    }

    #[test]
    fn plain_names_borrow() {
        assert!(matches!(mangle("Record"), Cow::Borrowed("Record")));
        assert!(matches!(unmangle("Record"), Cow::Borrowed("Record")));
    }

    proptest! {
        #[test]
        fn round_trips_over_host_identifiers(
            path in "[A-Za-z_][A-Za-z0-9_]{0,12}(::[A-Za-z_][A-Za-z0-9_]{0,12}){0,3}",
        ) {
            let mangled = mangle(&path);
            let unmangled = unmangle(&mangled);
            let remangled = mangle(&unmangled);
            prop_assert_eq!(unmangled.as_ref(), path.as_str());
            prop_assert_eq!(remangled.as_ref(), mangled.as_ref());
        }
    }
}
