//! Version string normalization.

/// Returns the leading token of a version string.
///
/// Deployed builds report versions like `3.2-SNAPSHOT (private-09/23-user)`;
/// everything from the first space on is build metadata and irrelevant for
/// comparing persisted documents against the running binary.
///
/// ```
/// use relic_codec::trim_version;
///
/// assert_eq!(trim_version("3.2-SNAPSHOT (private-09/23/2012 12:03-user)"), "3.2-SNAPSHOT");
/// assert_eq!(trim_version("3.2"), "3.2");
/// ```
pub fn trim_version(raw: &str) -> &str {
    match raw.find(' ') {
        Some(space) => &raw[..space],
        None => raw,
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuts_at_the_first_space_only() {
        assert_eq!(
            trim_version("3.2-SNAPSHOT (private-09/23/2012 12:03-user)"),
            "3.2-SNAPSHOT",
        );
        assert_eq!(trim_version("3.2-SNAPSHOT"), "3.2-SNAPSHOT");
        assert_eq!(trim_version("3.2.1"), "3.2.1");
        assert_eq!(trim_version("3.2"), "3.2");
        assert_eq!(trim_version(""), "");
    }
}
