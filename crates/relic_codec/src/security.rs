//! The input security gate.
//!
//! Legacy documents for proxy-based listeners encoded a `dynamic-proxy`
//! element whose handler description could name an arbitrary method to invoke
//! once the proxy was touched, turning deserialization into code execution.
//! Nothing legitimate persists such a shape anymore, so the name itself is
//! refused during resolution, before any type lookup or construction and
//! regardless of how deep in the document it appears.

use crate::error::SecurityVeto;

/// Shape names that must never be reconstructed from input.
const FORBIDDEN_SHAPES: &[&str] = &["dynamic-proxy"];

/// Screens a wire name found in input text.
pub(crate) fn screen_name(name: &str) -> Result<(), SecurityVeto> {
    if FORBIDDEN_SHAPES.contains(&name) {
        return Err(SecurityVeto {
            shape: name.to_owned(),
        });
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_proxy_shape_is_refused_and_others_pass() {
        assert!(screen_name("dynamic-proxy").is_err());
        assert!(screen_name("dynamic__proxy").is_ok());
        assert!(screen_name("jobs.Build").is_ok());
    }
}
