//! State shared by every route kind.
//!
//! Each concrete route variant embeds a [`RouteCore`] instead of
//! inheriting behavior: name, controller reference, middleware list and
//! the caller-set parameter bag all live here.
use std::{collections::BTreeMap, fmt::Write as _};

use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::core::{controller::ControllerRef, pipeline::MiddlewareEntry};

/// Width of auto-generated route names, in hex characters.
pub const GENERATED_NAME_LEN: usize = 6;

/// Derive a short deterministic route name from a pattern: a fixed-width
/// lowercase-hex truncation of its SHA-1. Collisions are possible for
/// large route sets; the registry detects them when it indexes.
pub fn generated_name(pattern: &str) -> String {
    let digest = Sha1::digest(pattern.as_bytes());
    let mut name = String::with_capacity(GENERATED_NAME_LEN);
    for byte in &digest[..GENERATED_NAME_LEN / 2] {
        let _ = write!(name, "{byte:02x}");
    }
    name
}

/// Identity, controller, middleware and parameter state embedded in each
/// route variant.
#[derive(Debug, Clone, Default)]
pub struct RouteCore {
    name: Option<String>,
    controller: Option<ControllerRef>,
    middleware: Vec<MiddlewareEntry>,
    parameters: BTreeMap<String, Value>,
}

impl RouteCore {
    /// The explicit name, or a name derived from the given pattern.
    pub fn name_or_derived(&self, pattern: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| generated_name(pattern))
    }

    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn controller(&self) -> Option<&ControllerRef> {
        self.controller.as_ref()
    }

    pub fn set_controller(&mut self, controller: ControllerRef) {
        self.controller = Some(controller);
    }

    pub fn clear_controller(&mut self) {
        self.controller = None;
    }

    pub fn middleware(&self) -> &[MiddlewareEntry] {
        &self.middleware
    }

    /// Append a middleware entry, or replace the whole list when
    /// `replace` is set.
    pub fn add_middleware(&mut self, entry: MiddlewareEntry, replace: bool) {
        if replace {
            self.middleware = vec![entry];
        } else {
            self.middleware.push(entry);
        }
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    pub fn set_parameter(&mut self, key: impl Into<String>, value: Value) {
        self.parameters.insert(key.into(), value);
    }

    /// Replace the whole parameter bag.
    pub fn set_parameters(&mut self, parameters: BTreeMap<String, Value>) {
        self.parameters = parameters;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_generated_name_is_fixed_width_lowercase_hex() {
        let name = generated_name("product/{name?}");
        assert_eq!(name.len(), GENERATED_NAME_LEN);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        // Deterministic for the same pattern, distinct for another.
        assert_eq!(name, generated_name("product/{name?}"));
        assert_ne!(name, generated_name("catalog/{id}"));
    }

    #[test]
    fn test_explicit_name_wins_over_derived() {
        let mut core = RouteCore::default();
        assert_eq!(core.name_or_derived("a/b"), generated_name("a/b"));

        core.set_name("products.show");
        assert_eq!(core.name_or_derived("a/b"), "products.show");
    }

    #[test]
    fn test_middleware_append_and_replace() {
        let mut core = RouteCore::default();
        core.add_middleware(MiddlewareEntry::named("auth"), false);
        core.add_middleware(MiddlewareEntry::named("throttle"), false);
        assert_eq!(core.middleware().len(), 2);

        core.add_middleware(MiddlewareEntry::named("only"), true);
        assert_eq!(core.middleware().len(), 1);
    }

    #[test]
    fn test_parameter_bag() {
        let mut core = RouteCore::default();
        core.set_parameter("id", json!(7));
        assert_eq!(core.parameter("id"), Some(&json!(7)));
        assert_eq!(core.parameter("missing"), None);
    }
}
