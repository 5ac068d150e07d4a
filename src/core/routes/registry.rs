//! Named route collection with lazy indexing.
//!
//! Routes are appended unindexed (a cheap `Vec` push at registration
//! time) and folded into the name map on first lookup or iteration,
//! which amortizes name derivation when many routes are registered but
//! few are queried per request. Registration order is preserved: it
//! drives both rewrite-rule generation order and predicate scan order.
use std::collections::{HashMap, hash_map::Entry};

use thiserror::Error;

/// Errors raised by registry lookups.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RegistryError {
    /// Recoverable: callers chain lookups across several registries and
    /// only surface this once every one of them failed.
    #[error("route '{0}' does not exist")]
    NotFound(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Anything storable in a registry under a derived or explicit name.
pub trait NamedRoute {
    fn route_name(&self) -> String;
}

/// Insertion-ordered, lazily-indexed route collection with unique names.
#[derive(Debug)]
pub struct RouteRegistry<R> {
    pending: Vec<R>,
    named: HashMap<String, R>,
    order: Vec<String>,
}

impl<R> Default for RouteRegistry<R> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            named: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<R: NamedRoute> RouteRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route unindexed and hand it back for fluent
    /// configuration.
    pub fn add(&mut self, route: R) -> &mut R {
        self.pending.push(route);
        self.pending.last_mut().expect("pending route just pushed")
    }

    /// Fold pending routes into the name index. On a name collision the
    /// first registration wins and the collision is logged.
    fn index(&mut self) {
        for route in self.pending.drain(..) {
            let name = route.route_name();
            match self.named.entry(name.clone()) {
                Entry::Occupied(_) => {
                    tracing::warn!(
                        route = %name,
                        "route name collision, keeping the first registration"
                    );
                }
                Entry::Vacant(slot) => {
                    slot.insert(route);
                    self.order.push(name);
                }
            }
        }
    }

    pub fn has(&mut self, name: &str) -> bool {
        self.index();
        self.named.contains_key(name)
    }

    pub fn get(&mut self, name: &str) -> RegistryResult<&R> {
        self.index();
        self.named
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> RegistryResult<&mut R> {
        self.index();
        self.named
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> RegistryResult<R> {
        self.index();
        let route = self
            .named
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        self.order.retain(|n| n != name);
        Ok(route)
    }

    /// Iterate routes in registration order.
    pub fn iter(&mut self) -> impl Iterator<Item = (&str, &R)> {
        self.index();
        self.order.iter().map(|name| {
            (
                name.as_str(),
                self.named.get(name).expect("indexed name resolves"),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.named.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Fake(&'static str);

    impl NamedRoute for Fake {
        fn route_name(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_lookup_after_lazy_indexing() {
        let mut registry = RouteRegistry::new();
        registry.add(Fake("a"));
        registry.add(Fake("b"));

        assert_eq!(registry.len(), 2);
        assert!(registry.has("a"));
        assert_eq!(registry.get("b").unwrap(), &Fake("b"));
    }

    #[test]
    fn test_missing_name_is_not_found() {
        let mut registry: RouteRegistry<Fake> = RouteRegistry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(name) if name == "nope"));
    }

    #[test]
    fn test_iteration_preserves_registration_order() {
        let mut registry = RouteRegistry::new();
        registry.add(Fake("z"));
        registry.add(Fake("a"));
        registry.add(Fake("m"));

        let order: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_collision_keeps_first_registration() {
        let mut registry = RouteRegistry::new();
        registry.add(Fake("dup"));
        registry.add(Fake("dup"));

        assert!(registry.has("dup"));
        assert_eq!(registry.iter().count(), 1);
    }

    #[test]
    fn test_remove_drops_route_and_order_entry() {
        let mut registry = RouteRegistry::new();
        registry.add(Fake("a"));
        registry.add(Fake("b"));

        registry.remove("a").unwrap();
        assert!(!registry.has("a"));
        let order: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["b"]);
    }
}
