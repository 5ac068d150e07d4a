//! Request context consumed by the routing core.
//!
//! The host builds one `RequestContext` per incoming request: the path
//! string, a snapshot of the query-state bag, and an opaque string
//! environment. The core reads from it and writes derived
//! query-variables back through [`RequestContext::set_query_var`]; it
//! never touches the transport-level request, which stays on the host's
//! side of the boundary.
use std::collections::BTreeMap;

use serde_json::Value;

/// Snapshot of an incoming request as seen by the routing core.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    path: String,
    query: BTreeMap<String, Value>,
    env: BTreeMap<String, String>,
    route_id: Option<String>,
    action: Option<String>,
    admin: bool,
}

impl RequestContext {
    /// Create a context for the given request path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// The raw request path, without scheme or host.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The full query-state bag.
    pub fn query_vars(&self) -> &BTreeMap<String, Value> {
        &self.query
    }

    /// Read a single query-variable.
    pub fn query_var(&self, key: &str) -> Option<&Value> {
        self.query.get(key)
    }

    /// Write a derived query-variable back into the bag. This is the
    /// only mutation contract the core has against request state.
    pub fn set_query_var(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.query.insert(key.into(), value);
        self
    }

    /// Seed a query-variable during construction.
    pub fn with_query_var(mut self, key: impl Into<String>, value: Value) -> Self {
        self.query.insert(key.into(), value);
        self
    }

    /// The explicit route identifier placed by the host's URL-rewrite
    /// resolution, when one matched.
    pub fn route_id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }

    pub fn with_route_id(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// The declared ajax action name, for admin/ajax-class requests.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Whether this request targets the host's administrative area.
    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// Read an opaque environment entry supplied by the host.
    pub fn env(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Write an environment entry, e.g. a request id stamped by
    /// middleware.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Exclusive access to the query-state bag, used by the
    /// query-manipulation hook of predicate routes.
    pub fn query_vars_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.query
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_query_var_round_trip() {
        let mut request = RequestContext::new("product/chair");
        request.set_query_var("name", json!("chair"));

        assert_eq!(request.path(), "product/chair");
        assert_eq!(request.query_var("name"), Some(&json!("chair")));
        assert_eq!(request.query_var("missing"), None);
    }

    #[test]
    fn test_builder_style_construction() {
        let request = RequestContext::new("shop")
            .with_route_id("shop.index")
            .with_action("refresh_cart")
            .with_admin(true)
            .with_env("method", "POST");

        assert_eq!(request.route_id(), Some("shop.index"));
        assert_eq!(request.action(), Some("refresh_cart"));
        assert!(request.is_admin());
        assert_eq!(request.env("method"), Some("POST"));
    }
}
