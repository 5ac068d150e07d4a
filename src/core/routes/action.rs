//! Ajax action routes.
//!
//! An action route binds a declared action name to a controller, served
//! through the host's admin/ajax transport rather than URL rewriting.
//! Each route announces up to two conditional registration points: a
//! privileged one, and — unless marked admin-only — an unprivileged one.
use std::{collections::BTreeMap, fmt};

use serde_json::Value;

use crate::core::{
    controller::ControllerRef, pipeline::MiddlewareEntry, routes::base::RouteCore,
};

/// A route keyed by ajax action name.
#[derive(Clone)]
pub struct ActionRoute {
    core: RouteCore,
    action: String,
    admin_only: bool,
}

impl ActionRoute {
    pub fn new(action: impl Into<String>, controller: impl Into<ControllerRef>) -> Self {
        let mut core = RouteCore::default();
        core.set_controller(controller.into());
        Self {
            core,
            action: action.into(),
            admin_only: false,
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// The route name defaults to the action name itself.
    pub fn route_name(&self) -> String {
        self.core
            .explicit_name()
            .map(str::to_string)
            .unwrap_or_else(|| self.action.clone())
    }

    pub fn core(&self) -> &RouteCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut RouteCore {
        &mut self.core
    }

    // Fluent configuration.

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.core.set_name(name);
        self
    }

    pub fn middleware(&mut self, entry: MiddlewareEntry) -> &mut Self {
        self.core.add_middleware(entry, false);
        self
    }

    pub fn parameter(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.core.set_parameter(key, value);
        self
    }

    /// Restrict this action to the privileged registration point only.
    pub fn admin_only(&mut self, admin_only: bool) -> &mut Self {
        self.admin_only = admin_only;
        self
    }

    pub fn is_admin_only(&self) -> bool {
        self.admin_only
    }

    /// Build the ajax endpoint URL for this action, with percent-encoded
    /// extra arguments.
    pub fn url(&self, endpoint: &str, args: &BTreeMap<String, Value>) -> String {
        let mut url = format!(
            "{endpoint}?action={}",
            urlencoding::encode(&self.action)
        );
        for (key, value) in args {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            url.push_str(&format!(
                "&{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value)
            ));
        }
        url
    }
}

impl fmt::Debug for ActionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRoute")
            .field("action", &self.action)
            .field("name", &self.route_name())
            .field("admin_only", &self.admin_only)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_url_includes_action_and_encoded_args() {
        let route = ActionRoute::new("update_product", "ProductController::update");

        let mut args = BTreeMap::new();
        args.insert("id".to_string(), json!(1234));
        let url = route.url("http://example.org/wp-admin/admin-ajax.php", &args);

        assert_eq!(
            url,
            "http://example.org/wp-admin/admin-ajax.php?action=update_product&id=1234"
        );
    }

    #[test]
    fn test_name_defaults_to_action() {
        let mut route = ActionRoute::new("refresh_cart", "CartController");
        assert_eq!(route.route_name(), "refresh_cart");

        route.name("cart.refresh");
        assert_eq!(route.route_name(), "cart.refresh");
    }

    #[test]
    fn test_admin_only_flag() {
        let mut route = ActionRoute::new("purge", "CacheController");
        assert!(!route.is_admin_only());
        route.admin_only(true);
        assert!(route.is_admin_only());
    }
}
