//! Path-based routes.
//!
//! A path route binds a URL pattern to a controller. At configure time
//! it exports a rewrite rule (positional regex plus target query string)
//! for the host's rewrite storage and announces the query-variable keys
//! it introduces; at request time its named matcher extracts path
//! parameters. The compiled matcher is memoized and invalidated whenever
//! a constraint changes.
use std::{collections::BTreeMap, fmt, sync::Arc};

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::core::{
    controller::ControllerRef,
    pattern::{self, CompiledMatcher, PatternResult},
    pipeline::MiddlewareEntry,
    routes::base::RouteCore,
};

/// Query-variable key carrying the matched route's name through the
/// host's rewrite resolution.
pub const ROUTE_QUERY_VAR: &str = "signpost_route";

/// Prefix of every rewrite-rule target query string.
pub const REWRITE_TARGET_PREFIX: &str = "index.php?";

/// A declared query-variable value: either a literal, or an ordinal
/// reference into the rewrite regex's capture groups, substituted as
/// `$matches[N]` in the rule target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryVar {
    Literal(String),
    MatchIndex(usize),
}

type QueryVarCallback = Arc<dyn Fn() -> Value + Send + Sync>;

/// A route selected by path shape.
#[derive(Clone, Default)]
pub struct PathRoute {
    core: RouteCore,
    pattern: String,
    constraints: BTreeMap<String, String>,
    query_vars: BTreeMap<String, QueryVar>,
    query_var_callbacks: BTreeMap<String, QueryVarCallback>,
    matcher: OnceCell<CompiledMatcher>,
}

impl PathRoute {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The route name: explicit, or derived from the pattern.
    pub fn route_name(&self) -> String {
        self.core.name_or_derived(&self.pattern)
    }

    pub fn core(&self) -> &RouteCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut RouteCore {
        &mut self.core
    }

    // Fluent configuration, used between registration and dispatch.

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.core.set_name(name);
        self
    }

    pub fn controller(&mut self, controller: impl Into<ControllerRef>) -> &mut Self {
        self.core.set_controller(controller.into());
        self
    }

    pub fn middleware(&mut self, entry: MiddlewareEntry) -> &mut Self {
        self.core.add_middleware(entry, false);
        self
    }

    pub fn middleware_replace(&mut self, entry: MiddlewareEntry) -> &mut Self {
        self.core.add_middleware(entry, true);
        self
    }

    /// Constrain a placeholder with a custom regex. Invalidates the
    /// memoized matcher.
    pub fn constrain(&mut self, name: impl Into<String>, regex: impl Into<String>) -> &mut Self {
        self.constraints.insert(name.into(), regex.into());
        self.matcher.take();
        self
    }

    /// Bulk variant of [`PathRoute::constrain`].
    pub fn constrain_map(&mut self, map: BTreeMap<String, String>) -> &mut Self {
        self.constraints.extend(map);
        self.matcher.take();
        self
    }

    pub fn where_alpha(&mut self, name: impl Into<String>) -> &mut Self {
        self.constrain(name, "[a-zA-Z]+")
    }

    pub fn where_numeric(&mut self, name: impl Into<String>) -> &mut Self {
        self.constrain(name, "[0-9]+")
    }

    pub fn where_alphanumeric(&mut self, name: impl Into<String>) -> &mut Self {
        self.constrain(name, "[a-zA-Z0-9]+")
    }

    /// Declare a query-variable with a literal value.
    pub fn query_var(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.query_vars
            .insert(key.into(), QueryVar::Literal(value.into()));
        self
    }

    /// Declare a query-variable filled from the N-th capture group of
    /// the rewrite regex.
    pub fn query_var_match(&mut self, key: impl Into<String>, index: usize) -> &mut Self {
        self.query_vars
            .insert(key.into(), QueryVar::MatchIndex(index));
        self
    }

    /// Declare a query-variable computed by a callback at request time.
    pub fn query_var_computed(
        &mut self,
        key: impl Into<String>,
        callback: impl Fn() -> Value + Send + Sync + 'static,
    ) -> &mut Self {
        self.query_var_callbacks
            .insert(key.into(), Arc::new(callback));
        self
    }

    pub fn parameter(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.core.set_parameter(key, value);
        self
    }

    /// Every query-variable key this route introduces, declared and
    /// computed alike, announced to the host's allow-list.
    pub fn query_var_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.query_vars.keys().cloned().collect();
        keys.extend(self.query_var_callbacks.keys().cloned());
        keys
    }

    /// Execute every computed query-variable callback.
    pub fn computed_query_vars(&self) -> BTreeMap<String, Value> {
        self.query_var_callbacks
            .iter()
            .map(|(key, callback)| (key.clone(), callback()))
            .collect()
    }

    /// The memoized compiled matcher, building it on first use.
    pub fn matcher(&self) -> PatternResult<&CompiledMatcher> {
        self.matcher
            .get_or_try_init(|| pattern::compile(&self.pattern, &self.constraints))
    }

    /// The rewrite rule exported to the host: positional regex mapped to
    /// a target query string of declared vars plus the route identifier.
    pub fn rewrite_rule(&self) -> PatternResult<(String, String)> {
        let regex = self.matcher()?.rewrite_regex().to_string();

        let mut pairs: Vec<String> = self
            .query_vars
            .iter()
            .map(|(key, value)| match value {
                QueryVar::Literal(literal) => format!("{key}={literal}"),
                QueryVar::MatchIndex(index) => format!("{key}=$matches[{index}]"),
            })
            .collect();
        pairs.push(format!("{ROUTE_QUERY_VAR}={}", self.route_name()));

        Ok((regex, format!("{REWRITE_TARGET_PREFIX}{}", pairs.join("&"))))
    }

    /// Extract path parameters from a candidate path with the named
    /// matcher. `None` when the candidate does not match; on a match,
    /// unfilled optional placeholders are present with `None` values.
    pub fn extract(&self, candidate: &str) -> PatternResult<Option<BTreeMap<String, Option<String>>>> {
        Ok(self.matcher()?.extract(candidate))
    }

    /// Build the absolute URL for this route. Required placeholders must
    /// all be supplied; optional ones drop together with their
    /// separator.
    pub fn url(&self, base_url: &str, args: &BTreeMap<String, String>) -> PatternResult<String> {
        let path = pattern::build_url(&self.pattern, args)?;
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(joined.trim_end_matches('/').to_string())
    }
}

impl fmt::Debug for PathRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathRoute")
            .field("pattern", &self.pattern)
            .field("name", &self.route_name())
            .field("constraints", &self.constraints)
            .field("query_vars", &self.query_vars)
            .field("computed", &self.query_var_callbacks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_rewrite_rule_without_query_vars() {
        let mut route = PathRoute::new("product/{name?}");
        route.name("product.show");

        let (regex, target) = route.rewrite_rule().unwrap();
        assert_eq!(regex, r"product(?:/([-\w]+))?/?$");
        assert_eq!(target, format!("index.php?{ROUTE_QUERY_VAR}=product.show"));
    }

    #[test]
    fn test_rewrite_rule_with_positional_query_var() {
        let mut route = PathRoute::new("product/{name?}");
        route.name("product.show").query_var_match("name", 1);

        let (_, target) = route.rewrite_rule().unwrap();
        assert_eq!(
            target,
            format!("index.php?name=$matches[1]&{ROUTE_QUERY_VAR}=product.show")
        );
    }

    #[test]
    fn test_rewrite_rule_with_constraint_shorthand() {
        let mut route = PathRoute::new("product/{name?}");
        route
            .name("product.show")
            .where_numeric("name")
            .query_var_match("name", 1);

        let (regex, _) = route.rewrite_rule().unwrap();
        assert_eq!(regex, "product(?:/([0-9]+))?/?$");
    }

    #[test]
    fn test_raw_regex_pattern_with_positional_var() {
        let mut route = PathRoute::new("product/([a-zA-Z0-9]+)");
        route.name("product.show").query_var_match("name", 1);

        let (regex, target) = route.rewrite_rule().unwrap();
        assert_eq!(regex, "product/([a-zA-Z0-9]+)/?$");
        assert_eq!(
            target,
            format!("index.php?name=$matches[1]&{ROUTE_QUERY_VAR}=product.show")
        );
    }

    #[test]
    fn test_constraint_invalidates_memoized_matcher() {
        let mut route = PathRoute::new("product/{name}");
        assert!(route.matcher().unwrap().is_match("product/chair"));

        route.where_numeric("name");
        assert!(!route.matcher().unwrap().is_match("product/chair"));
        assert!(route.matcher().unwrap().is_match("product/42"));
    }

    #[test]
    fn test_url_joins_base_and_drops_missing_optional() {
        let route = PathRoute::new("product/{name?}");

        let mut args = BTreeMap::new();
        args.insert("name".to_string(), "chair".to_string());
        assert_eq!(
            route.url("http://example.org", &args).unwrap(),
            "http://example.org/product/chair"
        );

        assert_eq!(
            route.url("http://example.org/", &BTreeMap::new()).unwrap(),
            "http://example.org/product"
        );
    }

    #[test]
    fn test_query_var_keys_include_computed() {
        let mut route = PathRoute::new("shop");
        route
            .query_var("post_type", "product")
            .query_var_computed("today", || json!("2021-06-01"));

        let mut keys = route.query_var_keys();
        keys.sort();
        assert_eq!(keys, vec!["post_type".to_string(), "today".to_string()]);

        let computed = route.computed_query_vars();
        assert_eq!(computed.get("today"), Some(&json!("2021-06-01")));
    }

    #[test]
    fn test_auto_generated_name_is_short_hex() {
        let route = PathRoute::new("product/{name?}");
        let name = route.route_name();
        assert_eq!(name.len(), 6);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
