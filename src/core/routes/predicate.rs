//! Predicate routes.
//!
//! Selected by evaluating key/operator/value conditions against the
//! request's query-state snapshot instead of path shape. Scanned in
//! registration order by the dispatcher; the first satisfied route wins.
use std::{collections::BTreeMap, fmt, sync::Arc};

use serde_json::Value;

use crate::core::{
    controller::ControllerRef,
    pipeline::MiddlewareEntry,
    predicate::{self, Condition, PredicateResult, REQUEST_PATH_KEY},
    request::RequestContext,
    routes::base::RouteCore,
};

type QueryHook = Arc<dyn Fn(&mut BTreeMap<String, Value>) + Send + Sync>;

/// A route selected by predicate satisfaction.
#[derive(Clone, Default)]
pub struct PredicateRoute {
    core: RouteCore,
    conditions: Vec<Condition>,
    query_hook: Option<QueryHook>,
}

impl PredicateRoute {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            ..Self::default()
        }
    }

    /// The condition set serialized as this route's pattern string; the
    /// derived name hashes it.
    pub fn pattern(&self) -> String {
        serde_json::to_string(&self.conditions).unwrap_or_default()
    }

    pub fn route_name(&self) -> String {
        self.core.name_or_derived(&self.pattern())
    }

    pub fn core(&self) -> &RouteCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut RouteCore {
        &mut self.core
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    // Fluent configuration.

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

    /// Add a condition with an explicit operator token.
    pub fn where_op(
        &mut self,
        key: impl Into<String>,
        operator: impl Into<String>,
        value: Value,
    ) -> &mut Self {
        self.conditions
            .push(Condition::new(key, operator, value));
        self
    }

    /// Equality shorthand.
    pub fn where_eq(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.where_op(key, "=", value)
    }

    /// Condition against the raw request path.
    pub fn where_path(&mut self, operator: impl Into<String>, value: Value) -> &mut Self {
        self.where_op(REQUEST_PATH_KEY, operator, value)
    }

    /// The query-variable must be present (non-null).
    pub fn where_present(&mut self, key: impl Into<String>) -> &mut Self {
        self.where_op(key, "!=", Value::Null)
    }

    /// The query-variable must be absent.
    pub fn where_absent(&mut self, key: impl Into<String>) -> &mut Self {
        self.where_op(key, "=", Value::Null)
    }

    pub fn parameter(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.core.set_parameter(key, value);
        self
    }

    /// Install a callback invoked with the live query-state bag before
    /// content resolution, only for the main non-administrative query.
    pub fn manipulate_query(
        &mut self,
        callback: impl Fn(&mut BTreeMap<String, Value>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.query_hook = Some(Arc::new(callback));
        self
    }

    pub fn query_hook(&self) -> Option<&QueryHook> {
        self.query_hook.as_ref()
    }

    /// Evaluate this route's conditions against a request.
    pub fn is_satisfied(&self, request: &RequestContext) -> PredicateResult<bool> {
        predicate::is_satisfied(&self.conditions, request.path(), request.query_vars())
    }
}

impl fmt::Debug for PredicateRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRoute")
            .field("name", &self.route_name())
            .field("conditions", &self.conditions)
            .field("query_hook", &self.query_hook.is_some())
            .finish_non_exhaustive()
    }
}
