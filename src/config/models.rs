//! Configuration data structures for Signpost.
//!
//! These types map directly to TOML (also JSON / YAML) configuration
//! files. They are intentionally serde-friendly and include defaults so
//! that minimal configs remain concise; declarative route sets loaded
//! here end up on a `Router` through the config-routes adapter.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::predicate::Condition;

/// Top-level router configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Base URL joined onto reverse-built route paths.
    pub base_url: Option<String>,
    /// Endpoint URL for ajax action routes.
    pub ajax_endpoint: Option<String>,
    /// Synthesize a catch-all route for requests nothing else matched.
    pub handle_all_requests: bool,
    /// Path routes in registration order.
    pub routes: Vec<RouteSpec>,
    /// Predicate routes in scan order.
    pub predicates: Vec<PredicateSpec>,
    /// Ajax action routes.
    pub actions: Vec<ActionSpec>,
}

/// Declarative path route.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouteSpec {
    /// Pattern with `{name}` / `{name?}` placeholders.
    pub pattern: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Controller spec: `Class::method`, `Class@method` or a bare class
    /// name with the implied default method.
    #[serde(default)]
    pub controller: Option<String>,
    /// Per-placeholder regex constraints.
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
    /// Declared query-variables: a literal string, or a capture-group
    /// ordinal substituted as `$matches[N]`.
    #[serde(default)]
    pub query_vars: BTreeMap<String, QueryVarSpec>,
    /// Named middleware, resolved through the handler factory.
    #[serde(default)]
    pub middleware: Vec<String>,
    /// Route-bound parameters passed to the controller.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

/// A declared query-variable value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum QueryVarSpec {
    MatchIndex(usize),
    Literal(String),
}

/// Declarative predicate route.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PredicateSpec {
    pub name: Option<String>,
    pub controller: Option<String>,
    pub conditions: Vec<Condition>,
    pub middleware: Vec<String>,
    pub parameters: BTreeMap<String, Value>,
}

/// Declarative ajax action route.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ActionSpec {
    pub action: String,
    pub controller: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub admin_only: bool,
    #[serde(default)]
    pub middleware: Vec<String>,
}
