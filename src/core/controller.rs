//! Controller references and normalization.
//!
//! A route's controller arrives in several shapes: a directly invocable
//! handler, a `"Class::method"` or `"Class@method"` string, or a bare
//! class name with the implied default method. Normalization happens
//! once at registration into a tagged [`ControllerRef`], never through
//! runtime type inspection at call time. Named class references are
//! turned into handlers by the host's object constructor (the
//! `HandlerFactory` port) during dispatch.
use std::{collections::BTreeMap, fmt, sync::Arc};

use serde_json::Value;

use crate::core::{request::RequestContext, response::HandlerValue};

/// Method name implied by a bare class-name controller string.
pub const DEFAULT_METHOD: &str = "run";

/// Parameters handed to a controller: merged query-state and
/// route-bound values.
pub type Params = BTreeMap<String, Value>;

/// An invocable controller unit.
pub trait Handler: Send + Sync {
    fn call(&self, request: &RequestContext, params: &Params) -> eyre::Result<HandlerValue>;
}

impl<F> Handler for F
where
    F: Fn(&RequestContext, &Params) -> eyre::Result<HandlerValue> + Send + Sync,
{
    fn call(&self, request: &RequestContext, params: &Params) -> eyre::Result<HandlerValue> {
        self(request, params)
    }
}

/// Normalized controller reference.
///
/// A pre-built handler instance is already invocable, so it lives in the
/// `Handler` variant; only named class/method pairs stay symbolic until
/// the host factory constructs them.
#[derive(Clone)]
pub enum ControllerRef {
    Handler(Arc<dyn Handler>),
    ClassMethod { class: String, method: String },
}

impl ControllerRef {
    pub fn handler(handler: impl Handler + 'static) -> Self {
        Self::Handler(Arc::new(handler))
    }

    /// Normalize a controller string: `::` or `@` split into a
    /// class/method pair; any other string is a class name with the
    /// implied default method.
    pub fn parse(spec: &str) -> Self {
        if let Some((class, method)) = spec.split_once("::") {
            return Self::ClassMethod {
                class: class.to_string(),
                method: method.to_string(),
            };
        }
        if let Some((class, method)) = spec.split_once('@') {
            return Self::ClassMethod {
                class: class.to_string(),
                method: method.to_string(),
            };
        }
        Self::ClassMethod {
            class: spec.to_string(),
            method: DEFAULT_METHOD.to_string(),
        }
    }
}

impl From<&str> for ControllerRef {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

impl From<String> for ControllerRef {
    fn from(spec: String) -> Self {
        Self::parse(&spec)
    }
}

impl fmt::Debug for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("ControllerRef::Handler(..)"),
            Self::ClassMethod { class, method } => write!(f, "ControllerRef::{class}::{method}"),
        }
    }
}
