//! Route variants and their registry.
pub mod action;
pub mod base;
pub mod path;
pub mod predicate;
pub mod registry;

pub use action::ActionRoute;
pub use base::{GENERATED_NAME_LEN, RouteCore, generated_name};
pub use path::{PathRoute, QueryVar, REWRITE_TARGET_PREFIX, ROUTE_QUERY_VAR};
pub use predicate::PredicateRoute;
pub use registry::{NamedRoute, RegistryError, RegistryResult, RouteRegistry};

/// Closed set of web route kinds consumed by the dispatcher. Ajax
/// action routes live in their own registry and are not part of this
/// union.
#[derive(Debug, Clone)]
pub enum WebRoute {
    Path(PathRoute),
    Predicate(PredicateRoute),
}

impl WebRoute {
    pub fn route_name(&self) -> String {
        match self {
            Self::Path(route) => route.route_name(),
            Self::Predicate(route) => route.route_name(),
        }
    }

    pub fn core(&self) -> &RouteCore {
        match self {
            Self::Path(route) => route.core(),
            Self::Predicate(route) => route.core(),
        }
    }

    pub fn core_mut(&mut self) -> &mut RouteCore {
        match self {
            Self::Path(route) => route.core_mut(),
            Self::Predicate(route) => route.core_mut(),
        }
    }

    pub fn as_path(&self) -> Option<&PathRoute> {
        match self {
            Self::Path(route) => Some(route),
            Self::Predicate(_) => None,
        }
    }

    pub fn as_predicate(&self) -> Option<&PredicateRoute> {
        match self {
            Self::Predicate(route) => Some(route),
            Self::Path(_) => None,
        }
    }
}

impl NamedRoute for WebRoute {
    fn route_name(&self) -> String {
        WebRoute::route_name(self)
    }
}

impl NamedRoute for ActionRoute {
    fn route_name(&self) -> String {
        ActionRoute::route_name(self)
    }
}
