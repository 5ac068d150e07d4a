//! Port for the host's object constructor.
use std::sync::Arc;

use eyre::Result;
use thiserror::Error;

use crate::core::{controller::Handler, pipeline::Middleware};

/// Errors a factory implementation may raise for unknown names.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FactoryError {
    #[error("no handler registered for class '{0}'")]
    UnknownClass(String),
    #[error("no middleware registered for name '{0}'")]
    UnknownMiddleware(String),
}

/// HandlerFactory defines the port through which named class references
/// become invocable units. Class/method controller pairs and named
/// middleware entries both resolve here at dispatch time.
pub trait HandlerFactory: Send + Sync {
    fn make_handler(&self, class: &str, method: &str) -> Result<Arc<dyn Handler>>;

    fn make_middleware(&self, name: &str) -> Result<Arc<dyn Middleware>>;
}
