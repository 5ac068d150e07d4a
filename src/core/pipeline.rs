//! Middleware pipeline execution.
//!
//! The pipeline is a right-fold: the terminal handler is wrapped by each
//! middleware from last to first, so the first-registered middleware
//! executes first and holds the outermost ability to short-circuit. A
//! middleware either calls its `next` continuation (optionally after
//! mutating the request) or returns its own value without calling it,
//! which skips every later middleware and the terminal handler. Errors
//! propagate unchanged; there is no implicit recovery.
use std::{fmt, sync::Arc};

use crate::core::{request::RequestContext, response::HandlerValue};

/// Outcome of one pipeline stage: `Some` short-circuits with a value to
/// resolve into a response, `None` means "nothing to send yet".
pub type PipelineResult = eyre::Result<Option<HandlerValue>>;

/// Continuation handed to each middleware.
pub type Next<'a> = Box<dyn FnOnce(&mut RequestContext) -> PipelineResult + 'a>;

/// A unit that may inspect or transform a request and either continue
/// the pipeline or short-circuit it with a result.
pub trait Middleware: Send + Sync {
    fn handle(&self, request: &mut RequestContext, next: Next<'_>) -> PipelineResult;
}

impl<F> Middleware for F
where
    F: Fn(&mut RequestContext, Next<'_>) -> PipelineResult + Send + Sync,
{
    fn handle(&self, request: &mut RequestContext, next: Next<'_>) -> PipelineResult {
        self(request, next)
    }
}

/// A registered middleware entry: either a directly invocable unit, or a
/// named class reference that the host's object constructor resolves at
/// dispatch time.
#[derive(Clone)]
pub enum MiddlewareEntry {
    Unit(Arc<dyn Middleware>),
    Named(String),
}

impl MiddlewareEntry {
    pub fn unit(middleware: impl Middleware + 'static) -> Self {
        Self::Unit(Arc::new(middleware))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(_) => f.write_str("MiddlewareEntry::Unit(..)"),
            Self::Named(name) => write!(f, "MiddlewareEntry::Named({name:?})"),
        }
    }
}

/// Run an ordered middleware list around a terminal handler.
pub fn run<'a>(
    request: &mut RequestContext,
    middleware: &'a [Arc<dyn Middleware>],
    terminal: impl FnOnce(&mut RequestContext) -> PipelineResult + 'a,
) -> PipelineResult {
    let mut next: Next<'a> = Box::new(terminal);
    for unit in middleware.iter().rev() {
        let inner = next;
        next = Box::new(move |req: &mut RequestContext| unit.handle(req, inner));
    }
    next(request)
}
