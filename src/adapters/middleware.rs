//! Reusable middleware units.
//!
//! Small composable pieces that can be attached to any route to enrich
//! requests or enforce cross-cutting concerns. They stay stateless
//! except for construction-time configuration.
use std::{sync::Arc, time::Instant};

use crate::core::{
    pipeline::{Middleware, Next, PipelineResult},
    request::RequestContext,
    response::{HandlerValue, Response},
};

/// Environment key under which [`RequestId`] stamps its id.
pub const REQUEST_ID_ENV: &str = "request_id";

/// Stamp a per-request UUID into the request environment and expose it
/// via a tracing span.
#[derive(Debug, Default)]
pub struct RequestId;

impl Middleware for RequestId {
    fn handle(&self, request: &mut RequestContext, next: Next<'_>) -> PipelineResult {
        let request_id = uuid::Uuid::new_v4().to_string();
        request.set_env(REQUEST_ID_ENV, request_id.clone());

        let span = tracing::info_span!("request", request_id = %request_id);
        let _enter = span.enter();

        next(request)
    }
}

/// Log start/end of a dispatch including latency.
#[derive(Debug, Default)]
pub struct RequestTiming;

impl Middleware for RequestTiming {
    fn handle(&self, request: &mut RequestContext, next: Next<'_>) -> PipelineResult {
        let start = Instant::now();
        let path = request.path().to_string();

        tracing::info!(path = %path, "started processing request");
        let result = next(request);
        tracing::info!(path = %path, elapsed = ?start.elapsed(), "completed request");

        result
    }
}

/// Guard that short-circuits unauthenticated requests into a redirect.
///
/// The authentication check is host-supplied; the guard only decides to
/// continue the pipeline or answer with a 401 redirect to the login URL.
pub struct AuthGuard {
    login_url: String,
    is_authenticated: Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>,
}

impl AuthGuard {
    pub fn new(
        login_url: impl Into<String>,
        is_authenticated: impl Fn(&RequestContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            login_url: login_url.into(),
            is_authenticated: Arc::new(is_authenticated),
        }
    }
}

impl Middleware for AuthGuard {
    fn handle(&self, request: &mut RequestContext, next: Next<'_>) -> PipelineResult {
        if !(self.is_authenticated)(request) {
            tracing::debug!(path = %request.path(), "unauthenticated request redirected");
            return Ok(Some(HandlerValue::from(Response::redirect_with_status(
                self.login_url.clone(),
                401,
            ))));
        }

        next(request)
    }
}
