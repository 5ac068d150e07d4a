//! Signpost - a pattern-matching request router and dispatch engine.
//!
//! Signpost maps incoming requests to application handlers through
//! declared URL/query patterns, runs a composable pre-processing
//! pipeline, and produces a normalized response contract. It is built to
//! be embedded in a CMS-style host environment: the host supplies the
//! HTTP transport, URL-rewrite storage, admin/ajax transport and
//! template rendering, all reached through ports.
//!
//! # Features
//! - Path patterns with named placeholders (`{name}`, optional
//!   `{name?}`) and per-parameter regex constraints
//! - Positional and named compilation modes: rewrite-rule export for the
//!   host, self-contained matching and parameter extraction in-core
//! - Reverse URL building with exhaustive missing-argument reporting
//! - Predicate routes selected by key/operator/value conditions over the
//!   request's query-state
//! - Ajax action routes with privileged/unprivileged registration points
//! - Ordered middleware pipeline with cooperative short-circuiting
//! - Response classification into a closed variant set (text, json,
//!   callback, redirect, error, void)
//! - Declarative route configuration with validation & multi-format
//!   loading
//! - Structured tracing via `tracing`
//!
//! # Quick Example
//! ```
//! use signpost::{
//!     ControllerRef, DispatchOutcome, HandlerValue, RequestContext, Router,
//!     adapters::RecordingTransport,
//!     core::controller::Params,
//! };
//!
//! # fn main() -> eyre::Result<()> {
//! let mut router = Router::default();
//! router
//!     .add_route("product/{name}")
//!     .name("product.show")
//!     .controller(ControllerRef::handler(
//!         |_request: &RequestContext, params: &Params| {
//!             Ok(HandlerValue::from(format!("product: {}", params["name"])))
//!         },
//!     ));
//!
//! let mut transport = RecordingTransport::default();
//! let mut request = RequestContext::new("product/chair").with_route_id("product.show");
//! assert_eq!(
//!     router.dispatch(&mut request, &mut transport)?,
//!     DispatchOutcome::Handled
//! );
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters**
//! (implementations) while keeping business logic inside `core`:
//! pattern compilation, predicate matching, the middleware pipeline,
//! response resolution, route variants and the dispatcher. The host
//! glues real storage and transport behind the ports; the in-crate
//! adapters are in-memory stand-ins for tests and the companion CLI.
//!
//! # Error Handling
//! All fallible APIs return `eyre::Result<T>` or a domain specific error
//! type. Controller-time failures are wrapped into
//! [`core::router::RouteExecutionError`] carrying the route name.
//!
//! # Concurrency
//! Dispatch is single-threaded, synchronous and request-scoped:
//! registration mutates the router, dispatch works on per-request route
//! clones, and nothing is shared across concurrent requests inside this
//! core.
pub mod adapters;
pub mod config;
pub mod core;
pub mod ports;
pub mod tracing_setup;

// Re-export the types most embedders need.
pub use crate::{
    adapters::build_router,
    core::{
        controller::{ControllerRef, Handler, Params},
        pipeline::{Middleware, MiddlewareEntry, Next, PipelineResult},
        request::RequestContext,
        response::{HandlerValue, Render, Response},
        router::{DispatchOutcome, RouteExecutionError, Router, RouterOptions},
    },
};
