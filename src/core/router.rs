//! Router facade and dispatcher.
//!
//! The router owns the web and ajax route registries and runs a
//! two-phase protocol: `configure` exports rewrite rules, query-variable
//! keys and ajax registration points to the host ports, then `dispatch`
//! (and `dispatch_action` for ajax-class requests) resolves one incoming
//! request at a time. Resolution precedence for web requests, first
//! match wins: explicit route identifier, predicate scan in registration
//! order, synthesized catch-all when `handle_all_requests` is set,
//! otherwise the host's default handling proceeds untouched.
//!
//! Dispatch works on a per-request clone of the selected route, so bound
//! parameters and resolved responses never leak from one request into
//! the next.
use std::{collections::BTreeMap, fmt::Write as _, sync::Arc};

use serde_json::Value;
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::{
    core::{
        controller::{ControllerRef, Params},
        pipeline::{self, Middleware, MiddlewareEntry, Next, PipelineResult},
        predicate::Condition,
        request::RequestContext,
        response::{self, HandlerValue, Response},
        routes::{
            ActionRoute, PathRoute, PredicateRoute, ROUTE_QUERY_VAR, RegistryError,
            RegistryResult, RouteRegistry, WebRoute,
        },
    },
    ports::{
        AjaxRegistrar, ControllerDiscovery, HandlerFactory, QueryVarSink, ResponseTransport,
        RewriteStore,
    },
};

/// Fatal resolution errors: programming mistakes, not user-facing
/// conditions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DispatchError {
    /// A name lookup resolved to a route of the wrong kind, which means
    /// two route kinds collide on one name.
    #[error("route '{0}' matched for the current request is not a path route")]
    InvalidRouteType(String),
}

/// Any controller-time failure, wrapped with the route name so callers
/// can log or branch on a single error kind. Never propagated raw.
#[derive(Error, Debug)]
#[error("an error occurred during route '{route}' execution")]
pub struct RouteExecutionError {
    pub route: String,
    #[source]
    pub source: eyre::Report,
}

/// What a dispatch attempt did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A response variant was resolved and sent through the transport.
    Handled,
    /// This dispatcher does not own the request; the host's default
    /// handling proceeds untouched.
    NotOurs,
}

/// Construction-time router configuration. `handle_all_requests` is an
/// explicit field here rather than process-wide mutable state.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Base URL joined onto reverse-built route paths.
    pub base_url: Option<String>,
    /// Endpoint URL for ajax action routes.
    pub ajax_endpoint: Option<String>,
    /// Synthesize a catch-all route for requests nothing else matched.
    pub handle_all_requests: bool,
}

/// The routing engine: registries, host ports and the dispatch logic.
#[derive(Default)]
pub struct Router {
    options: RouterOptions,
    web: RouteRegistry<WebRoute>,
    ajax: RouteRegistry<ActionRoute>,
    discovery: Option<Arc<dyn ControllerDiscovery>>,
    factory: Option<Arc<dyn HandlerFactory>>,
}

impl Router {
    pub fn new(options: RouterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Attach the controller-discovery collaborator, consulted when a
    /// matched route has no explicit controller.
    pub fn with_discovery(mut self, discovery: Arc<dyn ControllerDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Attach the host's object constructor, used to resolve named
    /// class/method controllers and named middleware.
    pub fn with_factory(mut self, factory: Arc<dyn HandlerFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    // --- registration -----------------------------------------------------

    /// Register a path route and hand it back for fluent configuration.
    pub fn add_route(&mut self, pattern: impl Into<String>) -> &mut PathRoute {
        match self.web.add(WebRoute::Path(PathRoute::new(pattern))) {
            WebRoute::Path(route) => route,
            WebRoute::Predicate(_) => unreachable!("just inserted a path route"),
        }
    }

    /// Alias for [`Router::add_route`].
    pub fn web(&mut self, pattern: impl Into<String>) -> &mut PathRoute {
        self.add_route(pattern)
    }

    /// Register a predicate route with an initial condition set.
    pub fn add_predicate_route(&mut self, conditions: Vec<Condition>) -> &mut PredicateRoute {
        match self.web.add(WebRoute::Predicate(PredicateRoute::new(conditions))) {
            WebRoute::Predicate(route) => route,
            WebRoute::Path(_) => unreachable!("just inserted a predicate route"),
        }
    }

    /// Register an empty predicate route to be built fluently.
    pub fn predicate(&mut self) -> &mut PredicateRoute {
        self.add_predicate_route(Vec::new())
    }

    /// Register an ajax action route.
    pub fn ajax(
        &mut self,
        action: impl Into<String>,
        controller: impl Into<ControllerRef>,
    ) -> &mut ActionRoute {
        self.ajax.add(ActionRoute::new(action, controller))
    }

    /// Register a path route that short-circuits into a redirect.
    pub fn redirect(
        &mut self,
        path: impl Into<String>,
        target: impl Into<String>,
        status: u16,
    ) -> &mut PathRoute {
        let target = target.into();
        let route = self.add_route(path);
        route.middleware(MiddlewareEntry::unit(
            move |_request: &mut RequestContext, _next: Next<'_>| -> PipelineResult {
                Ok(Some(HandlerValue::from(Response::redirect_with_status(
                    target.clone(),
                    status,
                ))))
            },
        ));
        route
    }

    /// Register a permanent (301) redirect route.
    pub fn permanent_redirect(
        &mut self,
        path: impl Into<String>,
        target: impl Into<String>,
    ) -> &mut PathRoute {
        self.redirect(path, target, 301)
    }

    // --- lookup -----------------------------------------------------------

    pub fn get_web_route(&mut self, name: &str) -> RegistryResult<&WebRoute> {
        self.web.get(name)
    }

    pub fn get_ajax_route(&mut self, name: &str) -> RegistryResult<&ActionRoute> {
        self.ajax.get(name)
    }

    /// Whether any registry, web or ajax, knows this name.
    pub fn has_route(&mut self, name: &str) -> bool {
        self.web.has(name) || self.ajax.has(name)
    }

    /// Remove a route by name, trying the web registry before the ajax
    /// one; the not-found error surfaces only when both lookups failed.
    pub fn remove_route(&mut self, name: &str) -> RegistryResult<()> {
        if self.web.remove(name).is_ok() {
            return Ok(());
        }
        self.ajax.remove(name).map(|_| ())
    }

    pub fn edit_web_route(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut WebRoute),
    ) -> RegistryResult<()> {
        edit(self.web.get_mut(name)?);
        Ok(())
    }

    pub fn edit_ajax_route(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut ActionRoute),
    ) -> RegistryResult<()> {
        edit(self.ajax.get_mut(name)?);
        Ok(())
    }

    /// Reverse-build the absolute URL of a named path route.
    pub fn route_url(
        &mut self,
        name: &str,
        args: &BTreeMap<String, String>,
    ) -> eyre::Result<String> {
        let base = self.options.base_url.clone().unwrap_or_default();
        match self.web.get(name)? {
            WebRoute::Path(route) => Ok(route.url(&base, args)?),
            WebRoute::Predicate(_) => Err(DispatchError::InvalidRouteType(name.to_string()).into()),
        }
    }

    /// Build the endpoint URL of a named ajax action route.
    pub fn ajax_url(
        &mut self,
        name: &str,
        args: &BTreeMap<String, Value>,
    ) -> eyre::Result<String> {
        let endpoint = self.options.ajax_endpoint.clone().unwrap_or_default();
        Ok(self.ajax.get(name)?.url(&endpoint, args))
    }

    // --- configure phase --------------------------------------------------

    /// Export the registered route set to the host: the rewrite-rule
    /// union with its content hash (flushing only when the hash
    /// changed), the query-variable allow-list, and the ajax
    /// registration points.
    pub fn configure(
        &mut self,
        rewrites: &mut dyn RewriteStore,
        query_vars: &mut dyn QueryVarSink,
        ajax: &mut dyn AjaxRegistrar,
    ) -> eyre::Result<()> {
        let mut rules: Vec<(String, String)> = Vec::new();
        let mut keys: Vec<String> = Vec::new();
        for (_, route) in self.web.iter() {
            if let WebRoute::Path(path_route) = route {
                rules.push(path_route.rewrite_rule()?);
                keys.extend(path_route.query_var_keys());
            }
        }
        keys.push(ROUTE_QUERY_VAR.to_string());
        keys.sort();
        keys.dedup();
        query_vars.register(&keys)?;

        let hash = rules_hash(&rules);
        let previous = rewrites.cached_hash();
        rewrites.publish(&rules, &hash)?;
        if previous.as_deref() != Some(hash.as_str()) {
            tracing::info!(rules = rules.len(), "rewrite rules changed, scheduling flush");
            rewrites.schedule_flush()?;
        }

        for (_, route) in self.ajax.iter() {
            ajax.register(route.action(), true);
            if !route.is_admin_only() {
                ajax.register(route.action(), false);
            }
        }

        tracing::info!(
            web_routes = self.web.len(),
            ajax_routes = self.ajax.len(),
            "router configured"
        );
        Ok(())
    }

    // --- dispatch phase ---------------------------------------------------

    /// Select the web route owning this request, if any. Returns a
    /// per-request clone; registered routes are never mutated during
    /// dispatch.
    pub fn resolve(&mut self, request: &RequestContext) -> eyre::Result<Option<WebRoute>> {
        if let Some(route_id) = request.route_id() {
            match self.web.get(route_id) {
                Ok(WebRoute::Path(route)) => {
                    tracing::debug!(route = %route_id, "resolved by explicit identifier");
                    return Ok(Some(WebRoute::Path(route.clone())));
                }
                Ok(WebRoute::Predicate(_)) => {
                    return Err(DispatchError::InvalidRouteType(route_id.to_string()).into());
                }
                // An unknown identifier falls through to the later
                // resolution strategies.
                Err(RegistryError::NotFound(_)) => {}
            }
        }

        for (_, route) in self.web.iter() {
            if let WebRoute::Predicate(predicate_route) = route
                && predicate_route.is_satisfied(request)?
            {
                tracing::debug!(route = %route.route_name(), "resolved by predicate");
                return Ok(Some(route.clone()));
            }
        }

        if self.options.handle_all_requests {
            let path = if request.path().is_empty() {
                "/"
            } else {
                request.path()
            };
            tracing::debug!(path = %path, "synthesizing catch-all route");
            return Ok(Some(WebRoute::Path(PathRoute::new(path))));
        }

        Ok(None)
    }

    /// Offline-match a path against registered path routes with their
    /// named matchers, in registration order. This is not part of
    /// request-time resolution precedence — rewrite matching happens on
    /// the host — but serves reverse/offline lookups and tooling.
    pub fn match_path(&mut self, path: &str) -> eyre::Result<Option<WebRoute>> {
        for (_, route) in self.web.iter() {
            if let WebRoute::Path(path_route) = route
                && path_route.matcher()?.is_match(path)
            {
                return Ok(Some(route.clone()));
            }
        }
        Ok(None)
    }

    /// Resolve and fully dispatch a web request: middleware pipeline,
    /// controller execution, response classification and delivery.
    pub fn dispatch(
        &mut self,
        request: &mut RequestContext,
        transport: &mut dyn ResponseTransport,
    ) -> eyre::Result<DispatchOutcome> {
        let Some(route) = self.resolve(request)? else {
            tracing::debug!(path = %request.path(), "no route for request");
            return Ok(DispatchOutcome::NotOurs);
        };
        self.dispatch_route(&route, request, transport)
    }

    fn dispatch_route(
        &self,
        route: &WebRoute,
        request: &mut RequestContext,
        transport: &mut dyn ResponseTransport,
    ) -> eyre::Result<DispatchOutcome> {
        let name = route.route_name();

        // Run phase: computed query-variables land on the request before
        // the pipeline sees it.
        if let WebRoute::Path(path_route) = route {
            for (key, value) in path_route.computed_query_vars() {
                request.set_query_var(key, value);
            }
        }

        let units = self.resolve_middleware(route.core().middleware())?;
        if let Some(value) = pipeline::run(request, &units, |_| Ok(None))? {
            let response = self.classify(&name, value)?;
            tracing::debug!(route = %name, variant = response.variant(), "pipeline short-circuited");
            transport.send(request, response)?;
            return Ok(DispatchOutcome::Handled);
        }

        // The query-manipulation hook fires before content resolution,
        // only for the main non-administrative query.
        if let WebRoute::Predicate(predicate_route) = route
            && let Some(hook) = predicate_route.query_hook()
            && !request.is_admin()
        {
            hook(request.query_vars_mut());
        }

        // Execute phase.
        let controller = match route.core().controller() {
            Some(controller) => Some(controller.clone()),
            None => self.discover_controller(request),
        };
        let Some(controller) = controller else {
            tracing::debug!(route = %name, "no controller; host default handling proceeds");
            return Ok(DispatchOutcome::NotOurs);
        };

        let mut bound = route.core().parameters().clone();
        if let WebRoute::Path(path_route) = route
            && let Some(extracted) = path_route.extract(request.path())?
        {
            for (key, value) in extracted {
                bound.insert(key, value.map(Value::String).unwrap_or(Value::Null));
            }
        }

        // Merge query-state with route-bound parameters; route-bound
        // values win on key collision.
        let mut params: Params = request.query_vars().clone();
        params.extend(bound);

        let value = self.invoke(&name, &controller, request, &params)?;
        let response = self.classify(&name, value)?;
        tracing::debug!(route = %name, variant = response.variant(), "route executed");
        transport.send(request, response)?;
        Ok(DispatchOutcome::Handled)
    }

    /// Dispatch an ajax-class request by its declared action name. An
    /// unknown action is not an error: this dispatcher simply does not
    /// own the request.
    pub fn dispatch_action(
        &mut self,
        request: &mut RequestContext,
        transport: &mut dyn ResponseTransport,
    ) -> eyre::Result<DispatchOutcome> {
        let Some(action) = request.action().map(str::to_string) else {
            return Ok(DispatchOutcome::NotOurs);
        };
        let route = match self.ajax.get(&action) {
            Ok(route) => route.clone(),
            Err(RegistryError::NotFound(_)) => return Ok(DispatchOutcome::NotOurs),
        };
        let name = route.route_name();

        let controller = route
            .core()
            .controller()
            .cloned()
            .ok_or_else(|| eyre::eyre!("ajax route '{name}' has no controller"))?;

        let units = self.resolve_middleware(route.core().middleware())?;
        let value = pipeline::run(request, &units, |req: &mut RequestContext| {
            let mut params: Params = req.query_vars().clone();
            params.extend(route.core().parameters().clone());
            self.invoke(&name, &controller, req, &params).map(Some)
        })?
        .unwrap_or_else(HandlerValue::null);

        let response = self.classify(&name, value)?;
        tracing::debug!(route = %name, variant = response.variant(), "ajax action executed");
        transport.send(request, response)?;
        Ok(DispatchOutcome::Handled)
    }

    // --- internals --------------------------------------------------------

    fn resolve_middleware(
        &self,
        entries: &[MiddlewareEntry],
    ) -> eyre::Result<Vec<Arc<dyn Middleware>>> {
        entries
            .iter()
            .map(|entry| match entry {
                MiddlewareEntry::Unit(unit) => Ok(unit.clone()),
                MiddlewareEntry::Named(middleware_name) => match &self.factory {
                    Some(factory) => factory.make_middleware(middleware_name),
                    None => Err(eyre::eyre!(
                        "no handler factory configured to resolve middleware '{middleware_name}'"
                    )),
                },
            })
            .collect()
    }

    fn discover_controller(&self, request: &RequestContext) -> Option<ControllerRef> {
        let discovery = self.discovery.as_ref()?;
        let class = discovery.matched(request).or_else(|| discovery.not_found())?;
        Some(ControllerRef::parse(&class))
    }

    fn invoke(
        &self,
        route_name: &str,
        controller: &ControllerRef,
        request: &RequestContext,
        params: &Params,
    ) -> eyre::Result<HandlerValue> {
        let result = match controller {
            ControllerRef::Handler(handler) => handler.call(request, params),
            ControllerRef::ClassMethod { class, method } => match &self.factory {
                Some(factory) => factory
                    .make_handler(class, method)
                    .and_then(|handler| handler.call(request, params)),
                None => Err(eyre::eyre!(
                    "no handler factory configured to construct '{class}::{method}'"
                )),
            },
        };
        result.map_err(|source| {
            RouteExecutionError {
                route: route_name.to_string(),
                source,
            }
            .into()
        })
    }

    fn classify(&self, route_name: &str, value: HandlerValue) -> eyre::Result<Response> {
        response::resolve(value).map_err(|source| {
            RouteExecutionError {
                route: route_name.to_string(),
                source: source.into(),
            }
            .into()
        })
    }
}

fn rules_hash(rules: &[(String, String)]) -> String {
    let mut hasher = Sha1::new();
    for (regex, target) in rules {
        hasher.update(regex.as_bytes());
        hasher.update(b"=");
        hasher.update(target.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    let mut hash = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hash, "{byte:02x}");
    }
    hash
}
