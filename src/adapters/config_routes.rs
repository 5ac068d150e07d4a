//! Build a router from declarative configuration.
use crate::{
    config::models::{QueryVarSpec, RouterConfig},
    core::{
        controller::ControllerRef,
        pipeline::MiddlewareEntry,
        router::{Router, RouterOptions},
    },
};

/// Construct a [`Router`] and register every route the configuration
/// declares, in declaration order. Host ports (discovery, factory) are
/// attached by the caller afterwards.
pub fn build_router(config: &RouterConfig) -> Router {
    let mut router = Router::new(RouterOptions {
        base_url: config.base_url.clone(),
        ajax_endpoint: config.ajax_endpoint.clone(),
        handle_all_requests: config.handle_all_requests,
    });
    apply(config, &mut router);
    router
}

/// Register the configuration's routes on an existing router.
pub fn apply(config: &RouterConfig, router: &mut Router) {
    for spec in &config.routes {
        let route = router.add_route(spec.pattern.clone());
        if let Some(name) = &spec.name {
            route.name(name.clone());
        }
        if let Some(controller) = &spec.controller {
            route.controller(ControllerRef::parse(controller));
        }
        route.constrain_map(spec.constraints.clone());
        for (key, value) in &spec.query_vars {
            match value {
                QueryVarSpec::Literal(literal) => {
                    route.query_var(key.clone(), literal.clone());
                }
                QueryVarSpec::MatchIndex(index) => {
                    route.query_var_match(key.clone(), *index);
                }
            }
        }
        for middleware in &spec.middleware {
            route.middleware(MiddlewareEntry::named(middleware.clone()));
        }
        for (key, value) in &spec.parameters {
            route.parameter(key.clone(), value.clone());
        }
    }

    for spec in &config.predicates {
        let route = router.add_predicate_route(spec.conditions.clone());
        if let Some(name) = &spec.name {
            route.name(name.clone());
        }
        if let Some(controller) = &spec.controller {
            route.controller(ControllerRef::parse(controller));
        }
        for middleware in &spec.middleware {
            route.middleware(MiddlewareEntry::named(middleware.clone()));
        }
        for (key, value) in &spec.parameters {
            route.parameter(key.clone(), value.clone());
        }
    }

    for spec in &config.actions {
        let route = router.ajax(spec.action.clone(), ControllerRef::parse(&spec.controller));
        if let Some(name) = &spec.name {
            route.name(name.clone());
        }
        route.admin_only(spec.admin_only);
        for middleware in &spec.middleware {
            route.middleware(MiddlewareEntry::named(middleware.clone()));
        }
    }

    tracing::debug!(
        routes = config.routes.len(),
        predicates = config.predicates.len(),
        actions = config.actions.len(),
        "registered declarative routes"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::{ActionSpec, PredicateSpec, RouteSpec};

    #[test]
    fn test_build_router_registers_every_kind() {
        let config = RouterConfig {
            base_url: Some("http://example.org".to_string()),
            routes: vec![RouteSpec {
                pattern: "product/{name?}".to_string(),
                name: Some("product.show".to_string()),
                controller: Some("ProductController::show".to_string()),
                constraints: Default::default(),
                query_vars: Default::default(),
                middleware: Vec::new(),
                parameters: Default::default(),
            }],
            predicates: vec![PredicateSpec {
                name: Some("search".to_string()),
                ..PredicateSpec::default()
            }],
            actions: vec![ActionSpec {
                action: "refresh_cart".to_string(),
                controller: "CartController".to_string(),
                name: None,
                admin_only: true,
                middleware: Vec::new(),
            }],
            ..RouterConfig::default()
        };

        let mut router = build_router(&config);
        assert!(router.has_route("product.show"));
        assert!(router.has_route("search"));
        assert!(router.has_route("refresh_cart"));
        assert!(router.get_ajax_route("refresh_cart").unwrap().is_admin_only());
    }
}
