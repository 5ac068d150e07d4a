//! Declarative configuration validation.
//!
//! Everything checked here is a configuration-time bug: patterns that do
//! not compile, unknown operator tokens, misplaced optional
//! placeholders, colliding route names. Failing the whole config load is
//! preferable to discovering these at dispatch time.
use std::collections::HashSet;

use url::Url;

use crate::{
    config::models::{ActionSpec, PredicateSpec, QueryVarSpec, RouteSpec, RouterConfig},
    core::{pattern, predicate::Operator},
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Unknown operator '{operator}' in predicate '{name}'")]
    UnknownOperator { name: String, operator: String },

    #[error("Duplicate route name: {name}")]
    DuplicateName { name: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Router configuration validator
pub struct RouterConfigValidator;

impl RouterConfigValidator {
    /// Validate the entire router configuration
    pub fn validate(config: &RouterConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Some(base_url) = &config.base_url
            && Url::parse(base_url).is_err()
        {
            errors.push(ValidationError::InvalidField {
                field: "base_url".to_string(),
                message: format!("'{base_url}' is not an absolute URL"),
            });
        }

        let mut seen_names = HashSet::new();
        for route in &config.routes {
            Self::validate_route(route, &mut errors);
            Self::check_name(route.name.as_deref(), &mut seen_names, &mut errors);
        }
        for predicate in &config.predicates {
            Self::validate_predicate(predicate, &mut errors);
            Self::check_name(predicate.name.as_deref(), &mut seen_names, &mut errors);
        }
        for action in &config.actions {
            Self::validate_action(action, &mut errors);
            let name = action.name.as_deref().unwrap_or(&action.action);
            Self::check_name(Some(name), &mut seen_names, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    fn validate_route(route: &RouteSpec, errors: &mut Vec<ValidationError>) {
        if route.pattern.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "routes.pattern".to_string(),
            });
            return;
        }

        if let Err(e) = pattern::compile(&route.pattern, &route.constraints) {
            errors.push(ValidationError::InvalidPattern {
                pattern: route.pattern.clone(),
                message: e.to_string(),
            });
        }

        for (key, value) in &route.query_vars {
            if let QueryVarSpec::MatchIndex(0) = value {
                errors.push(ValidationError::InvalidField {
                    field: format!("routes.query_vars.{key}"),
                    message: "capture-group ordinals start at 1".to_string(),
                });
            }
        }

        if let Some(controller) = &route.controller
            && controller.is_empty()
        {
            errors.push(ValidationError::InvalidField {
                field: format!("routes.{}.controller", route.pattern),
                message: "controller spec must not be empty".to_string(),
            });
        }
    }

    fn validate_predicate(predicate: &PredicateSpec, errors: &mut Vec<ValidationError>) {
        let name = predicate.name.clone().unwrap_or_else(|| "<unnamed>".to_string());

        if predicate.conditions.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("predicates.{name}.conditions"),
            });
        }

        for condition in &predicate.conditions {
            if Operator::parse(&condition.operator).is_err() {
                errors.push(ValidationError::UnknownOperator {
                    name: name.clone(),
                    operator: condition.operator.clone(),
                });
            }
        }
    }

    fn validate_action(action: &ActionSpec, errors: &mut Vec<ValidationError>) {
        if action.action.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "actions.action".to_string(),
            });
        }
        if action.controller.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("actions.{}.controller", action.action),
            });
        }
    }

    fn check_name(
        name: Option<&str>,
        seen: &mut HashSet<String>,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(name) = name else { return };
        if !seen.insert(name.to_string()) {
            errors.push(ValidationError::DuplicateName {
                name: name.to_string(),
            });
        }
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
