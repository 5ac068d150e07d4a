//! Route pattern compilation.
//!
//! A pattern is an ordered mix of literal segments and `{name}` /
//! `{name?}` placeholders, optionally carrying per-parameter regex
//! constraints. Compilation produces two regular expressions from one
//! pattern: a *positional* form with numbered capture groups (the source
//! text handed to the host's rewrite-rule storage, which anchors it
//! itself) and a *named* form with named capture groups, `^`-anchored,
//! used for self-contained offline matching and parameter extraction.
//!
//! Literal segments are passed through as regex source text, so a pattern
//! may also embed raw groups directly (e.g. `product/([a-z0-9]+)`).
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Constraint applied to placeholders without an explicit regex.
pub const DEFAULT_PARAM_PATTERN: &str = r"[-\w]+";

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_-]*)(\?)?\}").expect("placeholder syntax regex is valid")
});

/// Errors raised while compiling a pattern or building a URL from it.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PatternError {
    /// Reverse URL building was asked for with required placeholders left
    /// unfilled. Carries every unfilled name, not just the first.
    #[error("missing argument: {}", .names.join(", "))]
    MissingArguments { names: Vec<String> },

    /// A placeholder name appears more than once in a single pattern.
    #[error("placeholder '{{{0}}}' appears more than once in pattern")]
    DuplicatePlaceholder(String),

    /// A required placeholder follows an optional one. Optional
    /// placeholders must be trailing; anything else is a configuration
    /// error rather than a pattern with defined match semantics.
    #[error("optional placeholder '{{{0}?}}' must be trailing in its pattern")]
    MisplacedOptional(String),

    /// A user-supplied constraint is not a valid regular expression.
    #[error("invalid constraint for '{name}': {source}")]
    InvalidConstraint {
        name: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// The assembled matcher failed to compile, usually because the
    /// pattern embeds broken raw regex text.
    #[error("pattern '{pattern}' does not compile: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Result type for pattern operations.
pub type PatternResult<T> = Result<T, PatternError>;

/// A named, optionally-absent parameter slot parsed out of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub optional: bool,
}

impl Placeholder {
    fn token(&self) -> String {
        if self.optional {
            format!("{{{}?}}", self.name)
        } else {
            format!("{{{}}}", self.name)
        }
    }
}

/// The derived, read-only artifact of a compiled pattern.
///
/// Holds the positional rewrite-rule source, the anchored named matcher
/// and the parameter list in declaration order. Instances are cached on
/// their route and rebuilt only when the source pattern or its
/// constraints change.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    positional: String,
    named: Regex,
    params: Vec<Placeholder>,
}

impl CompiledMatcher {
    /// The positional-mode regex source, terminated with `/?$` and left
    /// unanchored because the host anchors rewrite rules itself.
    pub fn rewrite_regex(&self) -> &str {
        &self.positional
    }

    /// Parameter slots in declaration order.
    pub fn params(&self) -> &[Placeholder] {
        &self.params
    }

    /// Test a candidate path against the named-mode matcher.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.named.is_match(candidate)
    }

    /// Apply the named-mode matcher and pull out every placeholder value.
    ///
    /// Returns `None` when the candidate does not match at all. On a
    /// match, every declared placeholder is present as a key; an optional
    /// placeholder whose group did not participate maps to `None` — "key
    /// present, value unset" is distinct from "key absent".
    pub fn extract(&self, candidate: &str) -> Option<BTreeMap<String, Option<String>>> {
        let caps = self.named.captures(candidate)?;

        let mut values = BTreeMap::new();
        for param in &self.params {
            let value = caps
                .name(&param.name)
                .map(|m| m.as_str().to_string());
            values.insert(param.name.clone(), value);
        }
        Some(values)
    }
}

/// Parse the placeholders out of a pattern in declaration order,
/// rejecting duplicate names and non-trailing optionals.
pub fn parse_placeholders(pattern: &str) -> PatternResult<Vec<Placeholder>> {
    let mut params: Vec<Placeholder> = Vec::new();
    let mut trailing_optional: Option<&str> = None;

    for caps in PLACEHOLDER_RE.captures_iter(pattern) {
        let name = &caps[1];
        let optional = caps.get(2).is_some();

        if params.iter().any(|p| p.name == name) {
            return Err(PatternError::DuplicatePlaceholder(name.to_string()));
        }
        if let Some(prior) = trailing_optional
            && !optional
        {
            return Err(PatternError::MisplacedOptional(prior.to_string()));
        }
        if optional {
            trailing_optional.get_or_insert(caps.get(1).map_or("", |m| m.as_str()));
        }

        params.push(Placeholder {
            name: name.to_string(),
            optional,
        });
    }

    Ok(params)
}

/// Compile a pattern plus its constraint map into a [`CompiledMatcher`].
pub fn compile(
    pattern: &str,
    constraints: &BTreeMap<String, String>,
) -> PatternResult<CompiledMatcher> {
    let params = parse_placeholders(pattern)?;

    for param in &params {
        if let Some(constraint) = constraints.get(&param.name)
            && let Err(source) = Regex::new(constraint)
        {
            return Err(PatternError::InvalidConstraint {
                name: param.name.clone(),
                source: Box::new(source),
            });
        }
    }

    let mut positional = pattern.to_string();
    for param in &params {
        let constraint = constraint_for(constraints, param);
        let token = param.token();
        if param.optional {
            // The non-capturing group swallows the leading separator so a
            // missing trailing segment drops cleanly.
            positional = positional.replace(&format!("/{token}"), &format!("(?:/({constraint}))?"));
            positional = positional.replace(&token, &format!("(?:({constraint}))?"));
        } else {
            positional = positional.replace(&token, &format!("({constraint})"));
        }
    }
    let positional = format!("{positional}/?$");

    let mut named_src = pattern.to_string();
    for param in &params {
        let constraint = constraint_for(constraints, param);
        let token = param.token();
        let group = format!("(?P<{}>{constraint})", param.name);
        if param.optional {
            named_src = named_src.replace(&format!("/{token}"), &format!("(?:/{group})?"));
            named_src = named_src.replace(&token, &format!("(?:{group})?"));
        } else {
            named_src = named_src.replace(&token, &group);
        }
    }
    let named_src = format!("^{named_src}/?$");

    let named = Regex::new(&named_src).map_err(|source| PatternError::InvalidPattern {
        pattern: pattern.to_string(),
        source: Box::new(source),
    })?;

    Ok(CompiledMatcher {
        positional,
        named,
        params,
    })
}

fn constraint_for<'c>(constraints: &'c BTreeMap<String, String>, param: &Placeholder) -> &'c str {
    constraints
        .get(&param.name)
        .map(String::as_str)
        .unwrap_or(DEFAULT_PARAM_PATTERN)
}

/// Substitute placeholder arguments into a pattern, producing a relative
/// URL path.
///
/// Required placeholders with no argument fail with
/// [`PatternError::MissingArguments`] naming every unfilled one. Optional
/// placeholders with no argument are dropped together with their leading
/// separator.
pub fn build_url(pattern: &str, args: &BTreeMap<String, String>) -> PatternResult<String> {
    let params = parse_placeholders(pattern)?;

    let mut out = pattern.to_string();
    let mut missing = Vec::new();

    for param in &params {
        let token = param.token();
        match args.get(&param.name) {
            Some(value) => {
                out = out.replace(&token, value);
            }
            None if param.optional => {
                out = out.replace(&format!("/{token}"), "");
                out = out.replace(&token, "");
            }
            None => missing.push(param.name.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(PatternError::MissingArguments { names: missing });
    }

    Ok(out)
}

/// One-shot convenience wrapper: compile `pattern` and extract parameters
/// from `candidate` in a single call.
pub fn extract_parameters(
    pattern: &str,
    constraints: &BTreeMap<String, String>,
    candidate: &str,
) -> PatternResult<Option<BTreeMap<String, Option<String>>>> {
    Ok(compile(pattern, constraints)?.extract(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_constraints() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_rewrite_regex_optional_placeholder() {
        let matcher = compile("product/{name?}", &no_constraints()).unwrap();
        assert_eq!(matcher.rewrite_regex(), r"product(?:/([-\w]+))?/?$");
    }

    #[test]
    fn test_rewrite_regex_with_constraint() {
        let mut constraints = BTreeMap::new();
        constraints.insert("name".to_string(), "[0-9]+".to_string());

        let matcher = compile("product/{name?}", &constraints).unwrap();
        assert_eq!(matcher.rewrite_regex(), "product(?:/([0-9]+))?/?$");
    }

    #[test]
    fn test_raw_regex_pattern_passes_through() {
        let matcher = compile("product/([a-zA-Z0-9]+)", &no_constraints()).unwrap();
        assert_eq!(matcher.rewrite_regex(), "product/([a-zA-Z0-9]+)/?$");
        assert!(matcher.params().is_empty());
    }

    #[test]
    fn test_named_matcher_accepts_and_rejects() {
        let matcher = compile("product/{name?}", &no_constraints()).unwrap();

        assert!(matcher.is_match("product"));
        assert!(matcher.is_match("product/chair"));
        assert!(matcher.is_match("product/chair/"));
        assert!(!matcher.is_match("product/chair/extra"));
        assert!(!matcher.is_match("catalog/product"));
    }

    #[test]
    fn test_extract_optional_present_and_absent() {
        let matcher = compile("product/{name?}", &no_constraints()).unwrap();

        let present = matcher.extract("product/chair").unwrap();
        assert_eq!(present.get("name"), Some(&Some("chair".to_string())));

        let absent = matcher.extract("product").unwrap();
        assert!(absent.contains_key("name"));
        assert_eq!(absent.get("name"), Some(&None));

        assert!(matcher.extract("nothing-here").is_none());
    }

    #[test]
    fn test_build_url_substitutes_arguments() {
        let mut args = BTreeMap::new();
        args.insert("name".to_string(), "chair".to_string());

        let url = build_url("product/{name}", &args).unwrap();
        assert_eq!(url, "product/chair");
    }

    #[test]
    fn test_build_url_drops_missing_optional_with_separator() {
        let url = build_url("product/{name?}", &BTreeMap::new()).unwrap();
        assert_eq!(url, "product");
    }

    #[test]
    fn test_build_url_reports_every_missing_required() {
        let err = build_url("blog/{year}/{slug}", &BTreeMap::new()).unwrap_err();
        match err {
            PatternError::MissingArguments { names } => {
                assert_eq!(names, vec!["year".to_string(), "slug".to_string()]);
            }
            other => panic!("expected MissingArguments, got {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_required_placeholders() {
        let pattern = "blog/{year}/{slug}";
        let mut args = BTreeMap::new();
        args.insert("year".to_string(), "2021".to_string());
        args.insert("slug".to_string(), "hello-world".to_string());

        let url = build_url(pattern, &args).unwrap();
        let extracted = extract_parameters(pattern, &no_constraints(), &url)
            .unwrap()
            .unwrap();

        for (key, value) in &args {
            assert_eq!(extracted.get(key), Some(&Some(value.clone())));
        }
    }

    #[test]
    fn test_duplicate_placeholder_rejected() {
        let err = compile("a/{x}/b/{x}", &no_constraints()).unwrap_err();
        assert!(matches!(err, PatternError::DuplicatePlaceholder(name) if name == "x"));
    }

    #[test]
    fn test_required_after_optional_rejected() {
        let err = compile("a/{x?}/{y}", &no_constraints()).unwrap_err();
        assert!(matches!(err, PatternError::MisplacedOptional(name) if name == "x"));
    }

    #[test]
    fn test_trailing_optionals_allowed() {
        let matcher = compile("archive/{year?}/{month?}", &no_constraints()).unwrap();
        assert!(matcher.is_match("archive"));
        assert!(matcher.is_match("archive/2021"));
        assert!(matcher.is_match("archive/2021/06"));
    }

    #[test]
    fn test_invalid_constraint_rejected() {
        let mut constraints = BTreeMap::new();
        constraints.insert("name".to_string(), "[unclosed".to_string());

        let err = compile("product/{name}", &constraints).unwrap_err();
        assert!(matches!(err, PatternError::InvalidConstraint { name, .. } if name == "name"));
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let first = compile("product/{name?}", &no_constraints()).unwrap();
        let second = compile("product/{name?}", &no_constraints()).unwrap();

        for candidate in ["product", "product/chair", "product/chair/extra", "other"] {
            assert_eq!(first.is_match(candidate), second.is_match(candidate));
        }
        assert_eq!(first.rewrite_regex(), second.rewrite_regex());
    }
}
