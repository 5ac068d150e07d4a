//! Response variants and handler-value classification.
//!
//! Handlers return heterogeneous values; the resolver normalizes them
//! into a closed set of response variants through a strict priority
//! chain. Renderability is checked before the generic array/object case
//! on purpose: a renderable is also "an object", and the chain order is
//! what keeps it a Text response.
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::core::request::RequestContext;

/// An object that can produce text output, e.g. a prepared template or
/// view wrapper supplied by the host.
pub trait Render: Send + Sync {
    fn render(&self) -> String;
}

/// Deferred response body, executed by the transport at send time.
pub type ResponseCallback = Box<dyn FnOnce(&RequestContext) -> eyre::Result<()> + Send>;

/// Body of a Text response: either an owned string or a renderable
/// object whose output is produced at send time.
pub enum TextSource {
    Plain(String),
    Renderable(Box<dyn Render>),
}

impl TextSource {
    /// Materialize the text body.
    pub fn render(&self) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::Renderable(renderable) => renderable.render(),
        }
    }
}

impl fmt::Debug for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(text) => f.debug_tuple("Plain").field(text).finish(),
            Self::Renderable(_) => f.write_str("Renderable(..)"),
        }
    }
}

/// The closed set of normalized dispatch outcomes. Exactly one variant
/// is produced per successfully completed dispatch.
pub enum Response {
    Text {
        source: TextSource,
        status: Option<u16>,
    },
    Json {
        payload: Value,
        status: Option<u16>,
    },
    Callback(ResponseCallback),
    Redirect {
        url: String,
        status: u16,
    },
    Error {
        message: String,
        title: Option<String>,
        status: Option<u16>,
    },
    Void,
}

impl Response {
    pub fn text(source: impl Into<String>) -> Self {
        Self::Text {
            source: TextSource::Plain(source.into()),
            status: None,
        }
    }

    pub fn text_with_status(source: impl Into<String>, status: u16) -> Self {
        Self::Text {
            source: TextSource::Plain(source.into()),
            status: Some(status),
        }
    }

    pub fn json(payload: Value) -> Self {
        Self::Json {
            payload,
            status: None,
        }
    }

    pub fn json_with_status(payload: Value, status: u16) -> Self {
        Self::Json {
            payload,
            status: Some(status),
        }
    }

    /// Temporary redirect (302).
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect {
            url: url.into(),
            status: 302,
        }
    }

    pub fn redirect_with_status(url: impl Into<String>, status: u16) -> Self {
        Self::Redirect {
            url: url.into(),
            status,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            title: None,
            status: None,
        }
    }

    /// The status code carried by this variant, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Text { status, .. } | Self::Json { status, .. } | Self::Error { status, .. } => {
                *status
            }
            Self::Redirect { status, .. } => Some(*status),
            Self::Callback(_) | Self::Void => None,
        }
    }

    /// Stable variant label used in logs and tests.
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Json { .. } => "json",
            Self::Callback(_) => "callback",
            Self::Redirect { .. } => "redirect",
            Self::Error { .. } => "error",
            Self::Void => "void",
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { source, status } => f
                .debug_struct("Text")
                .field("source", source)
                .field("status", status)
                .finish(),
            Self::Json { payload, status } => f
                .debug_struct("Json")
                .field("payload", payload)
                .field("status", status)
                .finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Redirect { url, status } => f
                .debug_struct("Redirect")
                .field("url", url)
                .field("status", status)
                .finish(),
            Self::Error {
                message,
                title,
                status,
            } => f
                .debug_struct("Error")
                .field("message", message)
                .field("title", title)
                .field("status", status)
                .finish(),
            Self::Void => f.write_str("Void"),
        }
    }
}

/// Raw handler return value, prior to classification.
pub enum HandlerValue {
    /// Already a response variant.
    Response(Response),
    /// An object exposing a render capability.
    Renderable(Box<dyn Render>),
    /// An invocable unit, deferred to send time.
    Callback(ResponseCallback),
    /// Any JSON-shaped value: strings, arrays, objects, null, numbers,
    /// booleans. Which of these actually resolve is the resolver's call.
    Value(Value),
}

impl HandlerValue {
    /// The empty handler result.
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    pub fn renderable(renderable: impl Render + 'static) -> Self {
        Self::Renderable(Box::new(renderable))
    }

    pub fn callback(
        callback: impl FnOnce(&RequestContext) -> eyre::Result<()> + Send + 'static,
    ) -> Self {
        Self::Callback(Box::new(callback))
    }
}

impl fmt::Debug for HandlerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Self::Renderable(_) => f.write_str("Renderable(..)"),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<Response> for HandlerValue {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<Value> for HandlerValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for HandlerValue {
    fn from(text: String) -> Self {
        Self::Value(Value::String(text))
    }
}

impl From<&str> for HandlerValue {
    fn from(text: &str) -> Self {
        Self::Value(Value::String(text.to_string()))
    }
}

/// Error raised when a handler value falls outside the closed variant
/// set.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("handler returned an unresolvable {0} value")]
    Unresolvable(&'static str),
}

/// Classify a raw handler value into a response variant.
///
/// Total over its input, tested as a strict priority chain: an existing
/// response passes through; strings and renderables become Text;
/// invocables become Callback; arrays and plain objects become Json;
/// null becomes Void; everything else is an error.
pub fn resolve(value: HandlerValue) -> Result<Response, ResolveError> {
    match value {
        HandlerValue::Response(response) => Ok(response),
        HandlerValue::Value(Value::String(text)) => Ok(Response::text(text)),
        HandlerValue::Renderable(source) => Ok(Response::Text {
            source: TextSource::Renderable(source),
            status: None,
        }),
        HandlerValue::Callback(callback) => Ok(Response::Callback(callback)),
        HandlerValue::Value(payload @ (Value::Array(_) | Value::Object(_))) => {
            Ok(Response::json(payload))
        }
        HandlerValue::Value(Value::Null) => Ok(Response::Void),
        HandlerValue::Value(Value::Number(_)) => Err(ResolveError::Unresolvable("number")),
        HandlerValue::Value(Value::Bool(_)) => Err(ResolveError::Unresolvable("boolean")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Widget;

    impl Render for Widget {
        fn render(&self) -> String {
            "<widget/>".to_string()
        }
    }

    #[test]
    fn test_existing_response_passes_through() {
        let resolved = resolve(HandlerValue::from(Response::text_with_status("hi", 201))).unwrap();
        assert_eq!(resolved.variant(), "text");
        assert_eq!(resolved.status(), Some(201));
    }

    #[test]
    fn test_string_becomes_text() {
        let resolved = resolve(HandlerValue::from("hello")).unwrap();
        assert_eq!(resolved.variant(), "text");
    }

    #[test]
    fn test_renderable_becomes_text_not_json() {
        let resolved = resolve(HandlerValue::renderable(Widget)).unwrap();
        match resolved {
            Response::Text { source, .. } => assert_eq!(source.render(), "<widget/>"),
            other => panic!("expected Text, got {other:?}"),
        }
    }

    #[test]
    fn test_callback_is_deferred() {
        let resolved = resolve(HandlerValue::callback(|_| Ok(()))).unwrap();
        assert_eq!(resolved.variant(), "callback");
    }

    #[test]
    fn test_arrays_and_objects_become_json() {
        let resolved = resolve(HandlerValue::from(json!(["a", 1]))).unwrap();
        assert_eq!(resolved.variant(), "json");

        let resolved = resolve(HandlerValue::from(json!({"a": 1}))).unwrap();
        assert_eq!(resolved.variant(), "json");
    }

    #[test]
    fn test_null_becomes_void() {
        let resolved = resolve(HandlerValue::null()).unwrap();
        assert_eq!(resolved.variant(), "void");
    }

    #[test]
    fn test_bare_scalars_are_unresolvable() {
        assert!(matches!(
            resolve(HandlerValue::from(json!(42))),
            Err(ResolveError::Unresolvable("number"))
        ));
        assert!(matches!(
            resolve(HandlerValue::from(json!(true))),
            Err(ResolveError::Unresolvable("boolean"))
        ));
    }

    #[test]
    fn test_redirect_defaults_to_302() {
        assert_eq!(Response::redirect("https://example.org").status(), Some(302));
    }
}
