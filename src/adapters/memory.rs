//! In-memory adapters for the host ports.
//!
//! These back the test suite and the companion CLI; a real host glues
//! its own storage, transport and object construction behind the same
//! ports.
use std::{collections::HashMap, sync::Arc};

use eyre::Result;
use serde_json::Value;

use crate::{
    core::{
        controller::Handler,
        pipeline::Middleware,
        request::RequestContext,
        response::Response,
    },
    ports::{
        AjaxRegistrar, ControllerDiscovery, FactoryError, HandlerFactory, QueryVarSink,
        ResponseTransport, RewriteStore,
    },
};

/// Rewrite storage held in memory: keeps the last published rule union,
/// its hash, and counts flush requests.
#[derive(Debug, Default)]
pub struct MemoryRewriteStore {
    rules: Vec<(String, String)>,
    hash: Option<String>,
    flushes: usize,
}

impl MemoryRewriteStore {
    pub fn rules(&self) -> &[(String, String)] {
        &self.rules
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl RewriteStore for MemoryRewriteStore {
    fn cached_hash(&self) -> Option<String> {
        self.hash.clone()
    }

    fn publish(&mut self, rules: &[(String, String)], hash: &str) -> Result<()> {
        self.rules = rules.to_vec();
        self.hash = Some(hash.to_string());
        Ok(())
    }

    fn schedule_flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Query-variable allow-list held in memory.
#[derive(Debug, Default)]
pub struct MemoryQueryVars {
    keys: Vec<String>,
}

impl MemoryQueryVars {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl QueryVarSink for MemoryQueryVars {
    fn register(&mut self, keys: &[String]) -> Result<()> {
        for key in keys {
            if !self.keys.contains(key) {
                self.keys.push(key.clone());
            }
        }
        Ok(())
    }
}

/// Ajax registration points recorded as `(action, privileged)` pairs.
#[derive(Debug, Default)]
pub struct MemoryAjaxRegistrar {
    registered: Vec<(String, bool)>,
}

impl MemoryAjaxRegistrar {
    pub fn registered(&self) -> &[(String, bool)] {
        &self.registered
    }
}

impl AjaxRegistrar for MemoryAjaxRegistrar {
    fn register(&mut self, action: &str, privileged: bool) {
        self.registered.push((action.to_string(), privileged));
    }
}

/// Transport that records what was sent instead of emitting bytes.
///
/// Each sent response is summarized as `(variant, body, status)`; JSON
/// payloads are additionally kept verbatim. Callback responses are
/// executed at send time, matching their deferred contract.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Vec<(String, Option<String>, Option<u16>)>,
    json: Vec<Value>,
}

impl RecordingTransport {
    pub fn sent(&self) -> &[(String, Option<String>, Option<u16>)] {
        &self.sent
    }

    pub fn sent_json(&self) -> &[Value] {
        &self.json
    }
}

impl ResponseTransport for RecordingTransport {
    fn send(&mut self, request: &RequestContext, response: Response) -> Result<()> {
        match response {
            Response::Text { source, status } => {
                self.sent
                    .push(("text".to_string(), Some(source.render()), status));
            }
            Response::Json { payload, status } => {
                self.sent
                    .push(("json".to_string(), Some(payload.to_string()), status));
                self.json.push(payload);
            }
            Response::Callback(callback) => {
                callback(request)?;
                self.sent.push(("callback".to_string(), None, None));
            }
            Response::Redirect { url, status } => {
                self.sent
                    .push(("redirect".to_string(), Some(url), Some(status)));
            }
            Response::Error {
                message, status, ..
            } => {
                self.sent.push(("error".to_string(), Some(message), status));
            }
            Response::Void => {
                self.sent.push(("void".to_string(), None, None));
            }
        }
        Ok(())
    }
}

/// Discovery stub returning fixed class names.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    matched: Option<String>,
    not_found: Option<String>,
}

impl StaticDiscovery {
    pub fn new(matched: Option<&str>, not_found: Option<&str>) -> Self {
        Self {
            matched: matched.map(str::to_string),
            not_found: not_found.map(str::to_string),
        }
    }
}

impl ControllerDiscovery for StaticDiscovery {
    fn matched(&self, _request: &RequestContext) -> Option<String> {
        self.matched.clone()
    }

    fn not_found(&self) -> Option<String> {
        self.not_found.clone()
    }
}

/// Handler factory backed by maps of pre-registered handlers and
/// middleware, keyed the way the router asks for them.
#[derive(Default)]
pub struct StaticHandlerFactory {
    handlers: HashMap<(String, String), Arc<dyn Handler>>,
    middleware: HashMap<String, Arc<dyn Middleware>>,
}

impl StaticHandlerFactory {
    pub fn with_handler(
        mut self,
        class: &str,
        method: &str,
        handler: impl Handler + 'static,
    ) -> Self {
        self.handlers
            .insert((class.to_string(), method.to_string()), Arc::new(handler));
        self
    }

    pub fn with_middleware(mut self, name: &str, middleware: impl Middleware + 'static) -> Self {
        self.middleware
            .insert(name.to_string(), Arc::new(middleware));
        self
    }
}

impl HandlerFactory for StaticHandlerFactory {
    fn make_handler(&self, class: &str, method: &str) -> Result<Arc<dyn Handler>> {
        self.handlers
            .get(&(class.to_string(), method.to_string()))
            .cloned()
            .ok_or_else(|| FactoryError::UnknownClass(format!("{class}::{method}")).into())
    }

    fn make_middleware(&self, name: &str) -> Result<Arc<dyn Middleware>> {
        self.middleware
            .get(name)
            .cloned()
            .ok_or_else(|| FactoryError::UnknownMiddleware(name.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::{controller::Params, response::HandlerValue};

    #[test]
    fn test_rewrite_store_round_trip() {
        let mut store = MemoryRewriteStore::default();
        assert_eq!(store.cached_hash(), None);

        let rules = vec![("a/?$".to_string(), "index.php?x=1".to_string())];
        store.publish(&rules, "abc123").unwrap();
        store.schedule_flush().unwrap();

        assert_eq!(store.cached_hash().as_deref(), Some("abc123"));
        assert_eq!(store.rules(), &rules[..]);
        assert_eq!(store.flushes(), 1);
    }

    #[test]
    fn test_query_var_sink_deduplicates() {
        let mut sink = MemoryQueryVars::default();
        sink.register(&["a".to_string(), "b".to_string()]).unwrap();
        sink.register(&["b".to_string(), "c".to_string()]).unwrap();

        assert_eq!(sink.keys(), &["a", "b", "c"]);
    }

    #[test]
    fn test_recording_transport_executes_callbacks() {
        let mut transport = RecordingTransport::default();
        let request = RequestContext::new("x");

        transport
            .send(
                &request,
                Response::Callback(Box::new(|req: &RequestContext| {
                    assert_eq!(req.path(), "x");
                    Ok(())
                })),
            )
            .unwrap();

        assert_eq!(transport.sent()[0].0, "callback");
    }

    #[test]
    fn test_static_factory_reports_unknown_names() {
        let factory = StaticHandlerFactory::default().with_handler(
            "ProductController",
            "show",
            |_: &RequestContext, _: &Params| Ok(HandlerValue::from(json!({}))),
        );

        assert!(factory.make_handler("ProductController", "show").is_ok());
        let err = factory.make_handler("Missing", "run").err().unwrap();
        assert!(err.downcast_ref::<FactoryError>().is_some());
    }
}
