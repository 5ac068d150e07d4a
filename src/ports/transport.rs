//! Ports for response delivery and ajax transport registration.
use eyre::Result;

use crate::core::{request::RequestContext, response::Response};

/// ResponseTransport defines the port that delivers a resolved response
/// to the client. Invoked exactly once per completed dispatch.
pub trait ResponseTransport {
    fn send(&mut self, request: &RequestContext, response: Response) -> Result<()>;
}

/// AjaxRegistrar defines the port for the host's admin/ajax transport:
/// each action route announces a privileged registration point and —
/// unless marked admin-only — an unprivileged one.
pub trait AjaxRegistrar {
    fn register(&mut self, action: &str, privileged: bool);
}
