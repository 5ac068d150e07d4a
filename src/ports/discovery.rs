//! Port for host-driven controller discovery.
use crate::core::request::RequestContext;

/// ControllerDiscovery defines the port consulted only when a matched
/// route carries no explicit controller. Implementations typically map
/// host content-type metadata onto a controller class hierarchy; that
/// heuristic lives entirely on the host side of this boundary.
pub trait ControllerDiscovery: Send + Sync {
    /// The controller class name matching the current request, if any.
    fn matched(&self, request: &RequestContext) -> Option<String>;

    /// The fallback not-found controller class name, if one is
    /// configured.
    fn not_found(&self) -> Option<String>;
}
