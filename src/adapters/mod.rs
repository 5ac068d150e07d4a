pub mod config_routes;
pub mod memory;
pub mod middleware;

/// Re-export commonly used types from adapters
pub use config_routes::build_router;
pub use memory::{
    MemoryAjaxRegistrar, MemoryQueryVars, MemoryRewriteStore, RecordingTransport, StaticDiscovery,
    StaticHandlerFactory,
};
pub use middleware::{AuthGuard, RequestId, RequestTiming};
