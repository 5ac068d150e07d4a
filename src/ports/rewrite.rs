//! Ports for the host's URL-rewrite storage and query-variable
//! allow-list.
use eyre::Result;

/// RewriteStore defines the port (interface) for persisting the union of
/// compiled rewrite rules.
///
/// The router publishes the rules together with a content hash; the host
/// keeps both and is asked to rebuild its rewrite machinery only when
/// the hash changed since the last configure pass.
pub trait RewriteStore {
    /// The content hash from the previous publish, if any.
    fn cached_hash(&self) -> Option<String>;

    /// Persist the rule union and its content hash. Rules arrive in
    /// registration order as `(regex, target_query_string)` pairs.
    fn publish(&mut self, rules: &[(String, String)], hash: &str) -> Result<()>;

    /// Ask the host to rebuild its rewrite storage. Called only when the
    /// published hash differs from the cached one.
    fn schedule_flush(&mut self) -> Result<()>;
}

/// QueryVarSink defines the port for announcing query-variable keys to
/// the host's allow-list.
pub trait QueryVarSink {
    fn register(&mut self, keys: &[String]) -> Result<()>;
}
