// Lookup layer: admission control, TTL cache, cached upstream fetch and
// multi-flavor vocabulary discovery.
// Handlers admit the client before touching the cache or the network.

pub mod cache;
pub mod discover;
pub mod fetch;
pub mod handlers;
pub mod rate_limit;
pub mod upstream;
