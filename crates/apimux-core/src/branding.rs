//! Centralized branding constants
//!
//! All product naming comes from this module.

/// Product name used in logs, headers, and user agents
pub const SERVICE_NAME: &str = "apimux";

/// Default TCP port for the gateway
pub const DEFAULT_GATEWAY_PORT: u16 = 8686;

/// Prefix under which proxied service routes are mounted (`/r/{routeIdentifier}/...`)
pub const ROUTE_PREFIX: &str = "/r/";

/// Prefix under which the gateway's own protocol endpoints are mounted
pub const PROTOCOL_PREFIX: &str = "/mux";

/// User agent for outbound HTTP calls
pub fn user_agent() -> String {
    format!("{}/{}", SERVICE_NAME, env!("CARGO_PKG_VERSION"))
}
