//! Link resolution: hop chains, login gates, and terminal gateways

pub mod gateway;
pub mod hop;
pub mod sid;

pub use gateway::{GatewayResolution, GatewayResolver};
pub use hop::{HopKind, HopResolver, classify};
pub use sid::resolve_sid_redirect;
