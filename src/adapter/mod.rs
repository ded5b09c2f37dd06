//! Adapters around the application services.

pub mod inbound;
pub mod outbound;
