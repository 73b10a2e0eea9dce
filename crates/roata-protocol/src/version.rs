//! Versions reported in health summaries.

/// Current payload protocol version.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Service version.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
