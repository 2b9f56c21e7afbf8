// Domain-specific error types
pub mod errors;

// Port interfaces
pub mod ports;

// Supported token registry
pub mod tokens;

// Price series and forecast value types
pub mod types;
