// Core university portal types:
// - Roles, principals and resource records
// - Configuration loading
// - Shared error types

// Export types module - Domain records and request payloads
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
