//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (secret store, providers, trigger hand-off).
pub mod ports;

/// Application services (credential cache).
pub mod services;

/// Use cases driven by the HTTP surface.
pub mod use_cases;

/// Response payloads returned by use cases.
pub mod dto;
