//! Domain Layer - Core credential and trigger types.
//!
//! This layer contains the value types shared by the credential cache and
//! the trigger pipeline. Nothing here performs I/O.

/// Secret identity, cache keys and redacted secret values.
pub mod credentials;

/// Price-fetch trigger events.
pub mod trigger;
