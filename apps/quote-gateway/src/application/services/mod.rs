//! Application Services
//!
//! Services that hold shared state between ports.
//!
//! - `CredentialCache`: Single-flight secret cache in front of the secret store

mod credential_cache;

pub use credential_cache::{CredentialCache, CredentialError};
