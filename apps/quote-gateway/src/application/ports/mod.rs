//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `SecretStorePort`: Remote secret store lookups
//! - `QuoteProviderPort`: Third-party quote providers
//! - `FetchServicePort`: Price-fetch work run per trigger
//!
//! ## Driver Ports (Inbound)
//!
//! - `TriggerChannelPort`: Hand-off from trigger producers to the dispatcher

mod fetch_service_port;
mod quote_provider_port;
mod secret_store_port;
mod trigger_channel_port;

pub use fetch_service_port::{FetchError, FetchServicePort, NoOpFetchService};
pub use quote_provider_port::{ProviderError, QuoteProvider, QuoteProviderPort};
#[cfg(test)]
pub use secret_store_port::MockSecretStorePort;
pub use secret_store_port::{SecretStoreError, SecretStorePort};
pub use trigger_channel_port::{DispatchError, TriggerChannelPort};
