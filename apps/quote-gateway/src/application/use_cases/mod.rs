//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod trigger_price_fetch;

pub use trigger_price_fetch::TriggerPriceFetchUseCase;
