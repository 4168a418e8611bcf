//! Data Transfer Objects (DTOs)
//!
//! DTOs are used for API boundaries and use case outputs.

mod trigger_dto;

pub use trigger_dto::{PriceFetchTriggerResponse, TriggerStatus};
