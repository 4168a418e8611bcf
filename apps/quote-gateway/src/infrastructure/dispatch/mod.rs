//! Trigger Dispatch Module
//!
//! Producer → channel → consumer wiring for price-fetch triggers.

mod channel;
mod dispatcher;

pub use channel::{
    DEFAULT_CHANNEL_CAPACITY, TriggerDelivery, TriggerReceiver, TriggerSender, trigger_channel,
};
pub use dispatcher::TriggerDispatcher;
