//! Scheduling Module
//!
//! Cron-driven timers: the price-fetch trigger scheduler and the credential
//! cache eviction timer.

mod cron;
mod eviction;
mod price_fetch;

pub use cron::{CronSchedule, ScheduleError, run_schedule};
pub use eviction::CacheEvictionTimer;
pub use price_fetch::TriggerScheduler;
