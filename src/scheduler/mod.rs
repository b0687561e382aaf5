//! Trigger scheduling for prayer and break alerts.
//!
//! This module turns wall-clock targets into durable, de-duplicated deferred
//! jobs. The system consists of four components:
//!
//! - [`TriggerEvent`] and [`TriggerTime`]: what fires and when
//! - [`TriggerScheduler`]: resolves targets, rolls elapsed ones forward by a
//!   day and submits them under a deduplicating name
//! - [`DeferredScheduler`] / [`TokioDeferredScheduler`]: the durable deferred
//!   execution facility behind the scheduler
//! - [`RearmCoordinator`]: the boot-time and daily pass that re-arms every
//!   recurring trigger
//!
//! # Durability
//!
//! Every submission is recorded in an on-disk job table before its timer
//! starts. After a restart, [`TokioDeferredScheduler::recover`] re-submits
//! the surviving entries with their remaining delay, so no armed trigger is
//! lost to a process death.

mod arm;
mod clock;
mod deferred;
mod rearm;
pub mod trigger;

pub use crate::scheduler::arm::{ScheduleError, TriggerScheduler};
pub use crate::scheduler::clock::{Clock, SystemClock};
pub use crate::scheduler::deferred::{DeferredScheduler, FireHandler, TokioDeferredScheduler};
pub use crate::scheduler::rearm::{RearmCoordinator, RearmReport};
pub use crate::scheduler::trigger::{TriggerEvent, TriggerTime};
