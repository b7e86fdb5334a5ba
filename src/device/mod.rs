// src/device/mod.rs

//! The scheduler ("device").
//!
//! - [`partition`] holds the incomplete/complete split and the pure
//!   cascade-skip and touch propagations.
//! - [`scheduler`] holds the [`Device`] state machine.
//! - [`item_info`] provides per-item state and dispatch descriptors.
//! - [`device_step`] defines what each call into the device returns.

pub mod device_step;
pub mod item_info;
pub mod partition;
pub mod scheduler;

pub use device_step::{BuildReport, DeviceStep, FailedItem};
pub use item_info::{ItemState, ScheduledItem};
pub use partition::{Partition, cascade_skip, touch_forward};
pub use scheduler::Device;
