//! HTTP endpoints.
//!
//! Each sub-module owns one area; handlers are re-exported flat for
//! route registration in `router.rs`.

pub mod doc;
mod events;
mod health;
mod wait_times;

pub use events::events;
pub use health::health;
pub use wait_times::{park_wait_times, parks, wait_times, WaitTimeEntry};
