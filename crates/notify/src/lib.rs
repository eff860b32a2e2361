//! Live fan-out of ride events.
//!
//! [`NotificationHub`] keeps the set of open subscriptions and implements
//! [`waitwatch_core::EventSink`], so the registry can publish to it without
//! knowing who is listening.

pub mod hub;

pub use hub::{NotificationHub, Subscription};
