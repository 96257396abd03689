//! # LearnHub Lifecycle Engine
//!
//! The time-driven core of the platform: it keeps the derived status of
//! events and live sessions in step with the clock, sends scheduled
//! reminders exactly once per (event, lead time), validates attendance
//! check-ins, and fans notifications out to large audiences without
//! materializing them.
//!
//! ## Components
//!
//! - [`checkin::CheckInGuard`]: converts scanned codes into exactly-once
//!   attendance records
//! - [`reminder::ReminderDeduper`]: ledger-gated pre-event reminders
//! - [`fanout::NotificationFanout`]: batched, push-isolated delivery
//! - [`reconcile::LifecycleReconciler`]: detects status transitions
//! - [`scheduler::Scheduler`]: periodic background ticks driving the above
//!
//! The engine talks to the rest of the system only through the ports in
//! [`ports`], [`push`] and [`rooms`]; Postgres-backed implementations live in
//! the `learnhub-db` crate, mockall doubles in [`mock`].

/// Check-in validation and the in-process scan cooldown cache
pub mod checkin;
/// Opaque check-in code encoding and decoding
pub mod codec;
/// Audience-wide notification creation and best-effort push
pub mod fanout;
/// Mock implementations of the engine ports for testing
pub mod mock;
/// Storage and directory contracts consumed by the engine
pub mod ports;
/// Real-time push channel contract and in-process implementation
pub mod push;
/// Lifecycle status reconciliation over events and sessions
pub mod reconcile;
/// Deduplicated pre-event reminder sweeps
pub mod reminder;
/// Meeting room provisioning contract
pub mod rooms;
/// Periodic background tick scheduling
pub mod scheduler;
