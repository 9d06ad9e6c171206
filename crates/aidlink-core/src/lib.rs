//! Derived-state computations for the messaging core and dashboard.
//! Everything here is a pure function over snapshots (no I/O, no clocks),
//! so the folds are testable independent of the subscription transport.

pub mod stats;
pub mod timeline;
pub mod unread;
