//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`RecordFetcher`]: Read the managed record and observed IP from the registrar
//! - [`RecordUpdater`]: Push a new value into the managed record
//! - [`Scheduler`]: Delays used by the reconcile loop

pub mod dns_provider;
pub mod scheduler;

pub use dns_provider::{RecordFetcher, RecordUpdater};
pub use scheduler::{Scheduler, TokioScheduler};
