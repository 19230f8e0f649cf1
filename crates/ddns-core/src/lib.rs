// # ddns-core
//
// Core library for the NameSilo dynamic DNS reconcile agent.
//
// ## Architecture Overview
//
// - **RecordFetcher**: Reads the managed record and the caller's observed IP
// - **RecordUpdater**: Pushes a new value into the managed record
// - **Scheduler**: Source of poll and retry delays (swappable in tests)
// - **DdnsEngine**: Reconcile loop tying fetch, decision and update together
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from the provider wire format
// 2. **Explicit Configuration**: One immutable `DdnsConfig`, no globals
// 3. **Errors as Values**: Providers return typed errors, the engine decides to log and continue
// 4. **Library-First**: The loop can be embedded and cancelled from the outside
// 5. **Idempotency**: Pushing an unchanged value every cycle is safe

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, EngineConfig, ProviderConfig, RecordType};
pub use engine::{CycleOutcome, DdnsEngine, EngineEvent};
pub use error::{Error, FetchError, Result, UpdateError};
pub use record::{DnsRecordSnapshot, RecordSet, ResourceRecord, Target, UpdateReceipt};
pub use traits::{RecordFetcher, RecordUpdater, Scheduler, TokioScheduler};
pub use tokio_util::sync::CancellationToken;
