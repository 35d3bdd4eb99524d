//! # dexwatch-core
//!
//! Core library for dexwatch, shared by the host process and every window
//! process.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Each process runs its own
//!   event loop; cross-process interaction is serialized message passing.
//! - **Not thread-safe**: Callers provide their own synchronization
//!   (`Mutex` around a [`pipeline::Dispatcher`]).
//! - **Graceful degradation**: A missing or corrupt snapshot yields the
//!   compiled-in defaults, never an error.
//! - **Single writer**: The host's store is the only authority on state
//!   ordering; mirrors forward instead of applying.

pub mod catalog;
pub mod counts;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod profiles;
pub mod reducer;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use error::{CoreError, Result};
pub use pipeline::{ActionEnvelope, Delivery, DispatchOutcome, Dispatcher, StoreRole};
pub use snapshot::SnapshotGateway;
pub use storage::StorageConfig;
pub use store::Store;
