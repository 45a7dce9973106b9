//! Shield platform: drives the settlement core over a record store.
//!
//! The platform owns nothing but configuration and event plumbing:
//! - Programs, reports, votes, split proposals and balances are records
//! - Every operation is one optimistic transaction, retried on conflict
//! - Committed operations publish [`PlatformEvent`]s to the [`EventBus`]
//!   and the append-only [`EventLog`]

pub mod balances;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod platform;
pub mod registry;

pub use config::PlatformConfig;
pub use error::PlatformError;
pub use events::{EventBus, EventLog, LoggedEvent, PlatformEvent};
pub use logging::init_logging;
pub use platform::Platform;
