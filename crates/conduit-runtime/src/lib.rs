//! Call dispatch for tenant connector instances.
//!
//! ```text
//! caller -> Dispatcher -> AdapterRegistry -> ProviderAdapter (under RetryPolicy)
//!                      -> AuditStore::append -> caller
//! ```

pub mod dispatcher;
pub mod error;
pub mod health;
pub mod retry;

pub use dispatcher::{Dispatched, Dispatcher, Rejected};
pub use error::DispatchError;
pub use health::HealthReport;
pub use retry::{RetryDecision, RetryPolicy};
