//! # conduit-audit
//!
//! Append-only audit trail for Conduit dispatches.
//!
//! Every dispatch, executed or rejected, produces exactly one
//! [`AuditRecord`] describing its final outcome. The records feed the
//! metrics dashboards, which order them by their own `created_at`
//! timestamp rather than by arrival order.
//!
//! ## Outcomes
//!
//! | Outcome | Description |
//! |---------|-------------|
//! | `completed` | Upstream answered; status copied from the final attempt |
//! | `fault` | Adapter raised (bad stored configuration, transport failure) |
//! | `timed_out` | Caller deadline exceeded mid-dispatch |
//! | `rejected` | Dispatch never started (unknown instance, inactive, unknown provider) |
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use conduit_audit::{AuditQuery, AuditRecord, AuditStore, CallOutcome, MemoryAuditStore};
//! use conduit_core::HttpMethod;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryAuditStore::new();
//! let org = Uuid::new_v4();
//! let instance = Uuid::new_v4();
//!
//! store
//!     .append(
//!         AuditRecord::builder(org, instance, "charges", HttpMethod::Post)
//!             .status_code(200)
//!             .response_time_ms(42)
//!             .outcome(CallOutcome::Completed)
//!             .build(),
//!     )
//!     .await?;
//!
//! let recent = store
//!     .query(&AuditQuery::for_instances(org, vec![instance]).newest_first().limit(20))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod query;
pub mod record;
pub mod storage;

pub use error::AuditError;
pub use query::AuditQuery;
pub use record::{AuditRecord, AuditRecordBuilder, CallOutcome};
pub use storage::{create_storage, AuditStore, FileAuditStore, MemoryAuditStore};
