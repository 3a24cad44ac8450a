//! Append-only audit log
//!
//! Every create, update and delete performed through the services is written
//! to `audit.log` as one JSON object per line, with the entity's state
//! before and after and a short field diff for updates.

mod diff;
mod entry;
mod logger;

pub use diff::{generate_detailed_diff, generate_diff};
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
