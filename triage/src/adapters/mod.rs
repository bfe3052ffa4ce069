//! Boundaries to the outside world
//!
//! - `source`: the mailbox capability the engine is handed
//! - `snapshot`: a file-backed mailbox for offline runs and tests
//! - `sqlite`: persistence for the suppression store

pub mod snapshot;
pub mod source;
pub mod sqlite;

pub use snapshot::{MailboxSnapshot, SnapshotSource, SnapshotThread};
pub use source::{SourceFuture, ThreadSource};
