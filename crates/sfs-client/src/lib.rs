//! sfs-client: the SentinelFS client protocol
//!
//! Every call on a [`User`] runs inside [`User::transact`]: re-fetch the
//! authoritative user record, resolve filename → sentinel → metadata through
//! the access verification chain, do the work, republish what changed.
//!
//! ```text
//! user record ──filename hash──▶ sentinel { user → wrapped metadata key, owner-signed lock }
//!                                   │
//!                                   ▼
//!                                metadata { access graph, content keys, block ids }  signed by last modifier
//!                                   │
//!                                   ▼
//!                                content blocks                                      MAC'd with content MAC key
//! ```
//!
//! There is no atomicity across records: concurrent handles race with
//! last-writer-wins per record.

pub mod access;
pub mod backend;
mod chain;
mod files;
pub mod records;
mod revoke;
mod share;
pub mod token;
pub mod user;

pub use access::AccessGraph;
pub use backend::Backend;
pub use records::{ContentBlock, FilePointer, Metadata, Sentinel, UserRecord};
pub use token::{CapabilityToken, Envelope};
pub use user::{Session, User};
