//! sfs-storage: the untrusted collaborators of the SentinelFS client
//!
//! - [`BlobStore`]: id-addressed byte records; may read, corrupt, delete, swap, or replay anything
//! - [`KeyDirectory`]: write-once public key entries, readable by anyone
//!
//! The in-memory backends are shared through `Arc` by every client handle.
//! [`tamper`] perturbs a [`MemoryBlobStore`] the way a hostile server would.

pub mod blob;
pub mod directory;
pub mod tamper;

pub use blob::{BlobStore, MemoryBlobStore};
pub use directory::{KeyDirectory, MemoryDirectory};
pub use tamper::{Snapshot, TamperAction};
