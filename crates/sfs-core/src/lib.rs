pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use error::{SfsError, SfsResult};
pub use types::{KeyRole, RecordId, RECORD_ID_SIZE};
