//! Domain models for the sync pipeline

mod record;
mod sync_state;

pub use record::{MessageId, MessageRecord, SheetRow};
pub use sync_state::SyncState;
