//! Conversation memory: token-bounded chunking and the persisted log

mod chunker;
mod store;

pub use chunker::split_into_chunks;
pub use store::{MemoryRecord, MemoryStore};
