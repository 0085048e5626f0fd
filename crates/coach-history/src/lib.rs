pub mod error;
pub mod storage;
pub mod store;
pub mod types;

pub use error::HistoryError;
pub use storage::{FileSlots, MemorySlots, SlotStorage};
pub use store::HistoryStore;
pub use types::{
    DayCount, HistoryDocument, HistoryFilter, HistoryStats, TopicCount, HISTORY_SLOT,
    HISTORY_VERSION,
};
