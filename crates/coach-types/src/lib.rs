mod catalog;
mod types;

pub use catalog::{find_sub_topic, find_topic, topics};
pub use types::{
    ChatMessage, ChatRole, Difficulty, RecordKind, SessionConfig, SessionRecord,
    StructuredFeedback, SubTopic, Topic, DEFAULT_ROLE,
};
