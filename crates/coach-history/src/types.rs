use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coach_types::{
    find_topic, ChatMessage, RecordKind, SessionConfig, SessionRecord, SubTopic, Topic,
};

/// Slot key holding the whole history document
pub const HISTORY_SLOT: &str = "interviewPrepHistory";

/// Current version of the stored document
pub const HISTORY_VERSION: u32 = 1;

/// On-disk shape of the history slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub version: u32,
    pub records: Vec<SessionRecord>,
}

/// Accepts the versioned document and the older bare-array layout.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredHistory {
    Versioned(HistoryDocument),
    Legacy(Vec<LegacyRecord>),
}

impl StoredHistory {
    pub(crate) fn into_records(self) -> Vec<SessionRecord> {
        match self {
            StoredHistory::Versioned(doc) => doc.records,
            StoredHistory::Legacy(records) => records.into_iter().map(Into::into).collect(),
        }
    }
}

/// One entry of a bare-array slot: either a tagged record or an untagged
/// interview written before records carried a `kind`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum LegacyRecord {
    Tagged(SessionRecord),
    Untagged(UntaggedInterview),
}

impl From<LegacyRecord> for SessionRecord {
    fn from(record: LegacyRecord) -> Self {
        match record {
            LegacyRecord::Tagged(record) => record,
            LegacyRecord::Untagged(old) => old.into_record(),
        }
    }
}

/// `{id, config, transcript, date, feedback?}` with a loosely typed config
#[derive(Deserialize)]
pub(crate) struct UntaggedInterview {
    id: RecordId,
    config: UntaggedConfig,
    #[serde(default)]
    transcript: Vec<ChatMessage>,
    date: DateTime<Utc>,
    #[serde(default)]
    feedback: Option<String>,
}

/// Ids were millisecond timestamps, stored as either strings or numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordId {
    Text(String),
    Number(serde_json::Number),
}

impl RecordId {
    fn into_string(self) -> String {
        match self {
            RecordId::Text(id) => id,
            RecordId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UntaggedConfig {
    topic: UntaggedTopic,
    #[serde(default)]
    sub_topic: Option<UntaggedSubTopic>,
}

/// Topic without its icon, which was never a string in this layout
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UntaggedTopic {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    sub_topics: Vec<UntaggedSubTopic>,
}

#[derive(Deserialize)]
struct UntaggedSubTopic {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

impl From<UntaggedSubTopic> for SubTopic {
    fn from(sub: UntaggedSubTopic) -> Self {
        SubTopic {
            id: sub.id,
            name: sub.name,
            description: sub.description,
        }
    }
}

impl UntaggedInterview {
    fn into_record(self) -> SessionRecord {
        let UntaggedTopic {
            id,
            name,
            description,
            sub_topics,
        } = self.config.topic;

        let mut topic = Topic::new(&id, &name, &description);
        topic.sub_topics = sub_topics.into_iter().map(Into::into).collect();
        topic.icon = find_topic(&id).and_then(|known| known.icon.clone());

        let mut config = SessionConfig::new(topic);
        config.sub_topic = self.config.sub_topic.map(Into::into);

        SessionRecord {
            id: self.id.into_string(),
            date: self.date,
            config,
            kind: RecordKind::Interview {
                transcript: self.transcript,
                feedback: self.feedback,
            },
        }
    }
}

/// Filter parameters for listing history.
#[derive(Debug, Default, Clone)]
pub struct HistoryFilter {
    /// `interview` or `practice`
    pub kind: Option<String>,
    /// Topic id
    pub topic: Option<String>,
    /// Case-insensitive text match over the record contents
    pub search: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

/// Aggregate statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_records: usize,
    pub interviews: usize,
    pub practice_rounds: usize,
    /// Interviews that ended with a summary
    pub with_feedback: usize,
    pub avg_transcript_turns: f64,
    pub records_over_time: Vec<DayCount>,
    pub by_topic: Vec<TopicCount>,
}

/// Records count for a single day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayCount {
    pub date: String,
    pub count: usize,
}

/// Per-topic counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub total: usize,
}
