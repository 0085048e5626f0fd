use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role used when a session config does not name one.
pub const DEFAULT_ROLE: &str = "Software Engineer";

/// An interview topic from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Icon reference used by the presentation layer (e.g. "code", "python")
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_topics: Vec<SubTopic>,
}

impl Topic {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: None,
            sub_topics: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_sub_topic(mut self, id: &str, name: &str, description: &str) -> Self {
        self.sub_topics.push(SubTopic {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        });
        self
    }

    /// Find one of this topic's sub-topics by id (case-insensitive)
    pub fn sub_topic(&self, id: &str) -> Option<&SubTopic> {
        self.sub_topics
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(id))
    }
}

/// A narrower area inside a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Question difficulty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Capitalized label for display ("Medium")
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("Unknown difficulty: {}", s)),
        }
    }
}

/// Configuration chosen once per session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub topic: Topic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_topic: Option<SubTopic>,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Job role the candidate is preparing for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl SessionConfig {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            sub_topic: None,
            difficulty: Difficulty::default(),
            role: None,
        }
    }

    pub fn with_sub_topic(mut self, sub_topic: SubTopic) -> Self {
        self.sub_topic = Some(sub_topic);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// The most specific area being practiced: sub-topic name if set, else topic name
    pub fn focus(&self) -> &str {
        self.sub_topic
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(&self.topic.name)
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }

    /// "Topic (Sub-topic)" label for lists
    pub fn title(&self) -> String {
        match self.sub_topic {
            Some(ref sub) => format!("{} ({})", self.topic.name, sub.name),
            None => self.topic.name.clone(),
        }
    }
}

/// Who produced a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

/// Feedback on a single answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFeedback {
    /// What was good about the answer
    pub positive: String,
    /// Actionable suggestions for improvement
    pub improvement: String,
    /// A well-structured ideal answer
    pub example_answer: String,
}

impl StructuredFeedback {
    /// Marker text in `positive` identifying the placeholder feedback
    pub const UNAVAILABLE_MARKER: &'static str = "Could not analyze the feedback.";

    /// Placeholder shown when the model could not produce feedback
    pub fn unavailable() -> Self {
        Self {
            positive: Self::UNAVAILABLE_MARKER.to_string(),
            improvement: "There was an error communicating with the AI. Please check your connection and try again.".to_string(),
            example_answer: "N/A".to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.positive == Self::UNAVAILABLE_MARKER
    }
}

/// A completed session, written once to history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub config: SessionConfig,
    #[serde(flatten)]
    pub kind: RecordKind,
}

/// The two shapes a stored session can take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordKind {
    /// Full mock interview with an end-of-session summary
    Interview {
        transcript: Vec<ChatMessage>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
    /// Single question answered in practice mode
    Practice {
        question: String,
        answer: String,
        feedback: StructuredFeedback,
    },
}

impl SessionRecord {
    pub fn interview(
        config: SessionConfig,
        transcript: Vec<ChatMessage>,
        feedback: Option<String>,
    ) -> Self {
        Self {
            id: new_record_id(),
            date: Utc::now(),
            config,
            kind: RecordKind::Interview {
                transcript,
                feedback,
            },
        }
    }

    pub fn practice(
        config: SessionConfig,
        question: String,
        answer: String,
        feedback: StructuredFeedback,
    ) -> Self {
        Self {
            id: new_record_id(),
            date: Utc::now(),
            config,
            kind: RecordKind::Practice {
                question,
                answer,
                feedback,
            },
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            RecordKind::Interview { .. } => "interview",
            RecordKind::Practice { .. } => "practice",
        }
    }

    /// Transcript view of the record; practice rounds become a question/answer pair
    pub fn transcript(&self) -> Vec<ChatMessage> {
        match &self.kind {
            RecordKind::Interview { transcript, .. } => transcript.clone(),
            RecordKind::Practice {
                question, answer, ..
            } => vec![ChatMessage::model(question), ChatMessage::user(answer)],
        }
    }
}

fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn technical() -> Topic {
        Topic::new("technical", "Technical Challenge", "Coding problems")
            .with_sub_topic("arrays", "Arrays", "Array manipulation")
    }

    #[test]
    fn test_focus_prefers_sub_topic() {
        let topic = technical();
        let sub = topic.sub_topic("ARRAYS").cloned().unwrap();
        let config = SessionConfig::new(topic.clone());
        assert_eq!(config.focus(), "Technical Challenge");
        assert_eq!(config.with_sub_topic(sub).focus(), "Arrays");
    }

    #[test]
    fn test_difficulty_defaults_to_medium() {
        let json = r#"{"topic":{"id":"t","name":"T","description":"d"}}"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.role(), DEFAULT_ROLE);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_record_kind_is_tagged() {
        let record = SessionRecord::interview(
            SessionConfig::new(technical()),
            vec![ChatMessage::model("Hi"), ChatMessage::user("answer")],
            Some("Good job".into()),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["kind"], "interview");
        assert_eq!(value["config"]["topic"]["name"], "Technical Challenge");
        assert_eq!(value["transcript"][0]["role"], "model");

        let back: SessionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_practice_record_transcript_view() {
        let record = SessionRecord::practice(
            SessionConfig::new(technical()),
            "What is a hash map?".into(),
            "A key-value structure".into(),
            StructuredFeedback::unavailable(),
        );
        let transcript = record.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, ChatRole::Model);
        assert!(transcript[1].is_user());
        assert_eq!(record.kind_name(), "practice");
    }

    #[test]
    fn test_unavailable_feedback_marker() {
        assert!(StructuredFeedback::unavailable().is_unavailable());
        let real = StructuredFeedback {
            positive: "Clear structure".into(),
            improvement: "Add numbers".into(),
            example_answer: "...".into(),
        };
        assert!(!real.is_unavailable());
    }
}
