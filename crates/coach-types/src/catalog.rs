//! Static topic catalog.

use lazy_static::lazy_static;

use crate::types::{SubTopic, Topic};

lazy_static! {
    static ref TOPICS: Vec<Topic> = vec![
        Topic::new(
            "behavioral",
            "Behavioral",
            "Master STAR method questions and perfect your storytelling.",
        )
        .with_icon("user-group")
        .with_sub_topic(
            "leadership",
            "Leadership",
            "Leading teams, setting direction and owning outcomes.",
        )
        .with_sub_topic(
            "conflict",
            "Conflict Resolution",
            "Disagreements with peers, managers and stakeholders.",
        )
        .with_sub_topic(
            "teamwork",
            "Teamwork",
            "Collaboration, mentoring and cross-team work.",
        ),
        Topic::new(
            "technical",
            "Technical Challenge",
            "Hone your skills with targeted technical questions and get instant feedback.",
        )
        .with_icon("code")
        .with_sub_topic(
            "data-structures",
            "Data Structures",
            "Arrays, hash maps, trees, graphs and their trade-offs.",
        )
        .with_sub_topic(
            "algorithms",
            "Algorithms",
            "Sorting, searching, dynamic programming and complexity.",
        ),
        Topic::new(
            "system-design",
            "System Design",
            "Design scalable services and reason about trade-offs.",
        )
        .with_icon("chat-bubble")
        .with_sub_topic(
            "distributed",
            "Distributed Systems",
            "Consistency, replication, partitioning and failure handling.",
        )
        .with_sub_topic(
            "api-design",
            "API Design",
            "Resource modelling, versioning and pagination.",
        ),
        Topic::new(
            "python",
            "Python",
            "Language internals, idioms and the standard library.",
        )
        .with_icon("python")
        .with_sub_topic(
            "core",
            "Core Language",
            "Data model, generators, decorators and context managers.",
        )
        .with_sub_topic(
            "data",
            "Data Analysis",
            "pandas, NumPy and working with tabular data.",
        ),
        Topic::new(
            "finance",
            "Finance",
            "Accounting, valuation and market fundamentals.",
        )
        .with_icon("finance")
        .with_sub_topic(
            "valuation",
            "Valuation",
            "DCF, comparables and precedent transactions.",
        )
        .with_sub_topic(
            "accounting",
            "Accounting",
            "The three statements and how they connect.",
        ),
        Topic::new(
            "product",
            "Product Management",
            "Product sense, prioritization and metrics.",
        )
        .with_icon("chat-bubble"),
    ];
}

/// All topics, in display order
pub fn topics() -> &'static [Topic] {
    &TOPICS
}

/// Look up a topic by id (case-insensitive)
pub fn find_topic(id: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|t| t.id.eq_ignore_ascii_case(id))
}

/// Look up a topic and one of its sub-topics
pub fn find_sub_topic(
    topic_id: &str,
    sub_topic_id: &str,
) -> Option<(&'static Topic, &'static SubTopic)> {
    let topic = find_topic(topic_id)?;
    let sub = topic.sub_topic(sub_topic_id)?;
    Some((topic, sub))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<&str> = topics().iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), topics().len());
    }

    #[test]
    fn test_find_topic_case_insensitive() {
        let topic = find_topic("Technical").unwrap();
        assert_eq!(topic.name, "Technical Challenge");
        assert!(find_topic("astrology").is_none());
    }

    #[test]
    fn test_find_sub_topic() {
        let (topic, sub) = find_sub_topic("behavioral", "conflict").unwrap();
        assert_eq!(topic.id, "behavioral");
        assert_eq!(sub.name, "Conflict Resolution");
        assert!(find_sub_topic("product", "anything").is_none());
    }
}
