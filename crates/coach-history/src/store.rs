use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use coach_types::{RecordKind, SessionRecord};
use tracing::{info, warn};

use crate::storage::{FileSlots, SlotStorage};
use crate::types::{
    DayCount, HistoryDocument, HistoryFilter, HistoryStats, StoredHistory, TopicCount,
    HISTORY_SLOT, HISTORY_VERSION,
};
use crate::HistoryError;

/// Completed sessions kept in a single named slot.
///
/// Every save rewrites the whole document. Two processes saving at the same
/// time can lose a record.
pub struct HistoryStore {
    storage: Box<dyn SlotStorage>,
}

impl HistoryStore {
    /// Create a store using the default data directory.
    pub fn new() -> Result<Self, HistoryError> {
        Ok(Self::with_storage(FileSlots::new()?))
    }

    /// Create a store with slots in a custom directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self::with_storage(FileSlots::with_dir(dir))
    }

    pub fn with_storage(storage: impl SlotStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// List records matching the filter, newest first.
    ///
    /// Missing or unreadable history is treated as empty.
    pub fn list(&self, filter: &HistoryFilter) -> Vec<SessionRecord> {
        let mut records = match self.load() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to load history, treating as empty");
                Vec::new()
            }
        };

        records.retain(|r| matches_filter(r, filter));
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    /// Look up a record by id, or by a unique id prefix.
    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        let records = self.list(&HistoryFilter::default());
        if let Some(exact) = records.iter().find(|r| r.id == id) {
            return Some(exact.clone());
        }

        let mut matches = records.into_iter().filter(|r| r.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Prepend a record and rewrite the slot.
    ///
    /// A slot that exists but cannot be parsed is left untouched and
    /// reported as [`HistoryError::Corrupt`].
    pub fn save(&self, record: SessionRecord) -> Result<(), HistoryError> {
        let mut records = self.load()?;
        let id = record.id.clone();
        records.insert(0, record);

        let document = HistoryDocument {
            version: HISTORY_VERSION,
            records,
        };
        let json = serde_json::to_string(&document)?;
        self.storage.write(HISTORY_SLOT, &json)?;

        info!(record_id = %id, total = document.records.len(), "Saved session record");
        Ok(())
    }

    /// Compute aggregate statistics over records matching the filter.
    pub fn stats(&self, filter: &HistoryFilter) -> HistoryStats {
        let records = self.list(filter);
        if records.is_empty() {
            return HistoryStats::default();
        }

        let mut stats = HistoryStats {
            total_records: records.len(),
            ..Default::default()
        };

        let mut turns = Vec::new();
        let mut day_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut topic_counts: HashMap<String, usize> = HashMap::new();

        for record in &records {
            match &record.kind {
                RecordKind::Interview {
                    transcript,
                    feedback,
                } => {
                    stats.interviews += 1;
                    if feedback.is_some() {
                        stats.with_feedback += 1;
                    }
                    turns.push(transcript.len() as f64);
                }
                RecordKind::Practice { .. } => stats.practice_rounds += 1,
            }

            let date = record.date.format("%Y-%m-%d").to_string();
            *day_counts.entry(date).or_insert(0) += 1;
            *topic_counts
                .entry(record.config.topic.name.clone())
                .or_insert(0) += 1;
        }

        if !turns.is_empty() {
            stats.avg_transcript_turns = turns.iter().sum::<f64>() / turns.len() as f64;
        }

        stats.records_over_time = day_counts
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect();

        let mut by_topic: Vec<TopicCount> = topic_counts
            .into_iter()
            .map(|(topic, total)| TopicCount { topic, total })
            .collect();
        by_topic.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.topic.cmp(&b.topic)));
        stats.by_topic = by_topic;

        stats
    }

    fn load(&self) -> Result<Vec<SessionRecord>, HistoryError> {
        let Some(contents) = self.storage.read(HISTORY_SLOT)? else {
            return Ok(Vec::new());
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let stored: StoredHistory =
            serde_json::from_str(&contents).map_err(|e| HistoryError::Corrupt {
                key: HISTORY_SLOT.to_string(),
                message: e.to_string(),
            })?;
        Ok(stored.into_records())
    }
}

fn matches_filter(record: &SessionRecord, filter: &HistoryFilter) -> bool {
    if let Some(ref kind) = filter.kind {
        if !record.kind_name().eq_ignore_ascii_case(kind) {
            return false;
        }
    }

    if let Some(ref topic) = filter.topic {
        if !record.config.topic.id.eq_ignore_ascii_case(topic) {
            return false;
        }
    }

    if let Some(after) = filter.after {
        if record.date < after {
            return false;
        }
    }

    if let Some(before) = filter.before {
        if record.date > before {
            return false;
        }
    }

    if let Some(ref search) = filter.search {
        let needle = search.to_lowercase();
        let in_title = record.config.title().to_lowercase().contains(&needle);
        let in_turns = record
            .transcript()
            .iter()
            .any(|m| m.content.to_lowercase().contains(&needle));
        if !in_title && !in_turns {
            return false;
        }
    }

    true
}
