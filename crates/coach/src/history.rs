use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;

use coach_history::{HistoryFilter, HistoryStore};
use coach_types::SessionRecord;

use crate::ui;

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List saved sessions, newest first
    List {
        /// Filter by kind (interview, practice)
        #[arg(long)]
        kind: Option<String>,

        /// Filter by topic id
        #[arg(long)]
        topic: Option<String>,

        /// Show sessions after this date (YYYY-MM-DD)
        #[arg(long)]
        after: Option<String>,

        /// Show sessions before this date (YYYY-MM-DD)
        #[arg(long)]
        before: Option<String>,

        /// Search questions, answers and transcripts
        #[arg(long)]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a saved session
    Show {
        /// Record ID or unique prefix (launches interactive picker if omitted)
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn handle_history_command(action: HistoryAction, store: &HistoryStore) -> Result<()> {
    match action {
        HistoryAction::List {
            kind,
            topic,
            after,
            before,
            search,
            json,
        } => {
            let filter = HistoryFilter {
                kind,
                topic,
                after: after.map(|s| parse_date(&s, "--after", false)).transpose()?,
                before: before.map(|s| parse_date(&s, "--before", true)).transpose()?,
                search,
            };
            let records = store.list(&filter);

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("{}", "No sessions found.".dimmed());
            } else {
                ui::print_history_table(&records);
            }
        }
        HistoryAction::Show { id, json } => {
            let record = match id {
                Some(id) => store
                    .get(&id)
                    .with_context(|| format!("No session matches '{}'", id))?,
                None => match pick_record(store)? {
                    Some(record) => record,
                    None => anyhow::bail!("No sessions found."),
                },
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                ui::print_record_detail(&record);
            }
        }
        HistoryAction::Stats { json } => {
            let stats = store.stats(&HistoryFilter::default());

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                ui::print_stats(&stats);
            }
        }
    }

    Ok(())
}

/// Interactive picker over all records; `None` when history is empty
pub fn pick_record(store: &HistoryStore) -> Result<Option<SessionRecord>> {
    let mut records = store.list(&HistoryFilter::default());
    if records.is_empty() {
        return Ok(None);
    }

    let items: Vec<String> = records.iter().map(ui::record_label).collect();
    let selection = dialoguer::FuzzySelect::new()
        .with_prompt("Select a session")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(Some(records.swap_remove(selection)))
}

fn parse_date(s: &str, flag: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid {} date: {}", flag, e))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| anyhow::anyhow!("Invalid {} date: {}", flag, s))?;
    Ok(Utc.from_utc_datetime(&time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_bounds() {
        let after = parse_date("2024-03-01", "--after", false).unwrap();
        let before = parse_date("2024-03-01", "--before", true).unwrap();
        assert_eq!(after.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(before.to_rfc3339(), "2024-03-01T23:59:59+00:00");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let err = parse_date("March 1st", "--after", false).unwrap_err();
        assert!(err.to_string().contains("--after"));
    }
}
