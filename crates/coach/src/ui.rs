//! Terminal presentation of topics, transcripts, feedback and history.

use colored::Colorize;

use coach_history::HistoryStats;
use coach_types::{ChatMessage, ChatRole, RecordKind, SessionRecord, StructuredFeedback, Topic};

pub fn print_topics(topics: &[Topic]) {
    println!("{:<16} {:<22} {}", "ID".dimmed(), "TOPIC".dimmed(), "SUB-TOPICS".dimmed());
    for topic in topics {
        let subs = topic
            .sub_topics
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{:<16} {:<22} {}", topic.id.bright_cyan(), topic.name, subs.dimmed());
    }
}

pub fn print_model_turn(text: &str) {
    println!();
    println!("{} {}", "Alex:".bright_magenta().bold(), text);
    println!();
}

pub fn print_transcript(transcript: &[ChatMessage]) {
    for message in transcript {
        let speaker = match message.role {
            ChatRole::Model => "Interviewer:".bright_magenta().bold(),
            ChatRole::User => "You:".bright_cyan().bold(),
        };
        println!("{} {}", speaker, message.content);
        println!();
    }
}

pub fn print_question(question: &str) {
    println!();
    println!("{}", "Question".bright_blue().bold());
    println!("  {}", question);
    println!();
}

pub fn print_structured_feedback(feedback: &StructuredFeedback) {
    println!();
    if feedback.is_unavailable() {
        println!("{} {}", "✗".bright_red(), feedback.positive.bright_red());
        println!("  {}", feedback.improvement.dimmed());
        println!();
        return;
    }

    println!("{}", "What went well".bright_green().bold());
    println!("  {}", feedback.positive);
    println!();
    println!("{}", "To improve".bright_yellow().bold());
    println!("  {}", feedback.improvement);
    println!();
    println!("{}", "Example answer".bright_blue().bold());
    println!("  {}", feedback.example_answer);
    println!();
}

pub fn print_summary(feedback: &str) {
    println!();
    println!("{}", "=== Interview Feedback ===".bright_blue().bold());
    println!("{}", feedback);
    println!();
}

pub fn print_question_set(questions: &[String]) {
    println!();
    for (i, question) in questions.iter().enumerate() {
        println!("{} {}", format!("{:>2}.", i + 1).dimmed(), question);
    }
    println!();
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".bright_red(), message.bright_red());
}

pub fn print_hint(message: &str) {
    eprintln!("  {}", message.dimmed());
}

/// One-line description of a record for pickers
pub fn record_label(record: &SessionRecord) -> String {
    format!(
        "{} | {:9} | {} ({}) | {}",
        record.date.format("%Y-%m-%d %H:%M"),
        record.kind_name(),
        record.config.title(),
        record.config.difficulty,
        truncate(&record_preview(record), 50)
    )
}

pub fn print_history_table(records: &[SessionRecord]) {
    println!(
        "{:<10} {:<18} {:<10} {:<28} {:<8} {}",
        "ID".dimmed(),
        "DATE".dimmed(),
        "KIND".dimmed(),
        "TOPIC".dimmed(),
        "LEVEL".dimmed(),
        "PREVIEW".dimmed(),
    );

    for record in records {
        let kind = match record.kind {
            RecordKind::Interview { .. } => record.kind_name().bright_magenta(),
            RecordKind::Practice { .. } => record.kind_name().bright_cyan(),
        };
        println!(
            "{:<10} {:<18} {:<10} {:<28} {:<8} {}",
            truncate(&record.id, 8),
            record.date.format("%Y-%m-%d %H:%M").to_string(),
            kind,
            truncate(&record.config.title(), 27),
            record.config.difficulty.label(),
            truncate(&record_preview(record), 40)
        );
    }
}

pub fn print_record_detail(record: &SessionRecord) {
    println!("{}", "=== Session Detail ===".bright_blue().bold());
    println!("{}  {}", "ID:".dimmed(), record.id);
    println!(
        "{}  {}",
        "Date:".dimmed(),
        record.date.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{}  {}", "Kind:".dimmed(), record.kind_name());
    println!("{}  {}", "Topic:".dimmed(), record.config.title());
    println!("{}  {}", "Role:".dimmed(), record.config.role());
    println!(
        "{}  {}",
        "Difficulty:".dimmed(),
        record.config.difficulty.label()
    );
    println!();

    match &record.kind {
        RecordKind::Interview {
            transcript,
            feedback,
        } => {
            match feedback {
                Some(feedback) => print_summary(feedback),
                None => println!("{}", "No feedback was generated.".dimmed()),
            }
            println!(
                "{}",
                format!("--- Transcript ({} turns) ---", transcript.len()).dimmed()
            );
            println!();
            print_transcript(transcript);
        }
        RecordKind::Practice {
            question,
            answer,
            feedback,
        } => {
            print_question(question);
            println!("{}", "Your answer".bright_cyan().bold());
            println!("  {}", answer);
            print_structured_feedback(feedback);
        }
    }
}

pub fn print_stats(stats: &HistoryStats) {
    println!("{}", "=== History Statistics ===".bright_blue().bold());
    println!("{}  {}", "Total Sessions:".dimmed(), stats.total_records);
    println!("{}  {}", "Interviews:".dimmed(), stats.interviews);
    println!("{}  {}", "Practice Rounds:".dimmed(), stats.practice_rounds);
    println!("{}  {}", "With Feedback:".dimmed(), stats.with_feedback);
    println!(
        "{}  {:.1}",
        "Avg Interview Turns:".dimmed(),
        stats.avg_transcript_turns
    );

    if !stats.by_topic.is_empty() {
        println!();
        println!("{}", "By Topic:".dimmed());
        for t in &stats.by_topic {
            println!("  {:<24} {}", t.topic, t.total);
        }
    }

    if !stats.records_over_time.is_empty() {
        println!();
        println!("{}", "By Day:".dimmed());
        for day in &stats.records_over_time {
            println!("  {}  {}", day.date, "▇".repeat(day.count.min(40)).bright_blue());
        }
    }
}

fn record_preview(record: &SessionRecord) -> String {
    match &record.kind {
        RecordKind::Interview { transcript, .. } => transcript
            .iter()
            .find(|m| m.is_user())
            .map(|m| m.content.clone())
            .unwrap_or_default(),
        RecordKind::Practice { question, .. } => question.clone(),
    }
}

/// Shorten to at most `max` characters, marking the cut with "..."
pub fn truncate(s: &str, max: usize) -> String {
    let single_line = s.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let head: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}
