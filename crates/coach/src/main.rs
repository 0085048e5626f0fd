mod app;
mod config;
mod history;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use coach_core::DEFAULT_BATCH_SIZE;
use coach_gateway::{FeedbackMode, ReplyProtocol};
use coach_logging::{init_tracing, LogFormat, Logger};
use coach_types::{find_sub_topic, find_topic, topics, Difficulty, SessionConfig};

use crate::app::{Screen, Services};
use crate::config::{CliOverrides, Settings};
use crate::history::HistoryAction;

#[derive(Parser, Debug)]
#[command(
    name = "coach",
    about = "Interview practice with an AI interviewer",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Model to use
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Job role to practice for (default: Software Engineer)
    #[arg(short, long, global = true)]
    role: Option<String>,

    /// Question difficulty
    #[arg(short, long, value_enum, global = true)]
    difficulty: Option<DifficultyChoice>,

    /// How the interviewer signals turn changes
    #[arg(long, value_enum, global = true)]
    reply_protocol: Option<ReplyProtocolChoice>,

    /// Directory holding saved history
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Diagnostic log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Also append session events as JSON lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List interview topics
    Topics {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Practice single questions with feedback on each answer
    Practice {
        /// Topic id (see `coach topics`)
        topic: String,

        /// Sub-topic id
        #[arg(short, long)]
        sub_topic: Option<String>,
    },

    /// Generate a set of practice questions
    Questions {
        /// Topic id (see `coach topics`)
        topic: String,

        /// Sub-topic id
        #[arg(short, long)]
        sub_topic: Option<String>,

        /// Number of questions
        #[arg(short = 'n', long, default_value_t = DEFAULT_BATCH_SIZE)]
        count: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start a mock interview
    Interview {
        /// Topic id (see `coach topics`)
        topic: String,

        /// Sub-topic id
        #[arg(short, long)]
        sub_topic: Option<String>,

        /// When feedback is given
        #[arg(short, long, value_enum, default_value = "summary")]
        feedback: FeedbackChoice,
    },

    /// Browse saved sessions
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyChoice {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyChoice> for Difficulty {
    fn from(choice: DifficultyChoice) -> Self {
        match choice {
            DifficultyChoice::Easy => Difficulty::Easy,
            DifficultyChoice::Medium => Difficulty::Medium,
            DifficultyChoice::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReplyProtocolChoice {
    Sentinel,
    Tagged,
}

impl From<ReplyProtocolChoice> for ReplyProtocol {
    fn from(choice: ReplyProtocolChoice) -> Self {
        match choice {
            ReplyProtocolChoice::Sentinel => ReplyProtocol::Sentinel,
            ReplyProtocolChoice::Tagged => ReplyProtocol::Tagged,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeedbackChoice {
    Summary,
    PerQuestion,
}

impl From<FeedbackChoice> for FeedbackMode {
    fn from(choice: FeedbackChoice) -> Self {
        match choice {
            FeedbackChoice::Summary => FeedbackMode::Summary,
            FeedbackChoice::PerQuestion => FeedbackMode::PerQuestion,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let overrides = CliOverrides {
        model: cli.model.clone(),
        role: cli.role.clone(),
        difficulty: cli.difficulty.map(Into::into),
        history_dir: cli.history_dir.clone(),
        reply_protocol: cli.reply_protocol.map(Into::into),
    };
    let settings = Settings::load(overrides, &working_dir)?;

    match cli.command {
        Some(Commands::Topics { json }) => {
            if json {
                println!("{}", serde_json::to_string_pretty(topics())?);
            } else {
                ui::print_topics(topics());
            }
            Ok(())
        }
        Some(Commands::History { action }) => {
            let store = app::build_history(&settings)?;
            history::handle_history_command(action, &store)
        }
        Some(Commands::Questions {
            topic,
            sub_topic,
            count,
            json,
        }) => {
            let config = session_config(&settings, &topic, sub_topic.as_deref())?;
            let gateway = app::build_gateway(&settings)?;
            let questions = coach_core::generate_question_set(&gateway, &config, count)
                .await
                .context("Failed to generate questions")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&questions)?);
            } else {
                ui::print_question_set(&questions);
            }
            Ok(())
        }
        Some(Commands::Practice { topic, sub_topic }) => {
            let config = session_config(&settings, &topic, sub_topic.as_deref())?;
            let services = services(settings, cli.log_file.as_deref(), log_format)?;
            app::run(&services, Screen::Practice(config)).await
        }
        Some(Commands::Interview {
            topic,
            sub_topic,
            feedback,
        }) => {
            let config = session_config(&settings, &topic, sub_topic.as_deref())?;
            let services = services(settings, cli.log_file.as_deref(), log_format)?;
            app::run(&services, Screen::Chat(config, feedback.into())).await
        }
        None => {
            let services = services(settings, cli.log_file.as_deref(), log_format)?;
            app::run(&services, Screen::Home).await
        }
    }
}

fn services(
    settings: Settings,
    log_file: Option<&Path>,
    log_format: LogFormat,
) -> Result<Services> {
    let logger = match log_file {
        Some(path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };

    Ok(Services {
        gateway: app::build_gateway(&settings)?,
        history: app::build_history(&settings)?,
        logger: Arc::new(logger),
        settings,
    })
}

/// Resolve topic ids from the command line into a session config
fn session_config(
    settings: &Settings,
    topic_id: &str,
    sub_topic_id: Option<&str>,
) -> Result<SessionConfig> {
    let mut config = match sub_topic_id {
        Some(sub_id) => {
            let (topic, sub) = find_sub_topic(topic_id, sub_id).with_context(|| {
                format!("Unknown sub-topic '{}' for topic '{}'", sub_id, topic_id)
            })?;
            SessionConfig::new(topic.clone()).with_sub_topic(sub.clone())
        }
        None => {
            let topic = find_topic(topic_id).with_context(|| {
                let ids: Vec<&str> = topics().iter().map(|t| t.id.as_str()).collect();
                format!(
                    "Unknown topic '{}'. Available: {}",
                    topic_id,
                    ids.join(", ")
                )
            })?;
            SessionConfig::new(topic.clone())
        }
    };

    config = config.with_difficulty(settings.difficulty);
    if let Some(ref role) = settings.role {
        config = config.with_role(role.clone());
    }
    Ok(config)
}
