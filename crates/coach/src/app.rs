//! Interactive front-end: a router over a handful of screens.
//!
//! Each screen runs to completion and returns the next [`Screen`]; screens
//! never call each other directly.

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{FuzzySelect, Input, Select};
use tracing::debug;

use coach_core::{
    generate_question_set, EndOutcome, InterviewSession, PracticeRound, RejectReason,
    SendOutcome, SessionError, SessionState, DEFAULT_BATCH_SIZE,
};
use coach_gateway::{AiGateway, FeedbackMode};
use coach_history::HistoryStore;
use coach_logging::Logger;
use coach_model::{create_model, ModelConfig};
use coach_types::{topics, Difficulty, SessionConfig};

use crate::config::Settings;
use crate::history::pick_record;
use crate::ui;

/// Screens of the interactive front-end
#[derive(Debug, Clone)]
pub enum Screen {
    Home,
    Practice(SessionConfig),
    Questions(SessionConfig),
    Chat(SessionConfig, FeedbackMode),
    History,
    Quit,
}

/// Shared handles used by every screen
pub struct Services {
    pub settings: Settings,
    pub gateway: Arc<AiGateway>,
    pub history: Arc<HistoryStore>,
    pub logger: Arc<Logger>,
}

/// Build the gateway from settings; fails when no API key is set
pub fn build_gateway(settings: &Settings) -> Result<Arc<AiGateway>> {
    let mut config = ModelConfig::from_env_vars(&settings.api_key_vars())
        .context("A Gemini API key is required for this command")?
        .with_model(settings.model.clone());
    if let Some(timeout) = settings.timeout {
        config = config.with_timeout(timeout);
    }

    let model = create_model(config).context("Failed to create model client")?;
    let gateway = AiGateway::new(Arc::from(model)).with_reply_protocol(settings.reply_protocol);
    Ok(Arc::new(gateway))
}

pub fn build_history(settings: &Settings) -> Result<Arc<HistoryStore>> {
    let store = match settings.history_dir {
        Some(ref dir) => HistoryStore::with_dir(dir.clone()),
        None => HistoryStore::new().context("Failed to open history store")?,
    };
    Ok(Arc::new(store))
}

/// Run the router loop until the user quits
pub async fn run(services: &Services, start: Screen) -> Result<()> {
    let mut screen = start;

    loop {
        debug!(?screen, "Entering screen");
        screen = match screen {
            Screen::Home => home(services)?,
            Screen::Practice(config) => practice(services, config).await?,
            Screen::Questions(config) => questions(services, config).await?,
            Screen::Chat(config, mode) => chat(services, config, mode).await?,
            Screen::History => history(services)?,
            Screen::Quit => break,
        };
    }

    Ok(())
}

fn home(services: &Services) -> Result<Screen> {
    println!();
    println!("{}", "Interview Coach".bold().bright_white());
    println!();

    let items = [
        "Mock interview",
        "Practice a single question",
        "Generate a question set",
        "View history",
        "Quit",
    ];
    let choice = Select::new()
        .with_prompt("What would you like to do?")
        .items(&items)
        .default(0)
        .interact()?;

    let screen = match choice {
        0 => {
            let config = choose_config(&services.settings)?;
            let modes = ["Summary at the end", "Feedback after every answer"];
            let mode = Select::new()
                .with_prompt("How should feedback be given?")
                .items(&modes)
                .default(0)
                .interact()?;
            let mode = if mode == 0 {
                FeedbackMode::Summary
            } else {
                FeedbackMode::PerQuestion
            };
            Screen::Chat(config, mode)
        }
        1 => Screen::Practice(choose_config(&services.settings)?),
        2 => Screen::Questions(choose_config(&services.settings)?),
        3 => Screen::History,
        _ => Screen::Quit,
    };
    Ok(screen)
}

/// Topic, optional sub-topic and difficulty
fn choose_config(settings: &Settings) -> Result<SessionConfig> {
    let catalog = topics();
    let names: Vec<String> = catalog
        .iter()
        .map(|t| format!("{} - {}", t.name, t.description))
        .collect();
    let topic = &catalog[FuzzySelect::new()
        .with_prompt("Choose a topic")
        .items(&names)
        .default(0)
        .interact()?];

    let mut config = SessionConfig::new(topic.clone());

    if !topic.sub_topics.is_empty() {
        let mut items = vec![format!("All of {}", topic.name)];
        items.extend(topic.sub_topics.iter().map(|s| s.name.clone()));
        let choice = Select::new()
            .with_prompt("Focus area")
            .items(&items)
            .default(0)
            .interact()?;
        if choice > 0 {
            config = config.with_sub_topic(topic.sub_topics[choice - 1].clone());
        }
    }

    let labels: Vec<&str> = Difficulty::ALL.iter().map(|d| d.label()).collect();
    let default = Difficulty::ALL
        .iter()
        .position(|d| *d == settings.difficulty)
        .unwrap_or(1);
    let difficulty = Select::new()
        .with_prompt("Difficulty")
        .items(&labels)
        .default(default)
        .interact()?;
    config = config.with_difficulty(Difficulty::ALL[difficulty]);

    if let Some(ref role) = settings.role {
        config = config.with_role(role.clone());
    }
    Ok(config)
}

async fn practice(services: &Services, config: SessionConfig) -> Result<Screen> {
    let round = PracticeRound::new(
        config,
        services.gateway.clone(),
        services.history.clone(),
        services.logger.clone(),
    );
    println!(
        "{} {}",
        "Practice:".dimmed(),
        round.config().title().bright_cyan()
    );

    loop {
        ui::print_hint("Generating a question...");
        let question = round.next_question().await?;
        ui::print_question(&question);

        if round.question().is_some() {
            let answer: String = Input::new().with_prompt("Your answer").interact_text()?;
            ui::print_hint("Analyzing your answer...");
            match round.submit_answer(&answer).await {
                Ok(outcome) => ui::print_structured_feedback(&outcome.feedback),
                Err(e) => ui::print_error(&e.to_string()),
            }
        }

        let next = Select::new()
            .items(&["Next question", "Back to home"])
            .default(0)
            .interact()?;
        if next == 1 {
            return Ok(Screen::Home);
        }
    }
}

async fn questions(services: &Services, config: SessionConfig) -> Result<Screen> {
    loop {
        ui::print_hint(&format!(
            "Generating {} questions on {}...",
            DEFAULT_BATCH_SIZE,
            config.title()
        ));
        match generate_question_set(&services.gateway, &config, DEFAULT_BATCH_SIZE).await {
            Ok(questions) => ui::print_question_set(&questions),
            Err(e) => ui::print_error(&format!("Could not generate questions: {}", e)),
        }

        let next = Select::new()
            .items(&["Generate another set", "Practice this topic", "Back to home"])
            .default(0)
            .interact()?;
        match next {
            0 => continue,
            1 => return Ok(Screen::Practice(config)),
            _ => return Ok(Screen::Home),
        }
    }
}

async fn chat(services: &Services, config: SessionConfig, mode: FeedbackMode) -> Result<Screen> {
    let session = InterviewSession::new(
        config,
        mode,
        services.gateway.clone(),
        services.history.clone(),
        services.logger.clone(),
    );

    loop {
        ui::print_hint("Connecting to your interviewer...");
        match session.start().await {
            Ok(greeting) => {
                ui::print_model_turn(&greeting);
                break;
            }
            Err(e) => {
                ui::print_error(&e.to_string());
                let retry = Select::new()
                    .items(&["Try again", "Back to home"])
                    .default(0)
                    .interact()?;
                if retry == 1 {
                    return Ok(Screen::Home);
                }
            }
        }
    }

    ui::print_hint("Type your answers. Commands: /end to finish with feedback, /quit to leave.");
    if mode == FeedbackMode::PerQuestion {
        ui::print_hint("After each piece of feedback, type /next for the next question.");
    }

    loop {
        if session.state() == SessionState::Ending {
            break;
        }

        let input: String = Input::new().with_prompt("You").interact_text()?;
        let command = input.trim();

        let result = match command {
            "/end" | "/quit" => break,
            "/next" => session.advance().await,
            _ => session.send_message(&input).await,
        };

        match result {
            Ok(SendOutcome::Reply(text)) => ui::print_model_turn(&text),
            Ok(SendOutcome::AwaitingNext(text)) => {
                if !text.is_empty() {
                    ui::print_model_turn(&text);
                }
            }
            Ok(SendOutcome::EndRequested) => break,
            Err(SessionError::Rejected(RejectReason::InvalidState(SessionState::WaitingForNext))) => {
                ui::print_hint("Type /next when you're ready for the next question.");
            }
            Err(SessionError::Rejected(RejectReason::InvalidState(SessionState::Active))) => {
                ui::print_hint("/next is only available after feedback on an answer.");
            }
            Err(e) => ui::print_error(&e.to_string()),
        }
    }

    ui::print_hint("Wrapping up...");
    match session.end().await {
        Ok(EndOutcome::Completed { feedback, .. }) => ui::print_summary(&feedback),
        Ok(EndOutcome::Abandoned) => {}
        Err(e) => ui::print_error(&e.to_string()),
    }

    Ok(Screen::Home)
}

fn history(services: &Services) -> Result<Screen> {
    loop {
        let Some(record) = pick_record(&services.history)? else {
            println!("{}", "No sessions yet.".dimmed());
            return Ok(Screen::Home);
        };
        ui::print_record_detail(&record);

        let next = Select::new()
            .items(&["Pick another session", "Back to home"])
            .default(0)
            .interact()?;
        if next == 1 {
            return Ok(Screen::Home);
        }
    }
}
