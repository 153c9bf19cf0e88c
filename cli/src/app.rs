use anyhow::{anyhow, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use truthtriage_core::metrics::{confidence_series, response_time_series};
use truthtriage_core::{
    ExchangeOutcome, Preferences, SessionProfile, TriageBackend, TriageClient, TriageError,
    TriageSession, SUGGESTED_QUESTIONS,
};

use crate::output::*;
use crate::session_manager::SessionManager;

/// Everything a command needs: the backend, the open session and how to print
pub struct App {
    pub client: TriageClient,
    pub session: TriageSession,
    pub preferences: Preferences,
    pub default_location: Option<String>,
    pub json: bool,
}

/// A line typed in interactive mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    New,
    History,
    Load(String),
    Delete(String),
    Rename(String, String),
    Clear,
    Sources,
    Metrics,
    Doctors(Option<String>),
    ToggleSuggestions,
    Ask(String),
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Command {
        let input = input.trim();
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            return Command::Exit;
        }
        let Some(rest) = input.strip_prefix('/') else {
            return Command::Ask(input.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        match (name.to_lowercase().as_str(), arg) {
            ("exit" | "quit", _) => Command::Exit,
            ("help", _) => Command::Help,
            ("new", _) => Command::New,
            ("history", _) => Command::History,
            ("load", Some(arg)) => Command::Load(arg),
            ("delete", Some(arg)) => Command::Delete(arg),
            ("rename", Some(arg)) => match arg.split_once(char::is_whitespace) {
                Some((thread, title)) if !title.trim().is_empty() => {
                    Command::Rename(thread.to_string(), title.trim().to_string())
                }
                _ => Command::Unknown(input.to_string()),
            },
            ("clear", _) => Command::Clear,
            ("sources", _) => Command::Sources,
            ("metrics", _) => Command::Metrics,
            ("doctors", arg) => Command::Doctors(arg),
            ("suggest", _) => Command::ToggleSuggestions,
            _ => Command::Unknown(input.to_string()),
        }
    }
}

/// Map "1".."4" to a suggested question while suggestions are on screen
pub fn pick_suggestion(input: &str, offered: bool) -> Option<&'static str> {
    if !offered {
        return None;
    }
    let n = input.trim().parse::<usize>().ok()?;
    SUGGESTED_QUESTIONS.get(n.checked_sub(1)?).copied()
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

impl App {
    /// Ask one question and print the answer
    pub async fn run_single_query(&mut self, prompt: String) -> Result<()> {
        info!("Running single query: {}", prompt);
        let outcome = self.ask(&prompt).await?;

        if self.json {
            return match &outcome {
                ExchangeOutcome::Answered {
                    message,
                    thread_id,
                    specialist_type,
                } => print_json(&json!({
                    "threadId": thread_id,
                    "message": message,
                    "specialistType": specialist_type,
                })),
                ExchangeOutcome::Failed { message, error } => {
                    print_json(&json!({ "message": message, "error": error }))
                }
                ExchangeOutcome::Stale => Ok(()),
            };
        }

        self.show_outcome(&outcome).await;
        if let ExchangeOutcome::Failed { error, .. } = outcome {
            return Err(anyhow!(error).context("Failed to reach the TruthTriage backend"));
        }
        Ok(())
    }

    /// Runs an interactive session until the user types exit
    pub async fn run_interactive_chat(&mut self) -> Result<()> {
        println!(
            "Starting interactive {} session against {}.",
            match self.session.profile() {
                SessionProfile::Chat => "chat",
                SessionProfile::Forensic => "forensic",
            },
            self.client.base_url()
        );
        println!("Type /help for commands, 'exit' or 'quit' to end the session.");
        println!();

        if !self.session.messages().is_empty() {
            for message in self.session.messages() {
                if message.is_user {
                    println!("{}: {}", "You".green().bold(), message.content);
                } else {
                    print_answer(message);
                }
            }
            println!();
        }

        loop {
            let offered = self.session.messages().is_empty() && self.suggestions_enabled();
            if offered {
                print_suggestions();
            }

            print!("{}: ", "You".green().bold());
            io::stdout().flush().context("Failed to flush stdout")?;

            let mut input = String::new();
            let read = io::stdin()
                .read_line(&mut input)
                .context("Failed to read input")?;
            if read == 0 {
                break;
            }
            if input.trim().is_empty() {
                continue;
            }

            let command = match pick_suggestion(&input, offered) {
                Some(question) => {
                    println!("{}: {}", "You".green().bold(), question);
                    Command::Ask(question.to_string())
                }
                None => Command::parse(&input),
            };

            if command == Command::Exit {
                println!("Exiting session.");
                break;
            }
            if let Err(e) = self.dispatch(command).await {
                error!("Command failed: {:#}", e);
                println!("{}", format!("Error: {:#}", e).red());
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Exit => {}
            Command::Help => print_interactive_help(),
            Command::New => {
                self.session.new_chat();
                println!("{}", "Started a new chat.".green());
            }
            Command::History => {
                if self.session.threads().is_empty() {
                    println!("No saved threads.");
                } else {
                    SessionManager::print_thread_list(self.session.threads(), chrono::Utc::now());
                }
            }
            Command::Load(reference) => {
                let id = self.thread_ref(&reference)?;
                let thread = self.session.load_chat(&id)?;
                SessionManager::print_thread(thread);
            }
            Command::Delete(reference) => {
                let id = self.thread_ref(&reference)?;
                self.session.delete_chat(&id)?;
                println!("{}", "Thread deleted.".green());
            }
            Command::Rename(reference, title) => {
                let id = self.thread_ref(&reference)?;
                self.session.history_mut().rename(&id, &title)?;
                println!("{}", "Thread renamed.".green());
            }
            Command::Clear => {
                self.session.clear_history()?;
                println!("{}", "All saved threads deleted.".green());
            }
            Command::Sources => print_sources(self.session.active_sources()),
            Command::Metrics => self.show_metrics()?,
            Command::Doctors(location) => {
                let location = location
                    .or_else(|| self.default_location.clone())
                    .ok_or_else(|| anyhow!("Usage: /doctors <location>"))?;
                self.find_specialists(&location).await?;
            }
            Command::ToggleSuggestions => {
                let show = self.preferences.toggle_suggestions()?;
                println!(
                    "Suggested questions {}.",
                    if show { "on" } else { "off" }
                );
            }
            Command::Ask(query) => {
                let outcome = self.ask(&query).await?;
                self.show_outcome(&outcome).await;
            }
            Command::Unknown(input) => {
                println!("{}", format!("Unknown command: {}", input).yellow());
                print_interactive_help();
            }
        }
        Ok(())
    }

    /// Submit a query with a spinner running
    async fn ask(&mut self, query: &str) -> Result<ExchangeOutcome> {
        let spinner = spinner("Consulting the knowledge base...");
        let result = self.session.submit(&self.client, query).await;
        spinner.finish_and_clear();

        match result {
            Ok(outcome) => Ok(outcome),
            // The answer is on screen but could not be saved
            Err(e @ (TriageError::History(_) | TriageError::Store(_))) => {
                warn!("Exchange completed but was not saved: {}", e);
                println!("{}", format!("Warning: chat history not saved ({})", e).yellow());
                Ok(self.last_outcome())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn last_outcome(&self) -> ExchangeOutcome {
        match self.session.messages().last() {
            Some(message) if !message.is_user => ExchangeOutcome::Answered {
                message: message.clone(),
                thread_id: self.session.current_thread().unwrap_or_default().to_string(),
                specialist_type: self.session.last_specialist_type().map(str::to_string),
            },
            _ => ExchangeOutcome::Stale,
        }
    }

    async fn show_outcome(&mut self, outcome: &ExchangeOutcome) {
        match outcome {
            ExchangeOutcome::Answered {
                message,
                specialist_type,
                ..
            } => {
                print_answer(message);
                if let Some(specialist) = specialist_type {
                    self.offer_specialists(specialist).await;
                }
            }
            ExchangeOutcome::Failed { message, error } => print_failure(message, error),
            ExchangeOutcome::Stale => debug!("Ignoring superseded response"),
        }
        println!();
    }

    async fn offer_specialists(&mut self, specialist: &str) {
        match self.default_location.clone() {
            Some(location) => {
                println!(
                    "{}",
                    format!("Looking for a {} near {}...", specialist, location).cyan()
                );
                if let Err(e) = self.find_specialists(&location).await {
                    warn!("Specialist search failed: {:#}", e);
                    println!("{}", format!("Could not find doctors: {:#}", e).yellow());
                }
            }
            None => println!(
                "{}",
                format!(
                    "A {} may help. Type /doctors <location> to find one nearby.",
                    specialist
                )
                .cyan()
            ),
        }
    }

    async fn find_specialists(&mut self, location: &str) -> Result<()> {
        let spinner = spinner("Searching for specialists...");
        let result = self.session.locate_specialists(&self.client, location).await;
        spinner.finish_and_clear();

        let search = result.context("Doctor search failed")?;
        if self.json {
            print_json(search)
        } else {
            print_doctors(search);
            Ok(())
        }
    }

    fn show_metrics(&self) -> Result<()> {
        let messages = self.session.messages();
        if self.json {
            return print_json(&json!({
                "metrics": self.session.metrics(),
                "confidence": confidence_series(messages),
                "responseTime": response_time_series(messages),
            }));
        }
        print_metrics(self.session.profile(), self.session.metrics());
        print_series("Confidence per answer", "%", &confidence_series(messages));
        print_series("Response time per answer", "s", &response_time_series(messages));
        Ok(())
    }

    fn suggestions_enabled(&self) -> bool {
        self.preferences.show_suggestions().unwrap_or_else(|e| {
            warn!("Could not read showSuggestions: {}", e);
            true
        })
    }

    fn thread_ref(&self, reference: &str) -> Result<String> {
        SessionManager::resolve_thread_ref(self.session.threads(), reference)
            .ok_or_else(|| anyhow!("No saved thread matches '{}'", reference))
    }

    /// Continue a saved thread chosen from a list before chatting
    pub fn select_thread(&mut self) -> Result<()> {
        if let Some(id) = SessionManager::select_thread(&self.session)? {
            self.session.load_chat(&id)?;
        }
        Ok(())
    }

    /// Specialist search for a condition given on the command line
    pub async fn run_doctor_search(&mut self, condition: Option<String>, location: &str) -> Result<()> {
        let condition = condition.unwrap_or_else(|| "general".to_string());
        info!("Searching for specialists for '{}' near {}", condition, location);

        let spinner = spinner("Searching for specialists...");
        let result = self.client.find_doctors(&condition, location).await;
        spinner.finish_and_clear();

        let mut search = result.context("Doctor search failed")?;
        if search.location.is_empty() {
            search.location = location.trim().to_string();
        }
        if self.json {
            print_json(&search)
        } else {
            print_doctors(&search);
            Ok(())
        }
    }

    pub fn list_history(&self) -> Result<()> {
        let threads = self.session.threads();
        if self.json {
            return print_json(&threads);
        }
        if threads.is_empty() {
            println!("No saved threads.");
        } else {
            SessionManager::print_thread_list(threads, chrono::Utc::now());
        }
        Ok(())
    }

    pub fn show_thread(&self, reference: &str) -> Result<()> {
        let id = self.thread_ref(reference)?;
        let thread = self
            .session
            .history()
            .load(&id)
            .ok_or_else(|| anyhow!("No saved thread matches '{}'", reference))?;
        if self.json {
            print_json(thread)
        } else {
            SessionManager::print_thread(thread);
            Ok(())
        }
    }

    pub fn delete_thread(&mut self, reference: &str) -> Result<()> {
        let id = self.thread_ref(reference)?;
        let description = self
            .session
            .history()
            .load(&id)
            .map(SessionManager::describe)
            .unwrap_or_else(|| id.clone());
        self.session.delete_chat(&id)?;
        println!("Deleted {}.", description);
        Ok(())
    }

    pub fn clear_history(&mut self) -> Result<()> {
        let count = self.session.threads().len();
        self.session.clear_history()?;
        println!("Deleted {} saved thread(s).", count);
        Ok(())
    }

    pub fn set_suggestions(&self, show: bool) -> Result<()> {
        self.preferences.set_show_suggestions(show)?;
        println!("Suggested questions {}.", if show { "on" } else { "off" });
        Ok(())
    }

    pub async fn run_health(&self) -> Result<()> {
        let status = self
            .client
            .check_health()
            .await
            .with_context(|| format!("Backend at {} is not reachable", self.client.base_url()))?;
        if self.json {
            print_json(&status)
        } else {
            print_health(&status);
            Ok(())
        }
    }

    pub async fn run_documents(&self) -> Result<()> {
        let documents = self
            .client
            .list_documents()
            .await
            .context("Failed to list documents")?;
        if self.json {
            print_json(&documents)
        } else {
            print_documents(&documents);
            Ok(())
        }
    }
}
