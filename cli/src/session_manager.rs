use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use colored::*;
use std::io::{self, BufRead, Write};

use truthtriage_core::{ChatThread, TriageSession};

use crate::output::{print_answer, truncate};

/// Handles saved-thread operations for the CLI
pub struct SessionManager;

impl SessionManager {
    /// Shows the saved threads and lets the user pick one to continue or start fresh.
    /// Returns the chosen thread id, or `None` for a new chat.
    pub fn select_thread(session: &TriageSession) -> Result<Option<String>> {
        let threads = session.threads();
        if threads.is_empty() {
            println!("No saved threads found. Starting a new chat.");
            return Ok(None);
        }

        println!("\nSaved threads:");
        Self::print_thread_list(threads, Utc::now());
        println!("  {}. {}", threads.len() + 1, "Start a new chat".green());
        println!();

        let stdin = io::stdin();
        Self::read_selection(threads, &mut stdin.lock())
    }

    /// Prompt until `input` yields a valid choice. End of input starts a new chat.
    fn read_selection(threads: &[ChatThread], input: &mut impl BufRead) -> Result<Option<String>> {
        let selection = loop {
            print!("Select a thread (1-{}): ", threads.len() + 1);
            io::stdout().flush().context("Failed to flush stdout")?;

            let mut line = String::new();
            let read = input
                .read_line(&mut line)
                .context("Failed to read input")?;
            if read == 0 {
                println!();
                return Ok(None);
            }

            match line.trim().parse::<usize>() {
                Ok(n) if n >= 1 && n <= threads.len() + 1 => break n,
                _ => println!(
                    "Invalid selection. Please enter a number between 1 and {}.",
                    threads.len() + 1
                ),
            }
        };

        if selection <= threads.len() {
            let thread = &threads[selection - 1];
            println!("Continuing thread: {}", thread.title.blue());
            Ok(Some(thread.id.clone()))
        } else {
            Ok(None)
        }
    }

    /// Accepts a 1-based position in the listing or a thread id
    pub fn resolve_thread_ref(threads: &[ChatThread], reference: &str) -> Option<String> {
        let reference = reference.trim();
        if let Some(thread) = threads.iter().find(|t| t.id == reference) {
            return Some(thread.id.clone());
        }
        match reference.parse::<usize>() {
            Ok(n) if n >= 1 && n <= threads.len() => Some(threads[n - 1].id.clone()),
            _ => None,
        }
    }

    pub fn print_thread_list(threads: &[ChatThread], now: DateTime<Utc>) {
        for (i, thread) in threads.iter().enumerate() {
            let detail = format!(
                "({} questions, {})",
                thread.question_count(),
                format_relative_date(&thread.timestamp, now)
            );
            println!(
                "  {}. {} {} {}",
                i + 1,
                thread.title.blue(),
                detail.dimmed(),
                format!("[{}]", thread.id).dimmed()
            );
        }
    }

    /// Replay a saved thread turn by turn
    pub fn print_thread(thread: &ChatThread) {
        println!("{}", thread.title.cyan().bold());
        println!(
            "{}",
            format!("Last updated {}", format_local_time(&thread.timestamp)).dimmed()
        );
        println!();
        for message in &thread.messages {
            if message.is_user {
                println!("{}: {}", "You".green().bold(), message.content);
            } else {
                print_answer(message);
            }
            println!();
        }
    }

    /// One-line title preview used in confirmations
    pub fn describe(thread: &ChatThread) -> String {
        format!("\"{}\"", truncate(&thread.title, 40))
    }
}

/// "Today", "Yesterday", "N days ago" within a week, a calendar date beyond that
pub fn format_relative_date(timestamp: &str, now: DateTime<Utc>) -> String {
    let Ok(date) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let days = now
        .signed_duration_since(date.with_timezone(&Utc))
        .num_days();
    match days {
        d if d <= 0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{} days ago", d),
        _ => date.format("%b %-d, %Y").to_string(),
    }
}

fn format_local_time(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}
