use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use truthtriage_core::config::{get_default_config_file, TriageConfig};
use truthtriage_core::{
    ConfidenceEstimator, FileStore, Preferences, SessionProfile, StoreRef, TriageClient,
    TriageError, TriageSession,
};

mod app;
mod cli;
mod logging;
mod output;
mod session_manager;

use crate::app::App;
use crate::cli::Args;
use crate::logging::{effective_level, init_tracing, log_error};
use crate::output::print_usage_instructions;

const APP_NAME: &str = "truthtriage";

/// Main function - builds the session and runs the requested action
#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads its env fallbacks
    dotenv().ok();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error(&format!("{:#}", e));
            if e
                .downcast_ref::<TriageError>()
                .is_some_and(TriageError::is_transport)
            {
                eprintln!(
                    "{}",
                    "Is the TruthTriage backend running? Set --api-url or TRUTHTRIAGE_API_URL."
                        .yellow()
                );
            }
            ExitCode::FAILURE
        }
    }
}

fn config_path(args: &Args) -> Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => Ok(get_default_config_file(APP_NAME)?),
    }
}

/// Config file values overridden by command-line flags
fn load_config(args: &Args) -> Result<TriageConfig> {
    let path = config_path(args)?;
    let file_config = TriageConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let flags = TriageConfig {
        api_base_url: args.api_url.clone(),
        data_dir: args.data_dir.clone(),
        confidence_strategy: args.strategy.map(Into::into),
        ..Default::default()
    };
    Ok(file_config.merge(&flags))
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    init_tracing(effective_level(config.log_level.as_deref(), args.verbose));

    if args.save_config {
        let path = config_path(&args)?;
        config
            .save_to_file(&path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Saved settings to {}", path.display());
    }

    let profile = if args.forensic {
        SessionProfile::Forensic
    } else {
        SessionProfile::Chat
    };
    let strategy = config
        .confidence_strategy
        .unwrap_or_else(|| profile.default_strategy());

    let data_dir = config.resolve_data_dir(APP_NAME)?;
    let store: StoreRef = Arc::new(
        FileStore::open(&data_dir)
            .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?,
    );
    info!("Using data directory {}", data_dir.display());

    let client = TriageClient::new(&config).context("Failed to initialize backend client")?;
    let session = TriageSession::with_estimator(
        store.clone(),
        profile,
        ConfidenceEstimator::new(strategy),
    )
    .context("Failed to load chat history")?;

    let mut app = App {
        client,
        session,
        preferences: Preferences::new(store),
        default_location: config.default_location.clone(),
        json: args.json,
    };

    if let Some(toggle) = args.suggestions {
        app.set_suggestions(toggle.enabled())?;
    }

    if args.health {
        app.run_health().await
    } else if args.documents {
        app.run_documents().await
    } else if args.history {
        app.list_history()
    } else if let Some(reference) = &args.show {
        app.show_thread(reference)
    } else if let Some(reference) = &args.delete {
        app.delete_thread(reference)
    } else if args.clear_history {
        app.clear_history()
    } else if let Some(location) = &args.doctors {
        app.run_doctor_search(args.prompt.clone(), location).await
    } else if args.interactive {
        if args.select_thread {
            app.select_thread()?;
        }
        app.run_interactive_chat().await
    } else if let Some(prompt) = args.prompt.clone() {
        app.run_single_query(prompt).await
    } else if args.suggestions.is_none() && !args.save_config {
        // No prompt and not interactive, show usage
        eprintln!("{}", "Nothing to do.".yellow());
        print_usage_instructions();
        Ok(())
    } else {
        Ok(())
    }
}
