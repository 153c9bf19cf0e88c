use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use truthtriage_core::StrategyKind;

/// Terminal client for the TruthTriage medical assistant
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The question to ask (or the condition, with --doctors)
    #[arg(index = 1)] // Positional argument
    pub prompt: Option<String>,

    /// Enter interactive chat mode
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Use the forensic dashboard profile (similarity scoring, separate history)
    #[arg(long, default_value_t = false)]
    pub forensic: bool,

    /// Override the profile's confidence strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Pick a saved thread to continue before chatting
    #[arg(long, default_value_t = false)]
    pub select_thread: bool,

    /// List saved threads
    #[arg(long, default_value_t = false)]
    pub history: bool,

    /// Print one saved thread
    #[arg(long, value_name = "ID")]
    pub show: Option<String>,

    /// Delete one saved thread
    #[arg(long, value_name = "ID")]
    pub delete: Option<String>,

    /// Delete every saved thread of the selected profile
    #[arg(long, default_value_t = false)]
    pub clear_history: bool,

    /// Find specialists near this location for the prompt's condition
    #[arg(long, value_name = "LOCATION")]
    pub doctors: Option<String>,

    /// Check that the backend is up
    #[arg(long, default_value_t = false)]
    pub health: bool,

    /// List the documents the backend has loaded
    #[arg(long, default_value_t = false)]
    pub documents: bool,

    /// Turn suggested questions on or off
    #[arg(long, value_enum, value_name = "STATE")]
    pub suggestions: Option<Toggle>,

    /// Print results as JSON instead of formatted text
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Base URL of the TruthTriage backend
    #[arg(long, env = "TRUTHTRIAGE_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding chat history and preferences
    #[arg(long, env = "TRUTHTRIAGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, env = "TRUTHTRIAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the merged settings back to the config file
    #[arg(long, default_value_t = false)]
    pub save_config: bool,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    SourceCount,
    Similarity,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::SourceCount => StrategyKind::SourceCount,
            StrategyArg::Similarity => StrategyKind::Similarity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(&self) -> bool {
        matches!(self, Toggle::On)
    }
}
