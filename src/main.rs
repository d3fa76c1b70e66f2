//! chatline - Entry Point

use chatline::model::EpochMillis;
use chatline::source::TimeRange;
use chatline::view::RunOptions;
use chrono::DateTime;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// chatline - browse, search and replay chat archive exports
#[derive(Parser, Debug)]
#[command(name = "chatline")]
#[command(version)]
#[command(about = "Print, search and replay one conversation from a chat archive export")]
pub struct Args {
    /// Path to the export (JSON array or JSONL)
    pub file: PathBuf,

    /// Conversation (talker id) to show; defaults to the first in the file
    #[arg(short, long)]
    pub conversation: Option<String>,

    /// Only include messages at or after this RFC 3339 instant
    #[arg(long, value_parser = parse_instant)]
    pub from: Option<EpochMillis>,

    /// Only include messages at or before this RFC 3339 instant
    #[arg(long, value_parser = parse_instant)]
    pub to: Option<EpochMillis>,

    /// Keyword to search for in message text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Show the messages around this sequence number
    #[arg(short, long, allow_negative_numbers = true)]
    pub jump_seq: Option<i64>,

    /// Replay the conversation in real time after printing it
    #[arg(short, long)]
    pub replay: bool,

    /// Replay speed multiplier (must be positive)
    #[arg(long, value_parser = parse_speed)]
    pub speed: Option<f64>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    fn range(&self) -> Option<TimeRange> {
        if self.from.is_none() && self.to.is_none() {
            None
        } else {
            Some(TimeRange::new(self.from, self.to))
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            file: self.file.clone(),
            conversation: self.conversation.clone(),
            range: self.range(),
            search: self.search.clone(),
            jump_seq: self.jump_seq,
            replay: self.replay,
        }
    }
}

fn parse_instant(raw: &str) -> Result<EpochMillis, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| EpochMillis::new(dt.timestamp_millis()))
        .map_err(|e| format!("expected an RFC 3339 instant like 2024-03-07T12:00:00Z: {e}"))
}

fn parse_speed(raw: &str) -> Result<f64, String> {
    let speed: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("speed must be a positive number, got {raw}"))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = chatline::config::load_config_with_precedence(args.config.clone())?;
        let merged = chatline::config::merge_config(config_file);
        let with_env = chatline::config::apply_env_overrides(merged);
        chatline::config::apply_cli_overrides(with_env, args.speed)
    };

    chatline::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let settings = config.view_settings()?;
    let stdout = std::io::stdout();
    chatline::view::run(&args.run_options(), settings, &mut stdout.lock())?;

    Ok(())
}
