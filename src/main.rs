// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_config::{Config, EngineProvider};
use app_controller::Controller;
use file_utils::FileManager;

mod app_config;
mod app_controller;
mod audio;
mod engines;
mod errors;
mod file_utils;
mod subtitle_processor;
mod sync;

/// CLI Wrapper for EngineProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEngineProvider {
    Http,
    Mock,
}

impl From<CliEngineProvider> for EngineProvider {
    fn from(cli_provider: CliEngineProvider) -> Self {
        match cli_provider {
            CliEngineProvider::Http => EngineProvider::Http,
            CliEngineProvider::Mock => EngineProvider::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dub a subtitle file with synthesized speech (default command)
    #[command(alias = "dub")]
    Dub(DubArgs),

    /// Generate shell completions for dubwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct DubArgs {
    /// Input SRT subtitle file
    #[arg(value_name = "SUBTITLE_FILE")]
    subtitle_file: PathBuf,

    /// Voice reference audio file for the synthesis
    #[arg(value_name = "VOICE_REFERENCE")]
    voice_reference: PathBuf,

    /// Output WAV file path (defaults to the subtitle name with .dubbed.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TTS engine to use
    #[arg(short, long, value_enum)]
    engine: Option<CliEngineProvider>,

    /// Model name to use for synthesis
    #[arg(short, long)]
    model: Option<String>,

    /// Duration-matching strategy
    #[arg(short, long)]
    strategy: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// dubwai - Yet Another Subtitle Dubbing Tool
///
/// A subtitle dubbing tool that reads an SRT file, synthesizes each cue
/// with a TTS engine and composes one dubbed audio track.
#[derive(Parser, Debug)]
#[command(name = "dubwai")]
#[command(version = "0.1.0")]
#[command(about = "TTS-powered subtitle dubbing tool")]
#[command(long_about = "dubwai synthesizes each subtitle cue with a TTS engine and composes \
the results into a single dubbed audio track whose timing follows the subtitles.

EXAMPLES:
    dubwai movie.srt voice.wav                     # Dub using default config
    dubwai -o dub.wav movie.srt voice.wav          # Write to a specific file
    dubwai -s iterative movie.srt voice.wav        # Pick a duration strategy
    dubwai -e mock movie.srt voice.wav             # Run against the mock engine
    dubwai --log-level debug movie.srt voice.wav   # Verbose logging
    dubwai completions bash > dubwai.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.

STRATEGIES:
    direct      - Plain synthesis, no duration matching
    stretch     - Time-domain stretch into the cue window
    stretch_hq  - Stretch with a narrower quality band
    hq_stretch  - Hybrid time-domain plus phase-vocoder stretch
    iterative   - Resynthesis loop steered by the length penalty
    two_stage   - One corrective resynthesis, then stretch refinement
    adaptive    - Binary search over the penalty (duration-targeting engines)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT subtitle file
    #[arg(value_name = "SUBTITLE_FILE")]
    subtitle_file: Option<PathBuf>,

    /// Voice reference audio file for the synthesis
    #[arg(value_name = "VOICE_REFERENCE")]
    voice_reference: Option<PathBuf>,

    /// Output WAV file path (defaults to the subtitle name with .dubbed.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TTS engine to use
    #[arg(short, long, value_enum)]
    engine: Option<CliEngineProvider>,

    /// Model name to use for synthesis
    #[arg(short, long)]
    model: Option<String>,

    /// Duration-matching strategy
    #[arg(short, long)]
    strategy: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let emoji = Self::get_emoji_for_level(record.level());

            let color = match record.level() {
                Level::Error => "\x1B[1;31m",
                Level::Warn => "\x1B[1;33m",
                Level::Info => "\x1B[1;32m",
                Level::Debug => "\x1B[1;36m",
                Level::Trace => "\x1B[1;35m",
            };

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                color,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "dubwai", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Dub(args)) => run_dub(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let subtitle_file = cli
                .subtitle_file
                .ok_or_else(|| anyhow!("SUBTITLE_FILE is required when no subcommand is specified"))?;
            let voice_reference = cli
                .voice_reference
                .ok_or_else(|| anyhow!("VOICE_REFERENCE is required when no subcommand is specified"))?;

            let dub_args = DubArgs {
                subtitle_file,
                voice_reference,
                output: cli.output,
                engine: cli.engine,
                model: cli.model,
                strategy: cli.strategy,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_dub(dub_args).await
        }
    }
}

async fn run_dub(options: DubArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let mut config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        // Override config with CLI options if provided
        if let Some(engine) = &options.engine {
            config.engine.provider = engine.clone().into();
        }

        if let Some(model) = &options.model {
            config.engine.model = model.clone();
        }

        if let Some(strategy) = &options.strategy {
            config.sync.strategy = strategy.clone();
        }

        // Update log level in config if specified via command line
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        config
    } else {
        // Create default configuration if not exists
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let mut config = Config::default();

        if let Some(engine) = &options.engine {
            config.engine.provider = engine.clone().into();
        }

        if let Some(strategy) = &options.strategy {
            config.sync.strategy = strategy.clone();
        }

        // Apply command line log level to default config if specified
        if let Some(log_level) = &options.log_level {
            config.log_level = log_level.clone().into();
        }

        // Save default config
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Validate the configuration after loading and overriding
    config
        .validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        // Just update the max level without reinitializing the logger
        log::set_max_level(level_filter(&config.log_level));
    }

    // Default output path sits next to the subtitle file
    let output_path = match options.output {
        Some(path) => path,
        None => FileManager::generate_output_path(
            &options.subtitle_file,
            options.subtitle_file.parent().unwrap_or(Path::new(".")),
            "wav",
        ),
    };

    // Create controller and run the workflow
    let controller = Controller::with_config(config)?;
    controller
        .run(options.subtitle_file, options.voice_reference, output_path)
        .await
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}
