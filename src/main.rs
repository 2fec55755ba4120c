//! logtree CLI
//!
//! Thin driver around logtree-core for trying out logger trees from the shell.
//!
//! ## Usage
//!
//! ```bash
//! # Emit a warning through the root logger (stderr)
//! logtree emit "disk almost full"
//!
//! # Emit from app.db, which also writes to its own file
//! logtree emit --logger app.db --threshold debug --level info --file db.log "pool ready"
//!
//! # Apply a JSON tree configuration, then emit
//! logtree apply tree.json --logger app.db --level error "connection lost"
//!
//! # Preview what a record template produces
//! logtree render --record-format "%L %n: %m" --name app "hello"
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use logtree_core::format::{DEFAULT_RECORD_FORMAT, DEFAULT_TIME_FORMAT};
use logtree_core::{
    designate_main_thread, get_logger, root_logger, Logger, LoggerConfig, RecordFormatter,
    Registry, Severity, SinkSelector, TreeConfig,
};

/// logtree - hierarchical logger tree driver
#[derive(Parser)]
#[command(name = "logtree")]
#[command(version = "0.1.0")]
#[command(about = "Emit records through a hierarchical logger tree")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the tree's own diagnostics (lookups, creation, teardown)
    #[arg(long, global = true)]
    autolog: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit records through a logger of the tree
    Emit(EmitArgs),

    /// Load a JSON tree configuration, apply it, then emit
    Apply {
        /// Path to the JSON configuration
        config: PathBuf,

        /// Dotted logger name (empty for the root)
        #[arg(short, long, default_value = "")]
        logger: String,

        /// Severity of the emitted records
        #[arg(short = 'L', long, default_value_t = Severity::Warning)]
        level: Severity,

        /// Messages, one record each
        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Print the record a template produces, without any logger tree
    Render {
        #[arg(long, default_value = DEFAULT_RECORD_FORMAT)]
        record_format: String,

        #[arg(long, default_value = DEFAULT_TIME_FORMAT)]
        time_format: String,

        /// Logger name substituted for %n / %N
        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short = 'L', long, default_value_t = Severity::Error)]
        level: Severity,

        message: String,
    },
}

#[derive(Args)]
struct EmitArgs {
    /// Dotted logger name (empty for the root)
    #[arg(short, long, default_value = "")]
    logger: String,

    /// Severity of the emitted records
    #[arg(short = 'L', long, default_value_t = Severity::Warning)]
    level: Severity,

    /// Threshold set on the logger itself
    #[arg(short, long)]
    threshold: Option<Severity>,

    /// Console stream of the logger: none, stdout, stderr or stdlog
    #[arg(short, long)]
    stream: Option<SinkSelector>,

    /// Log file of the logger
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[arg(long)]
    record_format: Option<String>,

    #[arg(long)]
    time_format: Option<String>,

    /// Stop records at this logger instead of passing them to its ancestors
    #[arg(long)]
    no_propagate: bool,

    /// Leave the root logger without its default stderr stream
    #[arg(long)]
    quiet_root: bool,

    /// Messages, one record each
    #[arg(required = true)]
    messages: Vec<String>,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

fn emit_all(logger: &Logger, level: Severity, messages: &[String]) {
    for message in messages {
        logger.log(level, format_args!("{}", message));
    }
    tracing::debug!(logger = %logger.name(), count = messages.len(), "emitted records");
}

fn run_emit(args: EmitArgs) -> Result<()> {
    if !args.quiet_root {
        root_logger(None, Some(SinkSelector::Stderr));
    }

    let logger = get_logger(&args.logger, args.threshold, args.stream);
    let config = LoggerConfig {
        file: args.file.clone(),
        propagate: args.no_propagate.then_some(false),
        record_format: args.record_format.clone(),
        time_format: args.time_format.clone(),
        ..Default::default()
    };
    config
        .apply_to(&logger)
        .with_context(|| format!("Failed to configure logger '{}'", args.logger))?;

    emit_all(&logger, args.level, &args.messages);
    Ok(())
}

fn run_apply(config: PathBuf, name: &str, level: Severity, messages: &[String]) -> Result<()> {
    let text = fs::read_to_string(&config)
        .with_context(|| format!("Failed to read config file {}", config.display()))?;
    let tree: TreeConfig = serde_json::from_str(&text)
        .with_context(|| format!("Invalid tree configuration in {}", config.display()))?;

    let registry = Registry::global();
    let _configured = registry
        .apply(&tree)
        .context("Failed to apply tree configuration")?;
    tracing::info!(loggers = tree.loggers.len(), "tree configuration applied");

    let logger = registry
        .try_get(name)
        .with_context(|| format!("Invalid logger name '{}'", name))?;
    emit_all(&logger, level, messages);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    designate_main_thread();

    if cli.autolog {
        Registry::global().set_autolog(true);
    }

    match cli.command {
        Commands::Emit(args) => run_emit(args)?,

        Commands::Apply {
            config,
            logger,
            level,
            messages,
        } => run_apply(config, &logger, level, &messages)?,

        Commands::Render {
            record_format,
            time_format,
            name,
            level,
            message,
        } => {
            let formatter = RecordFormatter::new(record_format, time_format, false);
            println!("{}", formatter.render_record(&message, &name, level.as_raw()));
        }
    }

    Ok(())
}
