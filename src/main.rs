//! guest-clipboard - clipboard mediation tool
//!
//! Entry point for the command-line binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use guest_clipboard::clipboard::{line_ending, policy, LineEnding};
use guest_clipboard::config::{Config, Overrides};
use guest_clipboard::logging;
use guest_clipboard::simulate;

/// Command-line arguments for guest-clipboard
#[derive(Parser, Debug)]
#[command(name = "guest-clipboard")]
#[command(version, about = "Guest/host clipboard mediation", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "GUEST_CLIPBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Write logs to a file in this directory (in addition to stderr)
    #[arg(long, env = "GUEST_CLIPBOARD_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Disable host → guest sharing
    #[arg(long, global = true)]
    pub no_to_guest: bool,

    /// Disable guest → host sharing
    #[arg(long, global = true)]
    pub no_to_client: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load, validate and print the effective configuration
    CheckConfig,

    /// Convert line endings of stdin to stdout
    Transcode {
        /// Target convention
        #[arg(long, value_enum)]
        to: LineEndingArg,
    },

    /// Run one host/guest copy-paste cycle against an in-process guest
    Simulate {
        /// Host clipboard convention
        #[arg(long, value_enum, default_value = "crlf")]
        host_line_ending: LineEndingArg,

        /// Guest agent convention
        #[arg(long, value_enum, default_value = "lf")]
        guest_line_ending: LineEndingArg,

        /// Text copied on the host
        #[arg(long, default_value = "copied on host\r\nsecond line")]
        host_text: String,

        /// Text copied in the guest
        #[arg(long, default_value = "copied in guest\nsecond line")]
        guest_text: String,
    },
}

/// Line-ending convention on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEndingArg {
    /// `\n`
    Lf,
    /// `\r\n`
    Crlf,
}

impl From<LineEndingArg> for LineEnding {
    fn from(arg: LineEndingArg) -> Self {
        match arg {
            LineEndingArg::Lf => LineEnding::Lf,
            LineEndingArg::Crlf => LineEnding::Crlf,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default_config(),
    };
    let config = config.with_overrides(Overrides {
        to_guest_enabled: args.no_to_guest.then_some(false),
        to_client_enabled: args.no_to_client.then_some(false),
        verbosity: (args.verbose > 0).then(|| args.verbose.saturating_add(2)),
        log_format: args.log_format.clone(),
        log_dir: args.log_dir.clone(),
    });
    config.validate()?;

    // Guard flushes the log file on exit
    let _log_guard = logging::init_logging(&config.logging)?;

    info!("════════════════════════════════════════════════════════");
    info!("  guest-clipboard v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} (UTC)", env!("BUILD_DATE"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");
    debug!("Config: {:?}", config);

    match args.command {
        Command::CheckConfig => {
            let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
            println!("{}", rendered);
            info!("Configuration is valid");
        }
        Command::Transcode { to } => transcode(to.into())?,
        Command::Simulate {
            host_line_ending,
            guest_line_ending,
            host_text,
            guest_text,
        } => {
            let report = simulate::run_simulation(
                &config.clipboard,
                host_line_ending.into(),
                guest_line_ending.into(),
                &host_text,
                &guest_text,
            )?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to render report")?
            );
        }
    }

    Ok(())
}

fn transcode(to: LineEnding) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read stdin")?;

    let text = line_ending::until_nul(&input);
    if text.len() < input.len() {
        warn!("Input truncated at embedded NUL ({} of {} bytes)", text.len(), input.len());
    }
    policy::check_size(text.len())?;

    let from = match to {
        LineEnding::Lf => LineEnding::Crlf,
        LineEnding::Crlf => LineEnding::Lf,
    };
    let payload = line_ending::convert(text, from, to)?;
    info!("Transcoded {} bytes to {} bytes", text.len(), payload.len());

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(payload.as_bytes())
        .context("Failed to write stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
