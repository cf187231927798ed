//! Binary entrypoint for the plugkit CLI.
//!
//! Commands:
//! - `init [--force]` - write a starter `plugkit.toml`
//! - `check` - load and validate the config, then print the command table
//! - `replay <script.json>` - play a scripted session against the in-memory host
//!
//! See the library crate docs for module-level details: `plugkit::`.
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::info;

use plugkit::command::{CommandHandler, CommandRegistry};
use plugkit::config::Config;
use plugkit::host::memory::MemoryHost;

#[derive(Parser)]
#[command(name = "plugkit")]
#[command(about = "Command validation and inventory GUI toolkit for game-server plugins")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "plugkit.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the configuration and list declared commands
    Check,
    /// Replay a JSON script of commands and GUI events
    Replay {
        /// Script file
        script: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            init_logging(&None, cli.verbose);
            if !force && std::path::Path::new(&cli.config).exists() {
                bail!("{} already exists (use --force to overwrite)", cli.config);
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Check => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            config.validate()?;
            print_command_table(&config)?;
        }
        Commands::Replay { script } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            run_replay(&config, &script).await?;
        }
    }

    Ok(())
}

fn print_command_table(config: &Config) -> Result<()> {
    let messages = &config.commands.messages;
    let mut registry: CommandRegistry<MemoryHost> = CommandRegistry::new(messages);
    for def in &config.commands.defs {
        let handler = CommandHandler::<MemoryHost>::builder_from_def(def, messages)
            .on_execute(|_, _| Ok(()))?;
        registry.register(handler)?;
    }
    println!("{} ({} command(s))", config.plugin.name, registry.len());
    for name in registry.names() {
        let Some(handler) = registry.resolve(name) else { continue };
        let stages: Vec<&str> = handler.rules().iter().map(|r| r.stage().as_str()).collect();
        let aliases = if handler.aliases().is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", handler.aliases().join(", "))
        };
        println!(
            "  {}{}{} - {} [{}]",
            config.plugin.command_prefix,
            name,
            aliases,
            handler.usage(),
            stages.join(" -> ")
        );
    }
    Ok(())
}

#[cfg(feature = "replay")]
async fn run_replay(config: &Config, path: &str) -> Result<()> {
    use plugkit::replay::{ReplayScript, ReplaySession};

    let script = ReplayScript::load(path).await?;
    let mut session = ReplaySession::new(config)?;
    for line in session.run(&script)? {
        println!("{}", line);
    }
    let stats = plugkit::metrics::snapshot();
    println!(
        "-- {} dispatched, {} rejected, {} failed; {} GUI(s) opened, {} page turn(s)",
        stats.commands_dispatched,
        stats.rejected_total(),
        stats.callback_failures,
        stats.guis_opened,
        stats.page_turns
    );
    Ok(())
}

#[cfg(not(feature = "replay"))]
async fn run_replay(_config: &Config, _path: &str) -> Result<()> {
    bail!("replay support requires the 'replay' feature");
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config.as_ref().and_then(|c| c.logging.file.clone());
    let log_file = file.and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            let security_path = config.as_ref().and_then(|c| c.logging.security_file.clone());
            // Mirror to the console only when attached to a terminal
            let is_tty = atty::is(atty::Stream::Stdout);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if record.target() == "security" {
                    if let Some(ref sec_path) = security_path {
                        if let Ok(mut sf) = std::fs::OpenOptions::new()
                            .create(true)
                            .append(true)
                            .open(sec_path)
                        {
                            let _ = writeln!(sf, "{}", line);
                        }
                    }
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
