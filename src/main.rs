//! AI Panel - ask several AI providers one question
//!
//! A CLI that sends a prompt to a panel aggregation endpoint and types
//! every provider's answer out side by side, with live timing and
//! token-rate statistics. A demo mode replays canned answers offline,
//! and an interactive mode keeps one panel open across many requests.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad input, config, interrupted, etc.)
//!   2 - At least one agent ended in error

mod cli;
mod client;
mod config;
mod display;
mod error;
mod models;
mod panel;
mod session;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use display::LiveView;
use error::PanelError;
use models::{ApiStatus, PromptInput};
use panel::{Panel, PanelSnapshot, RequestOutcome};
use session::Command;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// How often the live view is redrawn.
const RENDER_INTERVAL: Duration = Duration::from_millis(80);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("AI Panel v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            // Input problems are reported like the send button reports them
            if let Some(panel_error) = e.downcast_ref::<PanelError>() {
                if panel_error.is_validation() {
                    eprintln!("⚠️  {}", panel_error);
                    std::process::exit(1);
                }
            }
            error!("Panel run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .aipanel.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .aipanel.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .aipanel.toml")?;

    println!("✅ Created .aipanel.toml with default settings.");
    println!("   Edit it to choose the endpoint, agents, and animation timings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// One request against the panel.
enum Job {
    Ask(PromptInput),
    Demo(Option<String>),
}

/// Print a banner line unless quiet; stderr when stdout carries JSON.
fn notice(args: &Args, message: &str) {
    if args.quiet {
        return;
    }
    if args.notices_to_stderr() {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

/// Run the panel. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let panel = Panel::new(&config).context("Failed to create HTTP client")?;

    if args.check {
        return handle_check(&panel).await;
    }

    notice(&args, &format!("🧑‍⚖️ {}", panel.model_count_label()));
    if !args.demo {
        notice(&args, &format!("   Endpoint: {}", panel.endpoint()));
    }

    if args.interactive {
        return run_interactive(&panel, &args).await;
    }

    let job = if args.demo {
        Job::Demo(args.prompt.clone())
    } else {
        Job::Ask(PromptInput {
            prompt: args.prompt.clone().unwrap_or_default(),
            session_id: args.session_id.clone(),
            instructions: args.instructions.clone(),
        })
    };

    let Some(snapshot) = run_job(&panel, &args, job).await? else {
        return Ok(1);
    };
    print_summary(&args, &snapshot)?;

    if display::has_errors(&snapshot) {
        return Ok(2);
    }
    Ok(0)
}

/// Read prompts and commands from stdin against one panel, so statistics
/// and the agent selection carry over between requests.
async fn run_interactive(panel: &Panel, args: &Args) -> Result<i32> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_id = args.session_id.clone();
    let mut exit_code = 0;

    notice(args, "💬 Interactive session. Type a prompt, or :help for commands.");

    // A prompt or --demo on the command line runs first.
    let mut pending = if args.demo {
        Some(Command::Demo(args.prompt.clone()))
    } else {
        args.prompt.clone().map(Command::Ask)
    };

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => {
                let line = tokio::select! {
                    line = lines.next_line() => line.context("Failed to read stdin")?,
                    _ = tokio::signal::ctrl_c() => {
                        panel.shutdown();
                        eprintln!("\n⛔ Interrupted, all timers stopped.");
                        return Ok(1);
                    }
                };
                let Some(line) = line else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("⚠️  {}", e);
                        continue;
                    }
                }
            }
        };

        let job = match command {
            Command::Ask(prompt) => Job::Ask(PromptInput {
                prompt,
                session_id: session_id.clone(),
                instructions: args.instructions.clone(),
            }),
            Command::Demo(prompt) => Job::Demo(prompt),
            Command::Toggle(agent) => {
                let state = if panel.toggle_agent(agent) {
                    "enabled"
                } else {
                    "disabled"
                };
                notice(
                    args,
                    &format!(
                        "   {} {} ({})",
                        agent.display_name(),
                        state,
                        panel.model_count_label()
                    ),
                );
                continue;
            }
            Command::SelectAll => {
                panel.select_all();
                notice(args, &format!("   {}", panel.model_count_label()));
                continue;
            }
            Command::DeselectAll => {
                panel.deselect_all();
                notice(args, &format!("   {}", panel.model_count_label()));
                continue;
            }
            Command::Models => {
                notice(args, &display::render_selection(&panel.selection()));
                continue;
            }
            Command::Stats => {
                notice(args, &display::render_stats(&panel.snapshot().stats));
                continue;
            }
            Command::Check => {
                let status = panel.check_connection().await;
                notice(args, &format!("   {}", status));
                continue;
            }
            Command::Help => {
                notice(args, session::HELP);
                continue;
            }
            Command::Quit => break,
        };

        let is_live = matches!(job, Job::Ask(_));
        match run_job(panel, args, job).await {
            Ok(Some(snapshot)) => {
                if is_live {
                    // Later prompts stay in the same session.
                    session_id = snapshot.session_id.clone();
                }
                print_summary(args, &snapshot)?;
                if display::has_errors(&snapshot) {
                    exit_code = 2;
                }
            }
            Ok(None) => return Ok(1),
            Err(e) => match e.downcast_ref::<PanelError>() {
                Some(panel_error) if panel_error.is_validation() => {
                    eprintln!("⚠️  {}", panel_error);
                }
                _ => return Err(e),
            },
        }
    }

    info!("Interactive session ended");
    Ok(exit_code)
}

/// Run one job with a live view. Returns `None` when interrupted.
async fn run_job(panel: &Panel, args: &Args, job: Job) -> Result<Option<PanelSnapshot>> {
    let view = LiveView::new(&panel.active_agents(), args.quiet);

    let result = tokio::select! {
        result = drive(panel, args, job, &view) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            panel.shutdown();
            None
        }
    };

    let snapshot = panel.snapshot();
    view.finish(&snapshot);

    match result {
        Some(result) => {
            result?;
            Ok(Some(snapshot))
        }
        None => {
            eprintln!("\n⛔ Interrupted, all timers stopped.");
            Ok(None)
        }
    }
}

fn print_summary(args: &Args, snapshot: &PanelSnapshot) -> Result<()> {
    match args.format {
        OutputFormat::Text => println!("{}", display::render_text_summary(snapshot)),
        OutputFormat::Json => println!("{}", display::render_json_summary(snapshot)?),
    }
    Ok(())
}

/// Start the request and keep the live view fresh until every agent is done.
async fn drive(panel: &Panel, args: &Args, job: Job, view: &LiveView) -> Result<()> {
    let mut ticker = tokio::time::interval(RENDER_INTERVAL);

    match job {
        Job::Demo(prompt) => {
            let prompt = panel.run_demo(prompt.as_deref())?;
            notice(args, "✨ Running demo mode with simulated responses...");
            notice(args, &format!("   Prompt: {}\n", prompt));
        }
        Job::Ask(input) => {
            let send = panel.send(input);
            tokio::pin!(send);

            let outcome = loop {
                tokio::select! {
                    result = &mut send => break result?,
                    _ = ticker.tick() => view.render(&panel.snapshot()),
                }
            };

            match outcome {
                RequestOutcome::Answered {
                    session_id,
                    answered,
                    missing,
                } => info!(
                    session_id = %session_id,
                    answered,
                    missing,
                    "Panel answered"
                ),
                RequestOutcome::Blocked { session_id, reason } => {
                    warn!(session_id = %session_id, "Panel request blocked: {}", reason)
                }
            }
        }
    }

    if args.quiet {
        panel.wait_settled().await;
        return Ok(());
    }

    while !panel.settled() {
        ticker.tick().await;
        view.render(&panel.snapshot());
    }

    Ok(())
}

/// Handle --check: probe the endpoint and report its status.
async fn handle_check(panel: &Panel) -> Result<i32> {
    println!("🔍 Testing API connection...");
    let status = panel.check_connection().await;
    println!("   {}", status);

    if status == ApiStatus::Working {
        Ok(0)
    } else {
        Ok(1)
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
