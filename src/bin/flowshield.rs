//! FlowShield CLI - Command-line interface for the IVI engine
//!
//! Commands:
//! - score: Score a set of interaction counters
//! - mapping: Print the button mapping and device profile for a state
//! - simulate: Replay a timed NDJSON script on a virtual clock
//! - voice: Interpret a voice command
//! - ask: Ask the cognitive coach about a (simulated) session
//! - report: Sample-day analytics
//! - live: Run the live aggregation loop driven by stdin commands
//! - doctor: Diagnose configuration and credentials

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use flowshield::analytics::{format_duration, sample_summary};
use flowshield::coach::{build_coach, CoachSession, UserProfile};
use flowshield::config::{ENV_API_KEY, ENV_PROXY_URL};
use flowshield::dashboard::{DashboardSnapshot, FlowDashboard};
use flowshield::ivi::mapping::{lookup_button_mapping, lookup_device_profile};
use flowshield::ivi::presentation::style_for_score;
use flowshield::ivi::score::{evaluate, formula_breakdown};
use flowshield::modes::format_countdown;
use flowshield::replay::{parse_script, replay};
use flowshield::voice::interpret;
use flowshield::{
    FlowConfig, FlowError, FocusMode, InteractionCounters, InteractionEvent, IviState, LiveDriver,
    FLOWSHIELD_VERSION, PRODUCER_NAME,
};

/// FlowShield - Interaction Volatility Index engine
#[derive(Parser)]
#[command(name = "flowshield")]
#[command(author = "FlowShield Team")]
#[command(version = FLOWSHIELD_VERSION)]
#[command(about = "Score interaction volatility and coach focus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a set of interaction counters
    Score {
        #[arg(long, default_value = "0")]
        app_switches: u32,

        #[arg(long, default_value = "0")]
        tab_churn: u32,

        #[arg(long, default_value = "0")]
        oscillations: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the button mapping and device profile for a state
    Mapping {
        /// State label, e.g. "Deep Focus" or "fragmented"
        #[arg(long)]
        state: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a timed NDJSON script on a virtual clock
    Simulate {
        /// Script file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep running until this virtual time (ms)
        #[arg(long, default_value = "0")]
        until_ms: u64,

        /// Output snapshots as NDJSON
        #[arg(long)]
        json: bool,
    },

    /// Interpret a voice command
    Voice {
        /// Recognized utterance
        #[arg(required = true)]
        utterance: Vec<String>,
    },

    /// Ask the cognitive coach about a session
    Ask {
        /// Question for the coach
        #[arg(required = true)]
        message: Vec<String>,

        /// Replay this script first and ask about the resulting state
        #[arg(long)]
        script: Option<PathBuf>,

        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Sample-day analytics
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the live aggregation loop, reading commands from stdin
    Live {
        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Diagnose configuration and credentials
    Doctor {
        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), FlowCliError> {
    match cli.command {
        Commands::Score {
            app_switches,
            tab_churn,
            oscillations,
            json,
        } => cmd_score(InteractionCounters::new(app_switches, tab_churn, oscillations), json),

        Commands::Mapping { state, json } => cmd_mapping(&state, json),

        Commands::Simulate {
            input,
            config,
            until_ms,
            json,
        } => cmd_simulate(&input, config.as_deref(), until_ms, json),

        Commands::Voice { utterance } => cmd_voice(&utterance.join(" ")),

        Commands::Ask {
            message,
            script,
            config,
        } => cmd_ask(&message.join(" "), script.as_deref(), config.as_deref()).await,

        Commands::Report { json } => cmd_report(json),

        Commands::Live { config } => cmd_live(config.as_deref()).await,

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<FlowConfig, FlowCliError> {
    let mut config = match path {
        Some(path) => FlowConfig::load(path)?,
        None => FlowConfig::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

fn read_input(input: &Path) -> Result<String, FlowCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn cmd_score(counters: InteractionCounters, json: bool) -> Result<(), FlowCliError> {
    let reading = evaluate(&counters);
    let style = style_for_score(reading.score);

    if json {
        let report = serde_json::json!({
            "counters": counters,
            "score": reading.score,
            "state": reading.state,
            "label": reading.state.label(),
            "formula": formula_breakdown(&counters),
            "color": style.color,
            "message": style.message,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("IVI:     {} ({})", reading.score, reading.state);
        println!("Formula: {}", formula_breakdown(&counters));
        println!("{}", style.message);
    }
    Ok(())
}

fn cmd_mapping(label: &str, json: bool) -> Result<(), FlowCliError> {
    let mapping = lookup_button_mapping(label);
    let profile = lookup_device_profile(label);
    let recognized = IviState::parse_label(label).is_some();

    if json {
        let report = serde_json::json!({
            "requested": label,
            "recognized": recognized,
            "mapping": mapping,
            "profile": profile,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !recognized {
        eprintln!("Unknown state '{}', showing {}", label, profile.state);
    }
    println!("{} → {}", profile.state, profile.profile_name);
    println!("{}", profile.behavior_summary);
    println!();
    for (slot, action) in mapping.entries() {
        println!("  {:<14} {}", slot.label(), action);
    }
    Ok(())
}

fn cmd_simulate(
    input: &Path,
    config: Option<&Path>,
    until_ms: u64,
    json: bool,
) -> Result<(), FlowCliError> {
    let config = load_config(config)?;
    let script = parse_script(&read_input(input)?)?;
    if script.is_empty() && until_ms == 0 {
        return Err(FlowCliError::EmptyScript);
    }

    let mut dashboard = FlowDashboard::new(&config);
    let outcome = replay(&mut dashboard, &script, until_ms);

    if json {
        for snapshot in &outcome.ticks {
            println!("{}", serde_json::to_string(snapshot)?);
        }
        return Ok(());
    }

    for snapshot in &outcome.ticks {
        println!("{}", live_line(snapshot));
    }
    for command in &outcome.voice {
        println!("voice \"{}\": {}", command.transcript, command.action);
    }
    let last = &outcome.final_snapshot;
    println!(
        "final: IVI {} ({}), {} ticks, mode {}",
        last.ivi.score, last.ivi.state, last.ivi.ticks, last.mode_label
    );
    Ok(())
}

fn cmd_voice(utterance: &str) -> Result<(), FlowCliError> {
    let command = interpret(utterance);
    println!("{}", serde_json::to_string_pretty(&command)?);
    Ok(())
}

async fn cmd_ask(
    message: &str,
    script: Option<&Path>,
    config: Option<&Path>,
) -> Result<(), FlowCliError> {
    let config = load_config(config)?;
    let mut dashboard = FlowDashboard::new(&config);
    if let Some(path) = script {
        let entries = parse_script(&read_input(path)?)?;
        replay(&mut dashboard, &entries, 0);
    }

    let backend = build_coach(&config.coach).map_err(FlowError::from)?;
    let mut session = CoachSession::new(backend, UserProfile::default());
    let snapshot = dashboard.snapshot();

    let reply = session
        .ask(message, &snapshot.ivi, snapshot.mode)
        .await
        .map(|m| m.content.clone())
        .ok_or_else(|| FlowCliError::InvalidArgument("message is empty".to_string()))?;
    println!("{reply}");

    match session.last_error() {
        Some(error) => Err(FlowCliError::Coach(error.to_string())),
        None => Ok(()),
    }
}

fn cmd_report(json: bool) -> Result<(), FlowCliError> {
    let summary = sample_summary().ok_or(FlowCliError::NoSamples)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Sample Workday");
    println!("==============");
    println!("Total Deep Work: {}", format_duration(summary.deep_work_minutes));
    println!("Average IVI:     {} ({})", summary.average_ivi, summary.average_state);
    println!(
        "Peak IVI:        {} at {}",
        summary.peak.ivi,
        summary.peak.time_label()
    );
    if let Some(app) = summary.most_distracting_app {
        println!("Most Distracting: {app}");
    }
    if let Some(window) = &summary.most_stable_window {
        println!("Peak Focus:      {window}");
    }
    println!("\nTime per state:");
    for (state, minutes) in &summary.minutes_per_state {
        println!("  {:<11} {}", state.label(), format_duration(*minutes));
    }
    println!("\nInsights:");
    for line in summary.insights() {
        println!("  - {line}");
    }
    Ok(())
}

enum LiveCommand {
    Event(InteractionEvent),
    Chaos,
    Focus,
    App(String),
    Mode(FocusMode),
    StopMode,
    Say(String),
    Quit,
}

fn parse_live_command(line: &str) -> Result<Option<LiveCommand>, FlowCliError> {
    let line = line.trim();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let command = match head {
        "" => return Ok(None),
        "switch" => LiveCommand::Event(InteractionEvent::AppSwitch),
        "tab" => LiveCommand::Event(InteractionEvent::TabChurn),
        "osc" => LiveCommand::Event(InteractionEvent::Oscillation),
        "chaos" => LiveCommand::Chaos,
        "focus" => LiveCommand::Focus,
        "app" if !rest.is_empty() => LiveCommand::App(rest.to_string()),
        "mode" => LiveCommand::Mode(rest.parse()?),
        "stop" => LiveCommand::StopMode,
        "say" => LiveCommand::Say(rest.to_string()),
        "quit" | "exit" => LiveCommand::Quit,
        other => {
            return Err(FlowCliError::InvalidArgument(format!(
                "unknown command '{other}'"
            )))
        }
    };
    Ok(Some(command))
}

async fn cmd_live(config: Option<&Path>) -> Result<(), FlowCliError> {
    let config = load_config(config)?;
    let driver = LiveDriver::spawn(FlowDashboard::new(&config));
    let handle = driver.handle();

    let mut rx = handle.subscribe();
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            println!("{}", live_line(&snapshot));
        }
    });

    if atty::is(atty::Stream::Stdin) {
        eprintln!("commands: switch | tab | osc | chaos | focus | app <name> | mode <id> | stop | say <text> | quit");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_live_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", CliError::from(e).message);
                continue;
            }
        };
        match command {
            LiveCommand::Event(event) => {
                handle.update(|d| d.record(event));
            }
            LiveCommand::Chaos => {
                handle.update(|d| d.start_chaos_burst());
            }
            LiveCommand::Focus => {
                handle.update(|d| d.start_focus_burst());
            }
            LiveCommand::App(app) => {
                handle.update(|d| d.focus_app(&app));
            }
            LiveCommand::Mode(mode) => {
                handle.update(|d| d.start_mode(mode));
            }
            LiveCommand::StopMode => {
                handle.update(|d| d.stop_mode());
            }
            LiveCommand::Say(text) => {
                if let Some(Some(command)) = handle.update(|d| d.handle_voice(&text)) {
                    eprintln!("voice: {}", command.action);
                }
            }
            LiveCommand::Quit => break,
        }
    }

    driver.shutdown().await;
    drop(handle);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "snapshot printer failed");
    }
    Ok(())
}

fn live_line(snapshot: &DashboardSnapshot) -> String {
    let mut line = format!(
        "[{:>7.1}s] IVI {:>3} {:<10} | app {} tab {} osc {}",
        snapshot.at_ms as f64 / 1000.0,
        snapshot.ivi.score,
        snapshot.ivi.state.label(),
        snapshot.ivi.counters.app_switches,
        snapshot.ivi.counters.tab_churn,
        snapshot.ivi.counters.oscillations,
    );
    if snapshot.mode != FocusMode::None {
        line.push_str(&format!(" | {}", snapshot.mode_label));
        if snapshot.remaining_secs > 0 {
            line.push_str(&format!(" {}", format_countdown(snapshot.remaining_secs)));
        }
    }
    if let Some(alert) = &snapshot.policy.alert {
        line.push_str(&format!(" | ⚠ {} {}", alert.title(), alert.detail()));
    }
    line
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), FlowCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "flowshield_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("FlowShield version {}", FLOWSHIELD_VERSION),
    });

    let mut config = FlowConfig::default();
    if let Some(path) = config_path {
        match FlowConfig::load(path) {
            Ok(loaded) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Configuration valid ({})", path.display()),
                });
                config = loaded;
            }
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            }),
        }
    }
    config.apply_env();

    let has_key = config.coach.api_key.is_some();
    let has_proxy = config.coach.proxy_url.is_some();
    checks.push(DoctorCheck {
        name: "coach_credentials".to_string(),
        status: match (has_key, has_proxy) {
            (true, _) => CheckStatus::Ok,
            (false, true) => CheckStatus::Warning,
            (false, false) => CheckStatus::Error,
        },
        message: match (has_key, has_proxy) {
            (true, _) => format!("{} is set", ENV_API_KEY),
            (false, true) => format!(
                "{} not set; relying on the coach proxy for answers",
                ENV_API_KEY
            ),
            (false, false) => format!("Neither {} nor {} is set", ENV_API_KEY, ENV_PROXY_URL),
        },
    });

    checks.push(DoctorCheck {
        name: "coach_model".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "{} (max_tokens {}, temperature {})",
            config.coach.model, config.coach.max_tokens, config.coach.temperature
        ),
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive live mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (scripted live mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FLOWSHIELD_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("FlowShield Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(FlowCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum FlowCliError {
    Io(io::Error),
    Flow(FlowError),
    Json(serde_json::Error),
    Coach(String),
    EmptyScript,
    NoSamples,
    DoctorFailed,
    InvalidArgument(String),
}

impl From<io::Error> for FlowCliError {
    fn from(e: io::Error) -> Self {
        FlowCliError::Io(e)
    }
}

impl From<FlowError> for FlowCliError {
    fn from(e: FlowError) -> Self {
        FlowCliError::Flow(e)
    }
}

impl From<serde_json::Error> for FlowCliError {
    fn from(e: serde_json::Error) -> Self {
        FlowCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FlowCliError> for CliError {
    fn from(e: FlowCliError) -> Self {
        match e {
            FlowCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FlowCliError::Flow(FlowError::InvalidScript(msg)) => CliError {
                code: "SCRIPT_ERROR".to_string(),
                message: msg,
                hint: Some("Each line needs at_ms and an event tag, in time order".to_string()),
            },
            FlowCliError::Flow(FlowError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'flowshield doctor --config <file>' for details".to_string()),
            },
            FlowCliError::Flow(FlowError::UnknownMode(mode)) => CliError {
                code: "UNKNOWN_MODE".to_string(),
                message: format!("Unknown focus mode: {}", mode),
                hint: Some("Use deep25, deep45, deep90, collaboration, or reactive".to_string()),
            },
            FlowCliError::Flow(e) => CliError {
                code: "FLOW_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            FlowCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FlowCliError::Coach(msg) => CliError {
                code: "COACH_ERROR".to_string(),
                message: msg,
                hint: Some(format!("Set {} or {}", ENV_API_KEY, ENV_PROXY_URL)),
            },
            FlowCliError::EmptyScript => CliError {
                code: "NO_EVENTS".to_string(),
                message: "Nothing to simulate".to_string(),
                hint: Some("Provide a non-empty script or --until-ms".to_string()),
            },
            FlowCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No IVI samples to summarize".to_string(),
                hint: None,
            },
            FlowCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            FlowCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: None,
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
