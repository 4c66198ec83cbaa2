// Vertebra Command Line Interface
// Loads a device manifest and queries it the way a dashboard would

mod manifest;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use manifest::{Device, Manifest};
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vertebra_actions::{ActionCall, ActionOutcome};
use vertebra_core::{queries, QueryRequest, Session, VertebraConfig};

#[derive(Parser)]
#[command(name = "vertebra")]
#[command(about = "Inspect the components and actions of a vertebra device", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Device manifest (TOML)
    #[arg(long, short, global = true, default_value = "device.toml")]
    manifest: PathBuf,

    /// Configuration file (JSON or TOML); VERTEBRA_* variables override it
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show component info answers
    Info {
        /// Only this component
        #[arg(long)]
        component: Option<String>,

        /// Ask as a session in these groups (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
    },

    /// Show the components placed in a dashboard section
    Links {
        #[arg(long)]
        dashboard: String,

        #[arg(long)]
        section: String,

        /// Ask as a session in these groups (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
    },

    /// List actions and pending bindings
    Actions,

    /// Invoke an action
    Invoke {
        action: String,

        /// JSON argument (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<VertebraConfig> {
    let mut config = match path {
        Some(path) => VertebraConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => VertebraConfig::default(),
    };
    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn request_for(args: Vec<JsonValue>, groups: Vec<String>) -> QueryRequest {
    let request = QueryRequest::new(args);
    if groups.is_empty() {
        request
    } else {
        request.with_session(Session::new(groups))
    }
}

fn print_json(value: &JsonValue) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_logging(&config.logging.level);

    let manifest = Manifest::from_file(&cli.manifest)?;
    let device = Device::build(manifest, &config)?;
    debug!("Manifest loaded from {}", cli.manifest.display());

    match cli.command {
        Commands::Info { component, groups } => {
            let args = component.map(JsonValue::String).into_iter().collect();
            let answers = device
                .spine
                .send_query(queries::GET_COMPONENT_INFO, &request_for(args, groups));
            print_json(&JsonValue::Array(answers))?;
        }
        Commands::Links {
            dashboard,
            section,
            groups,
        } => {
            let args = vec![JsonValue::String(dashboard), JsonValue::String(section)];
            let answers = device
                .spine
                .send_query(queries::GET_DASHBOARD_COMPONENTS, &request_for(args, groups));
            // One list per answering component; flatten for display.
            let links: Vec<JsonValue> = answers
                .into_iter()
                .flat_map(|answer| match answer {
                    JsonValue::Array(items) => items,
                    other => vec![other],
                })
                .collect();
            print_json(&JsonValue::Array(links))?;
        }
        Commands::Actions => {
            let handlers: Vec<JsonValue> = device
                .actions
                .unbound_handlers()
                .into_iter()
                .map(|(handler, pending)| {
                    json!({
                        "handler": handler,
                        "actionId": pending.action_id,
                        "name": pending.name,
                    })
                })
                .collect();
            let interrupts: Vec<JsonValue> = device
                .actions
                .unbound_interrupts()
                .into_iter()
                .map(|(interrupt, action_id)| json!({ "interrupt": interrupt, "actionId": action_id }))
                .collect();

            print_json(&json!({
                "actions": device.actions.snapshot(),
                "unboundHandlers": handlers,
                "unboundInterrupts": interrupts,
            }))?;
        }
        Commands::Invoke { action, args } => {
            let args = args
                .iter()
                .map(|raw| {
                    serde_json::from_str(raw)
                        .with_context(|| format!("Argument is not valid JSON: {}", raw))
                })
                .collect::<Result<Vec<JsonValue>>>()?;

            let handle = device
                .actions
                .get(&action)
                .with_context(|| format!("Unknown action '{}'", action))?;

            let outcome = handle
                .execute(ActionCall::new(args))
                .with_context(|| format!("Action '{}' failed", action))?;

            let report = match outcome {
                ActionOutcome::Completed(value) => json!({ "completed": value }),
                ActionOutcome::Deferred { queued } => json!({ "deferred": queued }),
            };
            print_json(&report)?;
        }
    }

    Ok(())
}
