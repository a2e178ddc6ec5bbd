//! swarm-mcp - MCP server configuration for CodeAgentSwarm
//!
//! Usage:
//!   swarm-mcp list                 # Show configured servers
//!   swarm-mcp add '<json>'         # Add servers from JSON text or @file
//!   swarm-mcp disable <name>       # Disable a server without removing it
//!   swarm-mcp export               # Print the mcpServers mapping

mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swarm_core::config::Settings;
use swarm_core::error::ValidationResult;
use swarm_core::host::FileHost;
use swarm_core::manager::{AddOutcome, McpManager, OperationReport};
use swarm_core::types::{ServerEntry, ServerMap};
use swarm_core::validate::ValidatedConfig;

use crate::interactive::{NamePrompt, confirm_removal};

#[derive(Parser)]
#[command(name = "swarm-mcp")]
#[command(about = "MCP server configuration for CodeAgentSwarm", long_about = None)]
struct Cli {
    /// JSON config file holding `mcpServers` (overrides settings.toml)
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured MCP servers
    #[command(alias = "ls")]
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one server, with secrets in `env` masked
    Show {
        /// Server name
        name: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Add servers from JSON
    ///
    /// Accepts either `{"mcpServers": {"name": {...}}}` or a single server
    /// object `{"command": ...}`. A single server needs a name, given with
    /// --name or prompted for.
    Add {
        /// JSON text, or @path to read it from a file
        input: String,
        /// Name for a single server object
        #[arg(long, short)]
        name: Option<String>,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Replace a server's configuration, keeping its enabled state
    Update {
        /// Server name
        name: String,
        /// JSON server object, or @path to read it from a file
        input: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove a server
    #[command(alias = "rm")]
    Remove {
        /// Server name
        name: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Enable a disabled server
    Enable {
        /// Server name
        name: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Disable a server without removing it
    Disable {
        /// Server name
        name: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print all visible servers as an `mcpServers` document
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Check JSON input without saving anything
    Validate {
        /// JSON text, or @path to read it from a file
        input: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// No output; the exit code reports failure
    Quiet,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swarm=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load_default()?;
    if let Some(path) = cli.config {
        settings.config_file = Some(path);
    }
    let config_file = settings.resolve_config_file()?;
    tracing::debug!(path = %config_file.display(), "Using MCP config file");

    let mut manager = McpManager::with_settings(Arc::new(FileHost::new(config_file)), &settings);
    manager.initialize().await?;

    match cli.command {
        Commands::List { format } => print_servers(manager.get_all_servers(), format)?,
        Commands::Show { name, format } => {
            let entry = manager
                .get_sanitized_server(&name)
                .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", name))?;
            print_server(&name, &entry, format)?;
        }
        Commands::Add {
            input,
            name,
            format,
        } => run_add(&mut manager, &input, name, format).await?,
        Commands::Update {
            name,
            input,
            format,
        } => {
            let config: Value = serde_json::from_str(&read_input(&input)?)
                .context("Failed to parse server JSON")?;
            let result = manager.update_server(&name, &config).await;
            report("Updated", &name, &result, format)?;
            result?;
        }
        Commands::Remove { name, yes, format } => {
            if !yes && !confirm_removal(&name)? {
                if let Some(message) = cancelled_removal(&name, format)? {
                    println!("{message}");
                }
                return Ok(());
            }
            let result = manager.remove_server(&name).await;
            report("Removed", &name, &result, format)?;
            result?;
        }
        Commands::Enable { name, format } => {
            let result = manager.toggle_server(&name, true).await;
            report("Enabled", &name, &result, format)?;
            result?;
        }
        Commands::Disable { name, format } => {
            let result = manager.toggle_server(&name, false).await;
            report("Disabled", &name, &result, format)?;
            result?;
        }
        Commands::Export { output } => {
            let exported = manager.export_configuration();
            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{exported}\n"))
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "Exported {} server(s) to {}",
                        manager.get_all_servers().len(),
                        path.display()
                    );
                }
                None => println!("{exported}"),
            }
        }
        Commands::Validate { input, format } => {
            let text = read_input(&input)?;
            let result = manager.validate_configuration(&text);
            match format {
                OutputFormat::Table => println!("{}", validation_summary(&result)),
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "valid": result.is_ok(),
                        "needsName": result.as_ref().map(ValidatedConfig::needs_name).unwrap_or(false),
                        "error": result.as_ref().err().map(ToString::to_string),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Quiet => {}
            }
            result?;
        }
    }

    Ok(())
}

async fn run_add(
    manager: &mut McpManager,
    input: &str,
    name: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let text = read_input(input)?;
    let added = match manager.add_servers(&text).await? {
        AddOutcome::Added(added) => added,
        AddOutcome::NeedsName(config) => {
            let name = NamePrompt::new(manager.get_all_servers()).collect(&config, name)?;
            manager.add_named_server(&name, &config).await?
        }
    };

    match format {
        OutputFormat::Table => {
            for name in added.keys() {
                println!("✓ Added MCP server '{}'", name);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "success": true,
                "added": added.keys().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

/// Inline JSON, or the contents of a file when prefixed with `@`.
fn read_input(input: &str) -> Result<String> {
    match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path)),
        None => Ok(input.to_string()),
    }
}

/// One-line table output for `validate`.
fn validation_summary(result: &ValidationResult<ValidatedConfig>) -> String {
    match result {
        Ok(ValidatedConfig::Direct(config)) => format!(
            "✓ Valid server object (command: {}); a name is required",
            config.command
        ),
        Ok(ValidatedConfig::Wrapped(servers)) => {
            let names: Vec<_> = servers.keys().map(String::as_str).collect();
            format!("✓ Valid: {}", names.join(", "))
        }
        Err(e) => format!("✗ {e}"),
    }
}

/// Output for a removal the user declined, in the selected format.
fn cancelled_removal(name: &str, format: OutputFormat) -> Result<Option<String>> {
    Ok(match format {
        OutputFormat::Table => Some("Removal cancelled.".to_string()),
        OutputFormat::Json => Some(serde_json::to_string_pretty(&serde_json::json!({
            "success": false,
            "cancelled": true,
            "name": name,
        }))?),
        OutputFormat::Quiet => None,
    })
}

fn report<T>(
    verb: &str,
    name: &str,
    result: &swarm_core::error::Result<T>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if result.is_ok() {
                println!("✓ {} MCP server '{}'", verb, name);
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&OperationReport::from(result))?
            );
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn print_servers(servers: &ServerMap, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if servers.is_empty() {
                println!("No MCP servers configured.");
                println!("Add one with: swarm-mcp add '{{\"mcpServers\": {{...}}}}'");
                return Ok(());
            }

            println!("{:<24} {:<10} Command", "Name", "Status");
            println!("{}", "-".repeat(70));
            for (name, entry) in servers {
                println!(
                    "{:<24} {:<10} {}",
                    name,
                    status_label(entry),
                    command_line(entry)
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(servers)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn print_server(name: &str, entry: &ServerEntry, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", name);
            println!("  Status:  {}", status_label(entry));
            println!("  Command: {}", command_line(entry));
            if let Some(env) = &entry.config.env {
                println!("  Env:");
                for (key, value) in env {
                    println!("    {}={}", key, value);
                }
            }
            for (key, value) in &entry.config.extra {
                println!("  {}: {}", key, value);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entry)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn status_label(entry: &ServerEntry) -> &'static str {
    if entry.is_enabled() {
        "enabled"
    } else {
        "disabled"
    }
}

fn command_line(entry: &ServerEntry) -> String {
    std::iter::once(entry.config.command.as_str())
        .chain(entry.config.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
