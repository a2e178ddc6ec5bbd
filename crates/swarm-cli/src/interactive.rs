//! Interactive prompts for the add and remove commands.
//!
//! Uses dialoguer for terminal UI prompts.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

use swarm_core::types::{ServerConfig, ServerMap};
use swarm_core::validate::validate_new_name;

/// Asks for a name when a single server object is added without one.
pub struct NamePrompt<'a, W: Write = io::Stdout> {
    /// Servers the new name must not collide with
    existing: &'a ServerMap,
    /// Output writer (for testing)
    writer: W,
    theme: ColorfulTheme,
}

impl<'a> NamePrompt<'a, io::Stdout> {
    pub fn new(existing: &'a ServerMap) -> Self {
        Self {
            existing,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<'a, W: Write> NamePrompt<'a, W> {
    #[cfg(test)]
    pub fn with_writer(existing: &'a ServerMap, writer: W) -> Self {
        Self {
            existing,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Return a valid name for `config`.
    ///
    /// A prefilled name is validated and used as is; otherwise the user is
    /// asked until the name passes validation.
    pub fn collect(&mut self, config: &ServerConfig, prefilled: Option<String>) -> Result<String> {
        if let Some(name) = prefilled {
            let name = name.trim().to_string();
            validate_new_name(&name, self.existing)?;
            return Ok(name);
        }

        self.print_summary(config)?;

        let existing = self.existing;
        let name: String = Input::with_theme(&self.theme)
            .with_prompt("Server name")
            .validate_with(|input: &String| -> Result<(), String> {
                validate_new_name(input.trim(), existing).map_err(|e| e.to_string())
            })
            .interact_text()?;

        Ok(name.trim().to_string())
    }

    fn print_summary(&mut self, config: &ServerConfig) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  New MCP server").bold().cyan())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(
            self.writer,
            "  Command:  {}",
            style(&config.command).green()
        )?;
        if !config.args.is_empty() {
            writeln!(
                self.writer,
                "  Args:     {}",
                style(config.args.join(" ")).green()
            )?;
        }
        if let Some(env) = &config.env
            && !env.is_empty()
        {
            let keys: Vec<_> = env.keys().map(String::as_str).collect();
            writeln!(self.writer, "  Env:      {}", style(keys.join(", ")).green())?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

/// Ask before removing a server.
pub fn confirm_removal(name: &str) -> Result<bool> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Remove MCP server '{}'?", name))
        .default(false)
        .interact()?;
    Ok(confirmed)
}
