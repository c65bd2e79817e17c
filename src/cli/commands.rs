//! CLI commands
//!
//! Special commands that can be executed in the REPL, and the plain-text
//! rendering of a browse result.

use std::time::Duration;

use crate::agent::{Agent, BrowseResult};
use crate::core::{Config, Result, ToolCategory};
use crate::tools::ToolRegistry;

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Not a command: browse for this prompt
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, agent: &mut Agent) -> Result<CommandResult> {
    let input = input.trim();
    let (cmd, args) = match input.split_once(' ') {
        Some((cmd, args)) => (cmd.to_lowercase(), args.trim()),
        None => (input.to_lowercase(), ""),
    };

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "summary" => Ok(CommandResult::Handled(agent.get_summary())),

        "history" => Ok(CommandResult::Handled(history_text(agent))),

        "status" => Ok(CommandResult::Handled(status_text(agent))),

        "set" => Ok(handle_set_command(args, agent)),

        "oracle" => handle_oracle_command(args, agent).await,

        "config" => Ok(CommandResult::Handled(format!(
            "Config file: {}\n\n{}",
            Config::config_file().display(),
            toml::to_string_pretty(agent.config()).unwrap_or_else(|e| format!("# {}", e))
        ))),

        "save" => {
            let path = agent.save_config()?;
            Ok(CommandResult::Handled(format!("Configuration saved to {}", path.display())))
        }

        _ => {
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Handle 'set' subcommands
fn handle_set_command(args: &str, agent: &mut Agent) -> CommandResult {
    let (key, value) = match args.split_once(' ') {
        Some((key, value)) => (key.to_lowercase(), value.trim()),
        None => (args.to_lowercase(), ""),
    };

    match key.as_str() {
        "time" => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => {
                agent.set_time_limit(Duration::from_secs(secs));
                CommandResult::Handled(format!("Time limit set to {}s", secs))
            }
            _ => CommandResult::Handled(format!(
                "Current time limit: {}s. Usage: set time <seconds>",
                agent.config().session.time_limit_secs
            )),
        },

        "model" => {
            if value.is_empty() {
                return CommandResult::Handled(format!(
                    "Current model: {}",
                    agent.config().oracle.model
                ));
            }
            agent.set_model(value);
            CommandResult::Handled(format!(
                "Model set to: {} (run 'oracle on' to connect)",
                value
            ))
        }

        "" => CommandResult::Handled(
            "Usage: set <time|model> <value>\n\
             Examples:\n\
               set time 60\n\
               set model qwen3:8b"
                .to_string(),
        ),

        _ => CommandResult::Handled(format!(
            "Unknown setting: {}. Available: time, model",
            key
        )),
    }
}

async fn handle_oracle_command(args: &str, agent: &mut Agent) -> Result<CommandResult> {
    match args.to_lowercase().as_str() {
        "on" => {
            agent.set_oracle_enabled(true);
            agent.initialize().await?;
            Ok(CommandResult::Handled(match agent.oracle_name() {
                Some(name) => format!("Oracle: ON ({}, model {})", name, agent.config().oracle.model),
                None => format!(
                    "Oracle unavailable at {}; sessions use the fallback plan",
                    agent.config().ollama_url()
                ),
            }))
        }
        "off" => {
            agent.set_oracle_enabled(false);
            Ok(CommandResult::Handled("Oracle: OFF (fallback plan)".to_string()))
        }
        _ => Ok(CommandResult::Handled(format!(
            "Oracle: {}. Usage: oracle on|off",
            if agent.oracle_name().is_some() { "ON" } else { "OFF" }
        ))),
    }
}

fn history_text(agent: &Agent) -> String {
    let Some(result) = agent.last_result() else {
        return "No pages visited yet.".to_string();
    };
    if result.pages_visited.is_empty() {
        return format!("No pages visited for: {}", result.prompt);
    }

    let mut output = format!("Pages visited for: {}\n", result.prompt);
    for (i, visit) in result.pages_visited.iter().enumerate() {
        output.push_str(&format!(
            "  {}. [{}] {}\n     {}\n",
            i + 1,
            visit.http_status,
            visit.title,
            visit.url
        ));
    }
    output.trim_end().to_string()
}

fn status_text(agent: &Agent) -> String {
    let config = agent.config();
    format!(
        "deepbrowse status:\n\
         -----------------------------\n\
         Strategy:   {}\n\
         Model:      {}\n\
         Ollama:     {}\n\
         Time limit: {}s\n\
         Min pages:  {}\n\
         Requests:   {}\n\
         Debug:      {}\n\n\
         Oracle tools:\n{}",
        agent.strategy().name(),
        config.oracle.model,
        config.ollama_url(),
        config.session.time_limit_secs,
        config.session.min_pages,
        agent.navigation_history().len(),
        if config.agent.debug { "on" } else { "off" },
        tools_text(config)
    )
}

fn tools_text(config: &Config) -> String {
    let registry = ToolRegistry::new(config.distill.clone(), config.session.search_url.clone());
    [ToolCategory::Navigation, ToolCategory::Extraction]
        .into_iter()
        .map(|category| {
            let names: Vec<&str> = registry
                .definitions_by_category(category)
                .into_iter()
                .map(|def| def.name())
                .collect();
            format!("  {:<11} {}", format!("{}:", category), names.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable rendering of a browse result
pub fn render_result(result: &BrowseResult) -> String {
    let mut output = String::new();

    if let Some(answer) = &result.agent_result {
        output.push_str(&format!("Answer:\n{}\n\n", answer.trim()));
    }
    if let Some(summary) = &result.summary {
        output.push_str(summary);
        output.push('\n');
    }
    output.push_str(&format!(
        "\n{} page(s) visited, {} item(s) collected, {}",
        result.pages_visited.len(),
        result.data_collected.len(),
        if result.completed { "completed" } else { "not completed" }
    ));
    if let Some(error) = &result.error {
        output.push_str(&format!("\n{}", error));
    }
    output
}

/// Generate help text
fn help_text() -> String {
    r#"deepbrowse commands:
---------------------------------------------
  help, ?            Show this help message
  exit, quit, q      Exit deepbrowse
  summary            Show the summary of the last question
  history            List the pages visited for the last question
  status             Show the current settings
  config             Show the active configuration
  save               Save the active configuration

  set time <secs>    Set the time limit per question
  set model <name>   Set the Ollama model
  oracle on|off      Use the Ollama oracle or the fallback plan

Anything else is a question to browse the web for.
---------------------------------------------"#
        .to_string()
}
