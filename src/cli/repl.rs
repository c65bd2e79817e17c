//! Interactive REPL for deepbrowse
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};

use crate::agent::Agent;
use crate::cli::commands::{handle_command, render_result, CommandResult};
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Agent,
}

impl Repl {
    /// Create a new REPL with the loaded configuration
    pub fn new() -> Self {
        Self::with_config(Config::load())
    }

    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            agent: Agent::with_config(config),
        }
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        print!("Initializing...");
        io::stdout().flush()?;
        self.agent.initialize().await?;
        match self.agent.oracle_name() {
            Some(name) => println!(" Ready ({} oracle).\n", name),
            None => println!(" Ready (fallback plan, no oracle).\n"),
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("Ask: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.agent).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::Continue(prompt)) => {
                    println!(
                        "\nBrowsing (up to {}s)...",
                        self.agent.config().session.time_limit_secs
                    );
                    let result = self.agent.ask_default(&prompt).await;
                    println!("\n{}\n", render_result(&result));
                }
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        self.agent.close();
        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.agent.config();

        println!();
        println!("deepbrowse - ask a question, browse the web, get a summary");
        println!("-----------------------------------------------------------");
        println!("Ollama:     {}", config.ollama_url());
        println!("Model:      {}", config.oracle.model);
        println!("Time limit: {}s", config.session.time_limit_secs);
        println!();
        println!("Commands: help, summary, history, status, exit");
        println!("-----------------------------------------------------------");
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
