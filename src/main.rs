//! deepbrowse - ask a question, browse the web, get a summary
//!
//! Main entry point for the CLI application.

use std::time::Duration;

use clap::Parser;
use deepbrowse::{render_result, Agent, Config, Repl};
use tracing_subscriber::EnvFilter;

/// deepbrowse - autonomous web browsing agent
#[derive(Parser, Debug)]
#[command(name = "deepbrowse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Time limit per question, in seconds
    #[arg(long, short = 't')]
    time_limit: Option<u64>,

    /// Never use the Ollama oracle; follow the fallback plan
    #[arg(long)]
    no_oracle: bool,

    /// Ollama model used as the decision oracle
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Print the result as JSON (single prompt mode)
    #[arg(long)]
    json: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deepbrowse={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(secs) = args.time_limit {
        config.session.time_limit_secs = secs;
    }

    if let Some(ref model) = args.model {
        config.oracle.model = model.clone();
    }

    if args.no_oracle {
        config.oracle.enabled = false;
    }

    if args.debug {
        config.agent.debug = true;
    }

    init_tracing(config.agent.debug);

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let time_limit = Duration::from_secs(config.session.time_limit_secs);
        let mut agent = Agent::with_config(config);
        agent.initialize().await?;

        let result = agent.ask(&prompt, time_limit).await;
        agent.close();

        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{}", render_result(&result));
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config);
    repl.run().await?;

    Ok(())
}
