//! maestro CLI binary: chat with the planner front end, or run the agents once on a requirement.
//!
//! Subcommands: `chat` (default, interactive) and `run <requirement|->`.

mod log_format;
mod logging;
mod repl;

use clap::{Parser, Subcommand};
use cli::{build_conversation, build_run, drive, format_outcome_json, format_progress, load_config, Overrides, RunError};
use tokio::io::AsyncReadExt;

#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(about = "maestro: a planner that dispatches search, scraping and retrieval agents")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Verbose: debug-level logs (node enter/exit, routing decisions)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Maximum node executions per workflow run (default 50 or MAESTRO_RECURSION_LIMIT)
    #[arg(long, value_name = "N", global = true)]
    recursion_limit: Option<usize>,

    /// Model backend: openai or anthropic (default MAESTRO_PROVIDER, else openai)
    #[arg(long, value_name = "NAME", global = true)]
    provider: Option<String>,

    /// Model for the planner and the chat front end
    #[arg(long, value_name = "MODEL", global = true)]
    planner_model: Option<String>,

    /// Model the workers use to fill in tool parameters
    #[arg(long, value_name = "MODEL", global = true)]
    worker_model: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Interactive chat; `/end` hands the agreed requirements to the agents
    Chat,
    /// Run the agents once on a requirement (`-` reads it from stdin)
    Run(RunArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct RunArgs {
    /// Requirement text, or `-` for stdin
    #[arg(trailing_var_arg = true, required = true)]
    requirement: Vec<String>,

    /// Print the outcome as one JSON object
    #[arg(long)]
    json: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider.clone(),
            planner_model: self.planner_model.clone(),
            worker_model: self.worker_model.clone(),
            recursion_limit: self.recursion_limit,
        }
    }
}

async fn read_requirement(parts: &[String]) -> Result<String, RunError> {
    if parts.len() == 1 && parts[0] == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }
    Ok(parts.join(" "))
}

/// Returns whether the run finished without error.
async fn run_once(args: &RunArgs, overrides: &Overrides) -> Result<bool, RunError> {
    let cfg = load_config(overrides)?;
    let requirement = read_requirement(&args.requirement).await?;
    let workflow = build_run(&cfg, &requirement)?;

    let mut progress = Vec::new();
    let outcome = drive(&workflow, |line| {
        if !args.json {
            eprintln!("{}", format_progress(line));
        }
        progress.push(line.to_string());
    })
    .await?;

    if args.json {
        println!("{}", format_outcome_json(requirement.trim(), &progress, &outcome));
    } else {
        println!("{}", outcome.final_message);
    }
    if let Err(e) = &outcome.result {
        eprintln!("maestro: the agents stopped early: {}", e);
    }
    Ok(outcome.result.is_ok())
}

async fn chat(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = load_config(overrides)?;
    let mut conversation = build_conversation(&cfg);
    repl::run_repl_loop(&mut conversation).await
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_and_apply(cli::APP_NAME, None) {
        eprintln!("maestro: {}", e);
    }
    let args = Args::parse();
    let _log_guard = match logging::init(args.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("maestro: logging: {}", e);
            std::process::exit(1);
        }
    };

    let overrides = args.overrides();
    let ok = match args.cmd.clone().unwrap_or(Command::Chat) {
        Command::Run(run_args) => match run_once(&run_args, &overrides).await {
            Ok(ok) => ok,
            Err(e) => {
                eprintln!("maestro: {}", e);
                false
            }
        },
        Command::Chat => match chat(&overrides).await {
            Ok(()) => true,
            Err(e) => {
                eprintln!("maestro: {}", e);
                false
            }
        },
    };
    if !ok {
        std::process::exit(1);
    }
}
