use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use lora_node::{run as run_action, ManagerAction, ManagerParams};
use lora_registry::Registry;

mod server;

#[derive(Parser)]
#[command(name = "auto-lora")]
#[command(about = "Trigger-word driven automatic LoRA mapping", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the mapping config document
    #[arg(long, global = true, default_value = "config/lora_mapping.json")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the admin HTTP surface
    Serve(ServeArgs),

    /// List the registered LoRA mappings
    List,

    /// Register a new trigger-word mapping
    Add(AddArgs),

    /// Remove a mapping by trigger word
    Remove(RemoveArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Port for the admin HTTP surface
    #[arg(long, default_value_t = 8765)]
    port: u16,

    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

#[derive(Args)]
struct AddArgs {
    /// Trigger word whose presence selects this mapping
    trigger_word: String,

    /// LoRA file name the trigger maps to
    lora_file: String,

    /// Strength applied when this mapping matches
    #[arg(long, default_value_t = 1.0)]
    strength: f32,

    /// Optional free-text description
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Args)]
struct RemoveArgs {
    /// Trigger word to remove
    trigger_word: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let registry = Registry::load(&cli.config);

    match cli.command {
        Commands::Serve(args) => {
            server::serve(registry, &args.bind, args.port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::List => Ok(run_one_shot(
            registry,
            ManagerAction::List,
            ManagerParams::default(),
        )),
        Commands::Add(args) => Ok(run_one_shot(
            registry,
            ManagerAction::Add,
            ManagerParams {
                trigger_word: args.trigger_word,
                lora_file: args.lora_file,
                strength: args.strength,
                description: args.description,
            },
        )),
        Commands::Remove(args) => Ok(run_one_shot(
            registry,
            ManagerAction::Remove,
            ManagerParams {
                trigger_word: args.trigger_word,
                ..ManagerParams::default()
            },
        )),
    }
}

fn run_one_shot(mut registry: Registry, action: ManagerAction, params: ManagerParams) -> ExitCode {
    let outcome = run_action(&mut registry, action, &params);
    println!("{}", outcome.message);
    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
