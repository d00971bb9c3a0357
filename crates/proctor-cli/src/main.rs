//! proctor CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "proctor", version, about = "Timed exam session harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate exam paper TOML files
    Validate {
        /// Path to a paper file or directory
        #[arg(long)]
        paper: PathBuf,
    },

    /// Show a paper's sections and questions
    Preview {
        /// Path to a paper file
        #[arg(long)]
        paper: PathBuf,
    },

    /// Play a scripted attempt against a paper
    Rehearse {
        /// Path to a paper file
        #[arg(long)]
        paper: PathBuf,

        /// Path to an attempt script
        #[arg(long)]
        script: PathBuf,

        /// Wall-clock milliseconds per session second
        #[arg(long, default_value = "1000")]
        tick_ms: u64,

        /// Output directory for attempt reports
        #[arg(long, default_value = "./proctor-results")]
        output: PathBuf,

        /// Submit to the configured portal instead of the dry-run sink
        #[arg(long)]
        live: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config, example paper, and example script
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("proctor=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { paper } => commands::validate::execute(paper),
        Commands::Preview { paper } => commands::preview::execute(paper),
        Commands::Rehearse {
            paper,
            script,
            tick_ms,
            output,
            live,
            config,
        } => commands::rehearse::execute(paper, script, tick_ms, output, live, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
