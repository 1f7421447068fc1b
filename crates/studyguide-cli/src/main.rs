//! studyguide CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studyguide", version, about = "Until-mastery quiz over study-guide question banks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz in the terminal
    Quiz {
        /// Module to quiz on (e.g. "Module_1" or "Module_1.json")
        #[arg(long)]
        module: Option<String>,

        /// Number of questions, or "full" for the whole bank
        #[arg(long)]
        length: Option<String>,

        /// Seed for reproducible question order
        #[arg(long)]
        seed: Option<u64>,

        /// Directory holding the bank files
        #[arg(long, conflicts_with = "server")]
        data_dir: Option<PathBuf>,

        /// Study-tool server to fetch banks from
        #[arg(long)]
        server: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for saved summaries
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save the summary as: json, html, all
        #[arg(long)]
        format: Option<String>,
    },

    /// Check that bank files normalize cleanly
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// Treat numeric answer indices as 1-based
        #[arg(long)]
        one_based: bool,
    },

    /// List available modules
    Modules {
        /// Directory holding the bank files
        #[arg(long, conflicts_with = "server")]
        data_dir: Option<PathBuf>,

        /// Study-tool server to list modules from
        #[arg(long)]
        server: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and sample bank
    Init,
}

#[tokio::main]
async fn main() {
    let directive = match "studyguide=info".parse() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: invalid log directive: {e}");
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Quiz {
            module,
            length,
            seed,
            data_dir,
            server,
            config,
            output,
            format,
        } => {
            commands::quiz::execute(commands::quiz::QuizArgs {
                module,
                length,
                seed,
                data_dir,
                server,
                config,
                output,
                format,
            })
            .await
        }
        Commands::Validate { bank, one_based } => commands::validate::execute(bank, one_based),
        Commands::Modules {
            data_dir,
            server,
            config,
        } => commands::modules::execute(data_dir, server, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
