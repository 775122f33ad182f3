//! itemal CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use itemal_core::config::Format;

mod commands;

#[derive(Parser)]
#[command(
    name = "itemal",
    version,
    about = "Statistical analyses of multiple-choice responses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze exams and write the reports
    Analyze {
        /// Input file, "-" for stdin (repeatable, default: stdin)
        #[arg(short, long = "input", value_name = "FILE|-")]
        inputs: Vec<String>,

        /// Output file, "-" for stdout (repeatable; the last one receives any remaining analyses)
        #[arg(short, long = "output", value_name = "FILE|-")]
        outputs: Vec<String>,

        /// Format to read and write: legacy, json, json-pretty, yaml
        #[arg(short, long)]
        format: Option<Format>,

        /// Append to output files instead of overwriting them
        #[arg(short, long)]
        append: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check an input file and report its shape and data warnings
    Validate {
        /// Input file, "-" for stdin
        #[arg(short, long, value_name = "FILE|-")]
        input: String,

        /// Input format: legacy, json, json-pretty, yaml
        #[arg(short, long)]
        format: Option<Format>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and example exam
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "itemal=info"
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
            ),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            inputs,
            outputs,
            format,
            append,
            config,
        } => commands::analyze::execute(inputs, outputs, format, append, config),
        Commands::Validate {
            input,
            format,
            config,
        } => commands::validate::execute(input, format, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
