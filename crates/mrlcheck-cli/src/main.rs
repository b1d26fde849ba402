mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "mrlcheck",
    version,
    about = "Export-compliance check of pesticide residues against Maximum Residue Limits"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one detected value against one MRL
    Score {
        /// Detected value, lab notation accepted ("0,002", "< 0.01", "nd")
        detected: String,

        /// Applicable MRL in mg/kg
        mrl: String,

        /// Unit of the detected value
        #[arg(short, long, default_value = "mg/kg")]
        unit: String,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Evaluate a lot file (substances, lookup matches and extracted rows)
    Evaluate {
        /// Path to the lot JSON file
        input_file: PathBuf,

        /// JSON options file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Substance name matching: exact or normalized
        #[arg(short = 'm', long = "match", value_name = "MODE")]
        matching: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Show per-substance reasoning
        #[arg(long)]
        verbose: bool,
    },
    /// Normalize a raw OCR extraction payload into report rows
    Extract {
        /// Path to the raw extraction JSON (a Markdown code fence is tolerated)
        input_file: PathBuf,

        /// JSON options file (validation_confidence sets which rows need checking)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect the built-in product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List known products with their EU codes
    List,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mrlcheck=warn,mrlcheck_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            detected,
            mrl,
            unit,
            output,
        } => commands::score::run(&detected, &mrl, &unit, &output),
        Commands::Evaluate {
            input_file,
            config,
            matching,
            output,
            verbose,
        } => commands::evaluate::run(input_file, config, matching, &output, verbose),
        Commands::Extract {
            input_file,
            config,
            output,
        } => commands::extract::run(input_file, config, &output),
        Commands::Products { action } => match action {
            ProductsAction::List => commands::products::list(),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
