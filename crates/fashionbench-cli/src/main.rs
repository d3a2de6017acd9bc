//! fashionbench CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fashionbench",
    version,
    about = "Fashion-domain LLM benchmark: scores model answers against curated datasets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark suite
    Run {
        /// Model to evaluate: "simulated", "provider/model", or a model of the default provider
        #[arg(long)]
        model: Option<String>,

        /// Tasks to run (comma-separated, default: all)
        #[arg(long)]
        task: Option<String>,

        /// Directory of <task>.jsonl datasets
        #[arg(long)]
        datasets: Option<PathBuf>,

        /// Re-score the answers recorded in an earlier JSON report
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Max concurrent responder calls
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, md, all (comma-separated)
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print every scored example
        #[arg(long, short)]
        verbose: bool,
    },

    /// Compare two suite reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold
        #[arg(long, default_value = "0.05")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate dataset files
    Validate {
        /// Path to a <task>.jsonl file or a directory of them
        #[arg(long, default_value = "datasets")]
        datasets: PathBuf,
    },

    /// List the benchmark tasks
    ListTasks,

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample dataset
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_directive = match &cli.command {
        Commands::Run { verbose: true, .. } => "fashionbench=debug",
        _ => "fashionbench=info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            model,
            task,
            datasets,
            replay,
            parallelism,
            output,
            format,
            config,
            verbose,
        } => {
            commands::run::execute(commands::run::RunArgs {
                model,
                task,
                datasets,
                replay,
                parallelism,
                output,
                format,
                config,
                verbose,
            })
            .await
        }
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { datasets } => commands::validate::execute(datasets),
        Commands::ListTasks => commands::list_tasks::execute(),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
