use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use taskflow_rs::taskflow::workflow::builder::{Builder, Workflow};
use taskflow_rs::taskflow::workflow::registry::FunctionRegistry;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a workflow from a file
    Run {
        /// Path to the workflow file
        #[arg(short, long)]
        file: String,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the execution order of a workflow
    Order {
        /// Path to the workflow file
        #[arg(short, long)]
        file: String,
    },
    /// Print the graph snapshot of a workflow as JSON
    Status {
        /// Path to the workflow file
        #[arg(short, long)]
        file: String,
    },
    /// Check that a workflow file builds
    Validate {
        /// Path to the workflow file
        #[arg(short, long)]
        file: String,
    },
}

async fn build(file: &str) -> anyhow::Result<Workflow> {
    // No callables are linked into the binary; function tasks need a library caller
    let builder = Builder::new(FunctionRegistry::new());
    builder
        .build_workflow(file)
        .await
        .with_context(|| format!("Failed to build workflow from {}", file))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Run { file, json } => {
            let workflow = build(&file).await?;
            println!("Running workflow: {}", workflow.name);

            let report = workflow.graph.run().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for row in workflow.graph.status_table() {
                    println!("{:<30} {}", row.name, row.status);
                }
                if !report.skipped.is_empty() {
                    println!("Skipped: {}", report.skipped.join(", "));
                }
            }

            if !report.is_success() {
                anyhow::bail!(
                    "{} task(s) failed, {} skipped",
                    report.failed.len(),
                    report.skipped.len()
                );
            }
        }
        Commands::Order { file } => {
            let workflow = build(&file).await?;
            for (i, name) in workflow.graph.order_names()?.iter().enumerate() {
                println!("{:>3}. {}", i + 1, name);
            }
        }
        Commands::Status { file } => {
            let workflow = build(&file).await?;
            println!("{}", serde_json::to_string_pretty(&workflow.graph.snapshot()?)?);
        }
        Commands::Validate { file } => {
            let workflow = build(&file).await?;
            log::info!("Workflow '{}' is valid", workflow.name);
            println!(
                "{}: {} tasks, {} dependencies",
                workflow.name,
                workflow.graph.len(),
                workflow.graph.edges().len()
            );
        }
    }

    Ok(())
}
