//! `phia`: ask questions about wearable health data through a ReAct agent.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod args;
mod repl;
mod setup;

use args::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phia=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let controller = setup::build_controller(&args)?;

    match &args.question {
        Some(question) => repl::answer(&controller, question, args.show_trajectory).await,
        None => repl::run(&controller, args.show_trajectory).await,
    }
}
