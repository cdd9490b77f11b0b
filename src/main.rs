mod cli;
mod error;
mod inference;
mod model;
mod oauth;
mod rephrase;
mod server;
mod slack;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::CliArgs;
use error::Result;
use rephrase::{Rephraser, Tone};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

/// Rephrases a single message against the configured model and prints it.
async fn run_once(args: &CliArgs, tone: Tone, text: &str) -> Result<()> {
    let model = args.model();
    let client = inference::BedrockClient::new(&args.bedrock_config()).await;
    let rephraser = Rephraser::new(model, Arc::new(client));

    tracing::info!(model = model.id, %tone, "rephrasing message");
    let rephrased = rephraser
        .rephrase(tone, text)
        .await
        .context("rephrasing message")?;
    println!("{rephrased}");

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = CliArgs::parse();

    let result = match (args.tone, args.text.as_deref()) {
        (Some(tone), Some(text)) => run_once(&args, tone, text).await,
        _ => server::run_relay_server(&args).await,
    };

    if let Err(error) = result {
        tracing::error!("{error:?}");
        std::process::exit(1);
    }
}
