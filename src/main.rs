//! Main entry point for the Lara CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lara_sdk::cli::commands::{self, Commands};
use lara_sdk::{LaraSettings, Translator};

/// Lara - translate text and documents from the command line
#[derive(Parser, Debug)]
#[command(name = "lara", version, about, long_about = None)]
struct Args {
    /// Settings file (TOML, YAML or JSON); LARA_* variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Access key ID (optional, defaults to LARA_ACCESS_KEY_ID env var)
    #[arg(long)]
    access_key_id: Option<String>,

    /// Access key secret (optional, defaults to LARA_ACCESS_KEY_SECRET env var)
    #[arg(long)]
    access_key_secret: Option<String>,

    /// API server URL
    #[arg(long)]
    server_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lara={0},lara_sdk={0}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = args.command else {
        println!("Please specify a command. Use --help for more information.");
        return Ok(());
    };

    let mut settings = LaraSettings::load(args.config.as_deref())?;
    if args.access_key_id.is_some() {
        settings.access_key_id = args.access_key_id;
    }
    if args.access_key_secret.is_some() {
        settings.access_key_secret = args.access_key_secret;
    }
    if args.server_url.is_some() {
        settings.server_url = args.server_url;
    }

    let translator = Translator::new(&settings.credentials()?, &settings.client_options())?;

    match command {
        Commands::Languages => commands::handle_languages(&translator).await?,
        Commands::Translate {
            text,
            target,
            source,
            adapt_to,
            glossary,
            instruction,
            style,
            no_trace,
        } => {
            commands::handle_translate(
                &translator,
                text,
                target,
                source,
                adapt_to,
                glossary,
                instruction,
                style,
                no_trace,
            )
            .await?
        }
        Commands::Document {
            file,
            output,
            target,
            source,
            output_format,
            glossary,
            style,
            max_wait_secs,
        } => {
            commands::handle_document(
                &translator,
                file,
                output,
                target,
                source,
                output_format,
                glossary,
                style,
                max_wait_secs,
            )
            .await?
        }
        Commands::MemoryImport { memory, file, gzip } => {
            commands::handle_memory_import(&translator, memory, file, gzip).await?
        }
        Commands::GlossaryImport {
            glossary,
            file,
            gzip,
        } => commands::handle_glossary_import(&translator, glossary, file, gzip).await?,
        Commands::GlossaryExport {
            glossary,
            output,
            content_type,
            source,
        } => {
            commands::handle_glossary_export(&translator, glossary, output, content_type, source)
                .await?
        }
    }

    Ok(())
}
