//! courier – HTML → PDF conversion service.
//!
//! Usage:
//!   courier [serve] [--host H] [--port P] [--max-body-bytes N]
//!   courier convert <input.html> [output.pdf] [--page-size S] [--landscape]
//!   courier smoke [BASE_URL]
//!
//! Without a subcommand the HTTP service starts with its defaults.

use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;

use pdf_courier::config::{Cli, Command, ConvertArgs, ServeArgs, SmokeArgs};
use pdf_courier::engine::FlowEngine;
use pdf_courier::handler;
use pdf_courier::server::{self, AppState};
use pdf_courier::smoke;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        None => serve(ServeArgs::from_env()?).await,
        Some(Command::Serve(args)) => serve(args).await,
        Some(Command::Convert(args)) => convert(&args),
        Some(Command::Smoke(args)) => run_smoke(&args).await,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

async fn serve(args: ServeArgs) -> Result<()> {
    log::info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    server::serve(&args, AppState::default())
        .await
        .with_context(|| format!("failed to serve on {}", args.bind_address()))
}

fn convert(args: &ConvertArgs) -> Result<()> {
    let html = fs::read_to_string(&args.input)
        .with_context(|| format!("reading '{}'", args.input.display()))?;
    let output = args.output_path();

    let engine = FlowEngine {
        title: args.title(),
    };
    let bytes = handler::convert(&engine, &html, args.page_size(), args.orientation())
        .context("generating PDF")?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("creating output directory")?;
        }
    }
    fs::write(&output, &bytes).with_context(|| format!("writing '{}'", output.display()))?;
    eprintln!(
        "Wrote '{}' ({} bytes, {} {})",
        output.display(),
        bytes.len(),
        args.page_size(),
        args.orientation()
    );
    Ok(())
}

async fn run_smoke(args: &SmokeArgs) -> Result<()> {
    match smoke::run(args).await {
        Ok(report) => {
            println!("PDF conversion successful!");
            println!("   Filename: {}", report.filename);
            println!(
                "   Size: {} bytes ({} KB)",
                report.size_bytes, report.size_kb
            );
            println!("   Saved as: {}", report.output.display());
            Ok(())
        }
        Err(e) => bail!("smoke test failed: {e}"),
    }
}
