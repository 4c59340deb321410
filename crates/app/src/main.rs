use std::{process::ExitCode, sync::Arc, time::Duration};

use clap::Parser;
use engine::{CachedRates, CoinGeckoRates, Engine, RateProvider, ReferenceCurrency};
use serde::Serialize;

use crate::{
    cli::{Cli, Command},
    error::Result,
    settings::Settings,
};

mod cli;
mod error;
mod render;
mod settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match Settings::new(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("invalid settings: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    match run(cli, &settings).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        // Nothing uploaded yet: tell the user, it is not a failure.
        Err(err) if err.is_no_records() => {
            println!("{err}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("An error occurred while calculating.");
            ExitCode::FAILURE
        }
    }
}

async fn build_engine(settings: &Settings) -> Result<Engine> {
    let currency = ReferenceCurrency::try_from(settings.rates.reference_currency.as_str())?;
    let mut rates: Arc<dyn RateProvider> = Arc::new(CoinGeckoRates::new(
        &settings.rates.base_url,
        currency,
        Duration::from_secs(settings.rates.timeout_secs),
    ));
    if settings.rates.cache_ttl_secs > 0 {
        rates = Arc::new(CachedRates::new(
            rates,
            Duration::from_secs(settings.rates.cache_ttl_secs),
        ));
    }

    let engine = Engine::builder()
        .directory(settings.store.directory.clone())
        .rates(rates)
        .build()
        .await?;
    tracing::debug!("engine ready: {engine:?}");
    Ok(engine)
}

fn json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

async fn run(cli: Cli, settings: &Settings) -> Result<String> {
    let engine = build_engine(settings).await?;
    let currency = engine.currency();

    let output = match cli.command {
        Command::Upload(args) => {
            let contents = tokio::fs::read(&args.file).await?;
            let path = engine.upload(args.user, args.kind, &contents).await?;
            tracing::info!("Uploaded {} file for user ID {}", args.kind, args.user);
            if cli.json {
                json(&path)?
            } else {
                let kind = args.kind.as_str();
                let mut title = kind[..1].to_uppercase();
                title.push_str(&kind[1..]);
                format!("{title} file uploaded successfully!")
            }
        }
        Command::Aggregate(args) => {
            let aggregate = engine.compute_aggregate(args.user, args.kind).await?;
            if cli.json {
                json(&aggregate)?
            } else {
                render::aggregate(args.kind, &aggregate, currency)
            }
        }
        Command::Total(args) => {
            let summary = engine.compute_summary(args.user).await?;
            if cli.json {
                json(&summary)?
            } else {
                render::summary(&summary, currency)
            }
        }
        Command::Breakdown(args) => {
            let lines = engine.compute_breakdown(args.user).await?;
            if cli.json {
                json(&lines)?
            } else {
                render::breakdown(&lines, currency)
            }
        }
        Command::Clear(args) => {
            let removed = engine.clear(args.user).await;
            if cli.json {
                json(&removed)?
            } else {
                render::cleared(removed)
            }
        }
        Command::List => {
            let entries = engine.records().registered().await;
            if cli.json {
                json(&entries)?
            } else {
                render::registered(&entries)
            }
        }
    };

    Ok(output)
}
