//! Offline trainer: fits one LSTM forecaster per token and writes the
//! model and scaler artifacts the server loads.

use anyhow::{Context, Result};
use clap::Parser;
use coinforecast::application::forecasting::TrainingService;
use coinforecast::config::Config;
use coinforecast::domain::tokens::TokenDescriptor;
use coinforecast::infrastructure::observability::{Metrics, init_tracing};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Token to train (repeatable). Trains every registered token when omitted.
    #[arg(long = "token")]
    tokens: Vec<String>,

    /// Output directory for artifacts (overrides MODELS_DIR)
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Training epochs (overrides EPOCHS)
    #[arg(long)]
    epochs: Option<usize>,

    /// Seed for weight initialisation and shuffling (overrides TRAINING_SEED)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env()?;
    init_tracing(config.observability.log_format)?;

    if let Some(dir) = args.models_dir {
        config.model.models_dir = dir;
    }
    if let Some(epochs) = args.epochs {
        anyhow::ensure!(epochs > 0, "--epochs must be greater than 0");
        config.model.epochs = epochs;
    }
    if args.seed.is_some() {
        config.model.training_seed = args.seed;
    }

    let registry = config.token_registry()?;
    let selected: Vec<&TokenDescriptor> = if args.tokens.is_empty() {
        registry.iter().collect()
    } else {
        args.tokens
            .iter()
            .map(|t| registry.resolve(t))
            .collect::<Result<_, _>>()
            .context("Invalid --token")?
    };

    let forecaster = config.model.forecaster_config();
    let history_days = u32::try_from(config.model.training_days())
        .context("Training history does not fit in a day count")?;
    info!(
        "Training {} tokens: {} days of history, lookback {}, horizon {}, {} epochs -> {:?}",
        selected.len(),
        history_days,
        forecaster.lookback,
        forecaster.horizon,
        forecaster.epochs,
        config.model.models_dir
    );

    let metrics = if config.observability.metrics_enabled {
        Some(Metrics::new().context("Failed to register metrics")?)
    } else {
        None
    };

    let mut trainer = TrainingService::new(
        Arc::new(config.market_data.build_service()),
        config.artifact_store(),
        forecaster,
        history_days,
    )
    .with_vs_currency(config.market_data.vs_currency.clone())
    .with_seed(config.model.training_seed);
    if let Some(metrics) = &metrics {
        trainer = trainer.with_metrics(metrics.clone());
    }

    let report = trainer.train_all(selected).await;

    if let Some(metrics) = &metrics {
        info!("Training metrics:\n{}", metrics.render());
    }

    println!("\n  Token          Samples  Final loss   Result");
    for (key, result) in &report.results {
        match result {
            Ok(outcome) => println!(
                "  {:<14} {:>7}  {:>10}   ok ({})",
                key,
                outcome.samples,
                outcome
                    .final_loss
                    .map(|l| format!("{:.6}", l))
                    .unwrap_or_else(|| "-".to_string()),
                outcome.run_id
            ),
            Err(e) => println!("  {:<14} {:>7}  {:>10}   FAILED: {}", key, "-", "-", e),
        }
    }

    if !report.all_succeeded() {
        anyhow::bail!("Training failed for: {:?}", report.failed());
    }
    Ok(())
}
