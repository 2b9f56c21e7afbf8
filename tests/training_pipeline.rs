use coinforecast::application::forecasting::{TrainingService, forecast_prices};
use coinforecast::application::ml::{ForecasterConfig, PricePredictor};
use coinforecast::domain::errors::{ArtifactError, TrainingError};
use coinforecast::domain::tokens::TokenRegistry;
use coinforecast::infrastructure::mock::MockMarketDataService;
use coinforecast::infrastructure::persistence::ArtifactStore;
use std::sync::Arc;

fn small_config() -> ForecasterConfig {
    ForecasterConfig {
        hidden_size: 8,
        epochs: 3,
        ..ForecasterConfig::default()
    }
}

#[tokio::test]
async fn test_training_writes_matching_artifacts_per_token() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockMarketDataService::new();
    mock.set_series("avalanche-2", MockMarketDataService::daily_series(121, 35.0))
        .await;

    let registry = TokenRegistry::default();
    let trainer = TrainingService::new(
        Arc::new(mock.clone()),
        ArtifactStore::new(dir.path()),
        small_config(),
        120,
    )
    .with_seed(Some(5));

    let outcome = trainer
        .train_token(registry.lookup("avalanche").unwrap())
        .await
        .unwrap();
    assert_eq!(outcome.external_id, "avalanche-2");
    assert_eq!(outcome.samples, 121 - 30 - 5);

    let store = ArtifactStore::new(dir.path());
    assert!(store.model_path("avalanche-2").exists());
    assert!(store.scaler_path("avalanche-2").exists());

    let artifacts = store.load("avalanche-2").unwrap();
    assert_eq!(artifacts.model.run_id, artifacts.scaler.run_id);
    assert_eq!(artifacts.model.model.lookback(), 30);
    assert_eq!(artifacts.model.model.horizon(), 5);

    let recent = MockMarketDataService::daily_series(30, 35.0).prices();
    let prices =
        forecast_prices(&artifacts.model.model, &artifacts.scaler.scaler, &recent).unwrap();
    assert_eq!(prices.len(), 5);
    assert!(prices.iter().all(|p| p.is_finite()));
}

#[tokio::test]
async fn test_seeded_training_is_reproducible() {
    let mock = MockMarketDataService::new();
    mock.set_series("solana", MockMarketDataService::daily_series(60, 150.0))
        .await;
    let registry = TokenRegistry::default();
    let solana = registry.lookup("solana").unwrap();

    let mut losses = Vec::new();
    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        let trainer = TrainingService::new(
            Arc::new(mock.clone()),
            ArtifactStore::new(dir.path()),
            small_config(),
            60,
        )
        .with_seed(Some(99));
        losses.push(trainer.train_token(solana).await.unwrap().final_loss);
    }
    assert_eq!(losses[0], losses[1]);
}

#[tokio::test]
async fn test_batch_reports_insufficient_history_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockMarketDataService::new();
    mock.set_series("ripple", MockMarketDataService::daily_series(20, 0.6))
        .await;
    mock.set_series("cardano", MockMarketDataService::daily_series(90, 0.4))
        .await;

    let registry = TokenRegistry::default();
    let tokens = vec![
        registry.lookup("ripple").unwrap(),
        registry.lookup("cardano").unwrap(),
    ];
    let trainer = TrainingService::new(
        Arc::new(mock.clone()),
        ArtifactStore::new(dir.path()),
        small_config(),
        120,
    )
    .with_seed(Some(1));

    let report = trainer.train_all(tokens).await;
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), vec!["ripple"]);

    let (_, ripple) = &report.results[0];
    assert!(matches!(
        ripple,
        Err(TrainingError::InsufficientData {
            available: 20,
            needed: 36,
            ..
        })
    ));

    let store = ArtifactStore::new(dir.path());
    assert!(matches!(
        store.load("ripple"),
        Err(ArtifactError::NotFound { .. })
    ));
    assert!(store.load("cardano").is_ok());
}
