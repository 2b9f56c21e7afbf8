pub mod coingecko;
pub mod core;
pub mod mock;
pub mod observability;
pub mod persistence;
pub mod registry_file;

pub use coingecko::CoinGeckoMarketDataService;
pub use mock::MockMarketDataService;
pub use observability::Metrics;
pub use persistence::ArtifactStore;
