use crate::domain::errors::MarketDataError;
use crate::domain::types::PriceSeries;
use async_trait::async_trait;

/// Source of historical prices for a token.
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Fetches the trailing `days` of prices for `external_id`, quoted in
    /// `vs_currency`, ordered oldest first.
    async fn get_price_history(
        &self,
        external_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<PriceSeries, MarketDataError>;

    /// Provider name used for logging and metrics labels.
    fn provider(&self) -> &str;
}
