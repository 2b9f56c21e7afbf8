pub mod market_data;

pub use market_data::{
    COINGECKO_API_URL, CoinGeckoMarketDataService, CoinGeckoMarketDataServiceBuilder,
};
