//! Token registry: the static set of tokens the service can forecast.
//!
//! Each token has a short request key (`avalanche`), the identifier the
//! market-data provider knows it by (`avalanche-2`), and a ticker symbol.

use super::errors::RegistryError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub key: String,
    #[serde(rename = "id")]
    pub external_id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

impl TokenDescriptor {
    pub fn new(key: &str, external_id: &str, symbol: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            external_id: external_id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

const BUILTIN_TOKENS: &[(&str, &str, &str, &str)] = &[
    ("bitcoin", "bitcoin", "btc", "Bitcoin"),
    ("ethereum", "ethereum", "eth", "Ethereum"),
    ("solana", "solana", "sol", "Solana"),
    ("cardano", "cardano", "ada", "Cardano"),
    ("ripple", "ripple", "xrp", "Ripple"),
    ("dogecoin", "dogecoin", "doge", "Dogecoin"),
    ("polkadot", "polkadot", "dot", "Polkadot"),
    ("avalanche", "avalanche-2", "avax", "Avalanche"),
    ("polygon", "matic-network", "matic", "Polygon"),
    ("chainlink", "chainlink", "link", "Chainlink"),
];

/// Immutable, ordered token registry.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<TokenDescriptor>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self {
            tokens: BUILTIN_TOKENS
                .iter()
                .map(|(key, id, symbol, name)| TokenDescriptor::new(key, id, symbol, name))
                .collect(),
        }
    }
}

impl TokenRegistry {
    /// Builds a registry from explicit descriptors. Keys are normalised to
    /// lowercase and must be unique and non-empty.
    pub fn new(tokens: Vec<TokenDescriptor>) -> Result<Self, RegistryError> {
        let mut normalised: Vec<TokenDescriptor> = Vec::with_capacity(tokens.len());
        for mut token in tokens {
            token.key = token.key.trim().to_lowercase();
            token.external_id = token.external_id.trim().to_string();

            if token.key.is_empty() || token.external_id.is_empty() {
                return Err(RegistryError::InvalidDescriptor {
                    reason: format!(
                        "key and id must be non-empty (key={:?}, id={:?})",
                        token.key, token.external_id
                    ),
                });
            }
            if normalised.iter().any(|t| t.key == token.key) {
                return Err(RegistryError::DuplicateKey { key: token.key });
            }
            normalised.push(token);
        }
        Ok(Self { tokens: normalised })
    }

    /// Looks up a token by its request key (case-insensitive).
    pub fn lookup(&self, key: &str) -> Result<&TokenDescriptor, RegistryError> {
        let key = key.trim().to_lowercase();
        self.tokens
            .iter()
            .find(|t| t.key == key)
            .ok_or_else(|| self.unsupported(&key))
    }

    /// Like [`lookup`](Self::lookup) but also accepts the provider's
    /// external id, which is what web clients tend to have on hand.
    pub fn resolve(&self, query: &str) -> Result<&TokenDescriptor, RegistryError> {
        let query = query.trim().to_lowercase();
        self.tokens
            .iter()
            .find(|t| t.key == query)
            .or_else(|| {
                self.tokens
                    .iter()
                    .find(|t| t.external_id.eq_ignore_ascii_case(&query))
            })
            .ok_or_else(|| self.unsupported(&query))
    }

    pub fn supported_keys(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.key.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenDescriptor> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn unsupported(&self, token: &str) -> RegistryError {
        RegistryError::UnsupportedToken {
            token: token.to_string(),
            supported: self.supported_keys(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_tokens_resolve() {
        let registry = TokenRegistry::default();
        assert_eq!(registry.len(), 10);

        for key in registry.supported_keys() {
            let descriptor = registry.lookup(&key).expect("builtin key should resolve");
            assert!(!descriptor.external_id.is_empty());
            assert!(!descriptor.symbol.is_empty());
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = TokenRegistry::default();
        let descriptor = registry.lookup("BitCoin").unwrap();
        assert_eq!(descriptor.symbol, "btc");
    }

    #[test]
    fn test_lookup_uses_key_not_external_id() {
        let registry = TokenRegistry::default();
        assert_eq!(
            registry.lookup("avalanche").unwrap().external_id,
            "avalanche-2"
        );
        assert!(registry.lookup("avalanche-2").is_err());
    }

    #[test]
    fn test_resolve_accepts_external_id() {
        let registry = TokenRegistry::default();
        assert_eq!(registry.resolve("matic-network").unwrap().key, "polygon");
        assert_eq!(registry.resolve("polygon").unwrap().key, "polygon");
    }

    #[test]
    fn test_unknown_key_lists_supported() {
        let registry = TokenRegistry::default();
        match registry.lookup("shiba") {
            Err(RegistryError::UnsupportedToken { token, supported }) => {
                assert_eq!(token, "shiba");
                assert_eq!(supported.first().map(String::as_str), Some("bitcoin"));
                assert_eq!(supported.len(), 10);
            }
            other => panic!("expected UnsupportedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let result = TokenRegistry::new(vec![
            TokenDescriptor::new("btc", "bitcoin", "btc", "Bitcoin"),
            TokenDescriptor::new("BTC", "bitcoin", "btc", "Bitcoin"),
        ]);
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateKey {
                key: "btc".to_string()
            }
        );
    }

    #[test]
    fn test_empty_external_id_rejected() {
        let result = TokenRegistry::new(vec![TokenDescriptor::new("x", " ", "x", "X")]);
        assert!(matches!(
            result,
            Err(RegistryError::InvalidDescriptor { .. })
        ));
    }
}
