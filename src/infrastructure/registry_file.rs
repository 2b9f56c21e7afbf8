//! Token registry overrides loaded from TOML.
//!
//! ```toml
//! [[tokens]]
//! key = "bitcoin"
//! id = "bitcoin"
//! symbol = "btc"
//! name = "Bitcoin"
//! ```

use crate::domain::tokens::{TokenDescriptor, TokenRegistry};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RegistryFile {
    tokens: Vec<TokenDescriptor>,
}

pub fn parse_registry(content: &str) -> Result<TokenRegistry> {
    let file: RegistryFile = toml::from_str(content).context("Failed to parse token registry TOML")?;
    if file.tokens.is_empty() {
        anyhow::bail!("Token registry file defines no tokens");
    }
    TokenRegistry::new(file.tokens).context("Invalid token registry")
}

pub fn load_registry(path: &Path) -> Result<TokenRegistry> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read token registry {:?}", path))?;
    let registry = parse_registry(&content)?;
    info!(
        "Loaded {} tokens from registry file {:?}",
        registry.len(),
        path
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_registry() {
        let registry = parse_registry(
            r#"
            [[tokens]]
            key = "Bitcoin"
            id = "bitcoin"
            symbol = "btc"
            name = "Bitcoin"

            [[tokens]]
            key = "pepe"
            id = "pepe"
            symbol = "pepe"
            "#,
        )
        .unwrap();

        assert_eq!(registry.supported_keys(), vec!["bitcoin", "pepe"]);
        assert_eq!(registry.lookup("pepe").unwrap().name, "");
    }

    #[test]
    fn test_duplicate_keys_fail() {
        let result = parse_registry(
            r#"
            [[tokens]]
            key = "btc"
            id = "bitcoin"
            symbol = "btc"

            [[tokens]]
            key = "btc"
            id = "bitcoin"
            symbol = "btc"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_registry_fails() {
        assert!(parse_registry("tokens = []").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.toml");
        fs::write(
            &path,
            "[[tokens]]\nkey = \"sui\"\nid = \"sui\"\nsymbol = \"sui\"\nname = \"Sui\"\n",
        )
        .unwrap();

        let registry = load_registry(&path).unwrap();
        assert_eq!(registry.resolve("sui").unwrap().name, "Sui");
    }
}
