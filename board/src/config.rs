//! Ledger configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::env::VarError;

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x822e5088E9dDc9B94f1Fcd619610c0F874a2c406";
pub const DEFAULT_CHAIN_ID: u64 = 10143;

const CONTRACT_ADDRESS_VAR: &str = "PIXELBOARD_CONTRACT_ADDRESS";
const CHAIN_ID_VAR: &str = "PIXELBOARD_CHAIN_ID";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} is not a chain id")]
    InvalidChainId { var: &'static str, value: String },
    #[error("invalid {var}: {value:?} is not a 20-byte hex address")]
    InvalidAddress { var: &'static str, value: String },
    #[error("{var} is not valid unicode")]
    NotUnicode { var: &'static str },
}

/// Where ledger actions are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub contract_address: String,
    pub chain_id: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(), chain_id: DEFAULT_CHAIN_ID }
    }
}

impl LedgerConfig {
    /// Build ledger config from environment variables.
    ///
    /// Optional:
    /// - `PIXELBOARD_CONTRACT_ADDRESS`: board contract, default [`DEFAULT_CONTRACT_ADDRESS`]
    /// - `PIXELBOARD_CHAIN_ID`: network to switch to before sending, default 10143
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let contract_address = read_env(CONTRACT_ADDRESS_VAR)?;
        let chain_id = read_env(CHAIN_ID_VAR)?;
        Self::from_lookup(|key| match key {
            CONTRACT_ADDRESS_VAR => contract_address.clone(),
            CHAIN_ID_VAR => chain_id.clone(),
            _ => None,
        })
    }

    /// Same as [`LedgerConfig::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a variable is set but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let contract_address = match lookup(CONTRACT_ADDRESS_VAR) {
            Some(raw) => parse_address(CONTRACT_ADDRESS_VAR, &raw)?,
            None => DEFAULT_CONTRACT_ADDRESS.to_string(),
        };
        let chain_id = match lookup(CHAIN_ID_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidChainId { var: CHAIN_ID_VAR, value: raw.clone() })?,
            None => DEFAULT_CHAIN_ID,
        };
        Ok(Self { contract_address, chain_id })
    }
}

fn read_env(var: &'static str) -> Result<Option<String>, ConfigError> {
    env_value(var, std::env::var(var))
}

/// Unset reads as `None`; a set but non-unicode value is an error.
fn env_value(var: &'static str, value: Result<String, VarError>) -> Result<Option<String>, ConfigError> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { var }),
    }
}

fn parse_address(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let valid = trimmed
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(ConfigError::InvalidAddress { var, value: raw.to_string() });
    }
    Ok(trimmed.to_string())
}
