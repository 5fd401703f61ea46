//! Relay configuration parsed from environment variables.

use std::net::IpAddr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Messages buffered per client before broadcasts to it are dropped.
    pub outbox_capacity: usize,
}

impl RelayConfig {
    /// Build relay config from environment variables.
    ///
    /// Optional:
    /// - `BIND_ADDR`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `RELAY_OUTBOX_CAPACITY`: default 256, must be non-zero
    pub fn from_env() -> Result<Self, RelayConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_var(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let port = parse_var(&lookup, "PORT", &DEFAULT_PORT.to_string())?;
        let outbox_capacity: usize =
            parse_var(&lookup, "RELAY_OUTBOX_CAPACITY", &DEFAULT_OUTBOX_CAPACITY.to_string())?;
        if outbox_capacity == 0 {
            return Err(RelayConfigError::Invalid { var: "RELAY_OUTBOX_CAPACITY", value: "0".into() });
        }
        Ok(Self { bind_addr, port, outbox_capacity })
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str, default: &str) -> Result<T, RelayConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(var).unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|_| RelayConfigError::Invalid { var, value: raw.clone() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
