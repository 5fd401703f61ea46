//! Transaction gateway seam.
//!
//! The engine never signs or sends anything. It describes each ledger action
//! as a [`GatewayRequest`] inside an `Action::Submit`; the host runs
//! [`submit`] against its wallet-backed [`TransactionGateway`] and hands the
//! outcome back to the engine.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod gateway_test;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LedgerConfig;
use crate::reconcile::Identity;

// =============================================================================
// CONTRACT SURFACE
// =============================================================================

/// A mutating contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ContractCall {
    PlacePixel { x: i32, y: i32, color: String },
    AreaEffect { center_x: i32, center_y: i32, radius: u32 },
    BuyAreaEffect,
}

/// A read-only contract query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "read", rename_all = "snake_case")]
pub enum ContractRead {
    /// How many area effects `owner` holds.
    AreaEffectBalance { owner: Identity },
    /// Price of one area effect, in the chain's smallest unit.
    AreaEffectPrice,
}

/// A ledger action the engine wants performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayRequest {
    PlacePixel { x: i32, y: i32, color: String },
    AreaEffect { center_x: i32, center_y: i32, radius: u32 },
    PurchaseAreaEffect,
}

/// Proof that a transaction was accepted for inclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayFailure {
    #[error("chain switch failed: {0}")]
    ChainSwitch(String),
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("contract read failed: {0}")]
    Read(String),
    #[error("no area effects left")]
    NoAreaEffects,
}

impl GatewayFailure {
    /// Text shown to the user when this failure cancels an action.
    #[must_use]
    pub fn notice_message(&self) -> &'static str {
        match self {
            Self::NoAreaEffects => "You don't have any area effects",
            Self::ChainSwitch(_) | Self::Rejected(_) | Self::Read(_) => "Transaction failed!",
        }
    }
}

/// Wallet and ledger access, implemented by the host.
#[async_trait::async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Ask the wallet to switch to `chain_id`.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), GatewayFailure>;

    /// Sign and send `call` to contract `to`, attaching `value` when set.
    async fn send_transaction(
        &self,
        to: &str,
        call: &ContractCall,
        value: Option<u128>,
    ) -> Result<TxReceipt, GatewayFailure>;

    /// Evaluate a read-only query against contract `to`.
    async fn read_contract(&self, to: &str, read: &ContractRead) -> Result<u128, GatewayFailure>;
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Perform one engine request against the gateway.
///
/// Area effects first check the caller's balance and fail with
/// [`GatewayFailure::NoAreaEffects`] when it is zero, before any wallet prompt.
///
/// # Errors
///
/// Returns the first [`GatewayFailure`] raised along the way.
pub async fn submit(
    gateway: &dyn TransactionGateway,
    config: &LedgerConfig,
    identity: &Identity,
    request: &GatewayRequest,
) -> Result<TxReceipt, GatewayFailure> {
    let result = match request {
        GatewayRequest::PlacePixel { x, y, color } => {
            gateway.switch_chain(config.chain_id).await?;
            let call = ContractCall::PlacePixel { x: *x, y: *y, color: color.clone() };
            gateway.send_transaction(&config.contract_address, &call, None).await
        }
        GatewayRequest::AreaEffect { center_x, center_y, radius } => {
            let read = ContractRead::AreaEffectBalance { owner: identity.clone() };
            let balance = gateway.read_contract(&config.contract_address, &read).await?;
            if balance == 0 {
                return Err(GatewayFailure::NoAreaEffects);
            }
            gateway.switch_chain(config.chain_id).await?;
            let call = ContractCall::AreaEffect { center_x: *center_x, center_y: *center_y, radius: *radius };
            gateway.send_transaction(&config.contract_address, &call, None).await
        }
        GatewayRequest::PurchaseAreaEffect => purchase_area_effect(gateway, config).await,
    };
    match &result {
        Ok(receipt) => info!(%identity, hash = %receipt.hash, ?request, "gateway: transaction sent"),
        Err(e) => warn!(%identity, error = %e, ?request, "gateway: transaction failed"),
    }
    result
}

/// Buy one area effect at the current contract price.
///
/// # Errors
///
/// Returns the first [`GatewayFailure`] raised along the way.
pub async fn purchase_area_effect(
    gateway: &dyn TransactionGateway,
    config: &LedgerConfig,
) -> Result<TxReceipt, GatewayFailure> {
    gateway.switch_chain(config.chain_id).await?;
    let price = gateway.read_contract(&config.contract_address, &ContractRead::AreaEffectPrice).await?;
    gateway.send_transaction(&config.contract_address, &ContractCall::BuyAreaEffect, Some(price)).await
}
