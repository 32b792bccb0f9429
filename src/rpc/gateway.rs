// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chain access used by the on-chain orchestrator.

use super::contracts::{IFlashArbitrage, IERC20};
use crate::error::{classify_revert, ArbError};
use crate::executor::GasParams;
use crate::network::NetworkProfile;
use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

/// Mined result of a submitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// False when the operation was mined but reverted.
    pub success: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Account that signs submissions.
    fn signer(&self) -> Address;

    async fn token_balance(&self, asset: Address, holder: Address) -> Result<U256, ArbError>;

    async fn code_at(&self, address: Address) -> Result<Bytes, ArbError>;

    async fn owner_of(&self, contract: Address) -> Result<Address, ArbError>;

    /// Dry-run `calldata` with `eth_call`. A revert comes back classified.
    async fn simulate(&self, to: Address, calldata: Bytes) -> Result<(), ArbError>;

    /// Sign, send and wait for the profile's confirmation depth.
    async fn submit(&self, to: Address, calldata: Bytes) -> Result<SubmissionReceipt, ArbError>;
}

/// JSON-RPC error responses carry a revert reason; anything else is transport.
fn map_rpc_error(context: &str, e: TransportError) -> ArbError {
    match e.as_error_resp() {
        Some(payload) => classify_revert(&payload.message),
        None => ArbError::Rpc(format!("{context}: {e}")),
    }
}

/// Send-time failures. Transport errors stay [`ArbError::Rpc`]; anything the
/// node answered with is a rejected submission.
fn rejection(e: TransportError) -> ArbError {
    match e.as_error_resp() {
        Some(payload) => match classify_revert(&payload.message) {
            rejected @ ArbError::SubmissionRejected(_) => rejected,
            _ => ArbError::SubmissionRejected(payload.message.to_string()),
        },
        None => ArbError::Rpc(format!("send_transaction: {e}")),
    }
}

/// [`ChainGateway`] over an alloy provider with a wallet attached.
pub struct AlloyGateway<P: Provider + Clone> {
    provider: P,
    signer: Address,
    profile: NetworkProfile,
    nonce: AtomicU64,
}

impl<P: Provider + Clone> AlloyGateway<P> {
    /// Check the endpoint serves the profile's chain and load the signer nonce.
    pub async fn connect(
        provider: P,
        signer: Address,
        profile: NetworkProfile,
    ) -> Result<Self, ArbError> {
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ArbError::Rpc(format!("Failed to get chain id: {e}")))?;
        if chain_id != profile.chain_id {
            return Err(ArbError::Config(format!(
                "RPC endpoint serves chain {chain_id}, profile {profile} expects {}",
                profile.chain_id
            )));
        }

        let nonce = provider
            .get_transaction_count(signer)
            .await
            .map_err(|e| ArbError::Rpc(format!("Failed to get nonce: {e}")))?;

        info!("🔗 Connected to {} as {:?} (nonce {})", profile, signer, nonce);
        Ok(Self {
            provider,
            signer,
            profile,
            nonce: AtomicU64::new(nonce),
        })
    }

    async fn gas_params(&self) -> Result<GasParams, ArbError> {
        let base_fee = if self.profile.fee_policy.needs_base_fee() {
            self.provider
                .get_block_by_number(BlockNumberOrTag::Latest)
                .await
                .map_err(|e| ArbError::Rpc(format!("Latest block fetch failed: {e}")))?
                .and_then(|b| b.header.base_fee_per_gas)
                .map(u128::from)
                .unwrap_or_default()
        } else {
            0
        };
        Ok(self.profile.fee_policy.calculate(base_fee))
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> ChainGateway for AlloyGateway<P> {
    fn signer(&self) -> Address {
        self.signer
    }

    async fn token_balance(&self, asset: Address, holder: Address) -> Result<U256, ArbError> {
        IERC20::new(asset, &self.provider)
            .balanceOf(holder)
            .call()
            .await
            .map_err(|e| ArbError::Rpc(format!("balanceOf {asset} failed: {e}")))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, ArbError> {
        self.provider
            .get_code_at(address)
            .await
            .map_err(|e| ArbError::Rpc(format!("Failed to get code at {address}: {e}")))
    }

    async fn owner_of(&self, contract: Address) -> Result<Address, ArbError> {
        IFlashArbitrage::new(contract, &self.provider)
            .owner()
            .call()
            .await
            .map_err(|e| ArbError::Rpc(format!("owner() on {contract} failed: {e}")))
    }

    async fn simulate(&self, to: Address, calldata: Bytes) -> Result<(), ArbError> {
        let tx = TransactionRequest::default()
            .from(self.signer)
            .to(to)
            .input(calldata.into())
            .gas_limit(self.profile.gas_limit);

        self.provider
            .call(tx)
            .await
            .map(|_| ())
            .map_err(|e| map_rpc_error("eth_call", e))
    }

    async fn submit(&self, to: Address, calldata: Bytes) -> Result<SubmissionReceipt, ArbError> {
        let gas = self.gas_params().await?;
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);

        let tx = gas.apply(
            TransactionRequest::default()
                .from(self.signer)
                .to(to)
                .input(calldata.into())
                .nonce(nonce)
                .gas_limit(self.profile.gas_limit),
        );
        debug!("Submitting to {} with nonce {} and {:?}", to, nonce, gas);

        let pending = match self.provider.send_transaction(tx).await {
            Ok(pending) => pending,
            Err(e) => {
                self.nonce.fetch_sub(1, Ordering::SeqCst);
                error!("Failed to send TX: {}", e);
                return Err(rejection(e));
            }
        };
        info!("📤 TX sent: {:?}", pending.tx_hash());

        let receipt = pending
            .with_required_confirmations(self.profile.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ArbError::Rpc(format!("Failed to get receipt: {e}")))?;

        Ok(SubmissionReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::{ErrorPayload, RpcError};
    use alloy::transports::TransportErrorKind;

    fn node_error(message: &'static str) -> TransportError {
        RpcError::ErrorResp(ErrorPayload {
            code: -32000,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn node_refusals_are_rejected_submissions() {
        for message in [
            "nonce too low",
            "replacement transaction underpriced",
            "insufficient funds for gas * price + value",
        ] {
            let err = rejection(node_error(message));
            assert_eq!(err, ArbError::SubmissionRejected(message.to_string()));
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn transport_failure_on_send_stays_rpc() {
        let err = rejection(TransportErrorKind::custom_str("connection refused"));
        assert!(matches!(err, ArbError::Rpc(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn dry_run_reverts_are_classified() {
        let err = map_rpc_error(
            "eth_call",
            node_error("execution reverted: UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT"),
        );
        assert!(matches!(err, ArbError::SlippageExceeded { .. }));
        assert_eq!(err.exit_code(), 1);

        let err = map_rpc_error("eth_call", TransportErrorKind::custom_str("timed out"));
        assert!(matches!(err, ArbError::Rpc(_)));
    }
}
