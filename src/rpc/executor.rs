// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Drives cycles and recovery against the deployed arbitrage contract.

use super::contracts::{callback_selector, code_exposes, execute_calldata, recovery_calldata};
use super::gateway::ChainGateway;
use crate::arbitrage::{CyclePlan, ExecutionOutcome};
use crate::error::ArbError;
use crate::flash::{compute_fee, repayment_due, CallbackInterface};
use crate::network::NetworkProfile;
use crate::recovery::{RecoveryMethod, Withdrawal};
use alloy::primitives::Address;
use tracing::{error, info, warn};

/// On-chain counterpart of [`crate::arbitrage::Orchestrator`].
///
/// The chain provides atomicity: a cycle is dry-run with `eth_call` first and
/// only submitted if the dry run settles.
pub struct ChainOrchestrator<G: ChainGateway> {
    gateway: G,
    contract: Address,
    interface: CallbackInterface,
    profile: NetworkProfile,
}

impl<G: ChainGateway> ChainOrchestrator<G> {
    pub fn new(
        gateway: G,
        contract: Address,
        interface: CallbackInterface,
        profile: NetworkProfile,
    ) -> Self {
        Self {
            gateway,
            contract,
            interface,
            profile,
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Verify the deployed contract exposes the callback the lender will call.
    pub async fn check_interface(&self) -> Result<(), ArbError> {
        let code = self.gateway.code_at(self.contract).await?;
        if code.is_empty() {
            return Err(ArbError::Config(format!(
                "no code deployed at {} on {}",
                self.contract, self.profile
            )));
        }
        if code_exposes(&code, callback_selector(self.interface)) {
            return Ok(());
        }

        let found: Vec<String> = CallbackInterface::ALL
            .into_iter()
            .filter(|i| code_exposes(&code, callback_selector(*i)))
            .map(|i| i.to_string())
            .collect();
        Err(ArbError::InterfaceMismatch {
            expected: self.interface.to_string(),
            found: if found.is_empty() {
                "none".to_string()
            } else {
                found.join(", ")
            },
        })
    }

    /// Run `plan` with a deadline derived from the wall clock.
    pub async fn run_cycle(&self, plan: &CyclePlan) -> ExecutionOutcome {
        let now = chrono::Utc::now().timestamp() as u64;
        self.run_cycle_at(plan, now).await
    }

    pub async fn run_cycle_at(&self, plan: &CyclePlan, now: u64) -> ExecutionOutcome {
        info!(
            "⚡ Executing cycle on {}: {} of {} from {}",
            self.profile, plan.principal, plan.asset, plan.lender
        );
        match self.try_cycle(plan, now).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                if reason.is_ledger_revert() {
                    warn!("❌ Cycle reverted: {}", reason);
                } else {
                    error!("❌ Cycle failed: {}", reason);
                }
                ExecutionOutcome::Reverted { reason }
            }
        }
    }

    async fn try_cycle(&self, plan: &CyclePlan, now: u64) -> Result<ExecutionOutcome, ArbError> {
        plan.validate()?;
        self.check_interface().await?;

        let calldata = execute_calldata(plan, plan.deadline_from(now));
        self.gateway.simulate(self.contract, calldata.clone()).await?;
        info!("🧪 Dry run settled, submitting");

        let receipt = self.gateway.submit(self.contract, calldata).await?;
        if !receipt.success {
            return Err(ArbError::VenueReverted(format!(
                "transaction {} reverted on-chain",
                receipt.tx_hash
            )));
        }

        info!(
            "✅ Cycle settled in block {:?}, gas used {}, TX: {:?}",
            receipt.block_number, receipt.gas_used, receipt.tx_hash
        );
        Ok(ExecutionOutcome::Settled {
            repaid: repayment_due(plan.principal)?,
            fee: compute_fee(plan.principal),
        })
    }

    /// Pull the contract's balance of `asset` to its owner. Zero balance is a
    /// no-op and submits nothing.
    pub async fn recover(
        &self,
        asset: Address,
        method: RecoveryMethod,
    ) -> Result<Withdrawal, ArbError> {
        let owner = self.gateway.owner_of(self.contract).await?;
        let caller = self.gateway.signer();
        if owner != caller {
            return Err(ArbError::Unauthorized { caller, owner });
        }

        let balance = self.gateway.token_balance(asset, self.contract).await?;
        if balance.is_zero() {
            warn!("Nothing to withdraw: {} holds no {}", self.contract, asset);
            return Ok(Withdrawal::NothingToWithdraw);
        }

        let receipt = self
            .gateway
            .submit(self.contract, recovery_calldata(method, asset))
            .await?;
        if !receipt.success {
            return Err(ArbError::VenueReverted(format!(
                "{method} reverted in {}",
                receipt.tx_hash
            )));
        }

        info!("🏦 Recovered {} of {} via {}", balance, asset, method);
        Ok(Withdrawal::Withdrawn(balance))
    }
}
