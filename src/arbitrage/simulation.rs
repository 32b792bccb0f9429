// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Offline dry run of a cycle plan against a JSON-described market.

use super::borrower::{retained, ArbitrageBorrower};
use super::orchestrator::{ExecutionOutcome, Orchestrator};
use super::plan::CyclePlan;
use crate::error::ArbError;
use crate::executor::{DebondAdapter, SwapAdapter};
use crate::flash::{check_bps, CallbackInterface, FlashLender, LenderKind};
use crate::ledger::{AssetSpec, Ledger, MemoryLedger};
use crate::network::NetworkProfile;
use crate::venues::{ConstantProductRouter, PairSpec, WeightedIndex, DEFAULT_SWAP_FEE_BPS};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn default_swap_fee() -> u16 {
    DEFAULT_SWAP_FEE_BPS
}

fn unbounded() -> U256 {
    U256::MAX
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub asset: Address,
    pub holder: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSpec {
    pub address: Address,
    #[serde(default = "default_swap_fee")]
    pub fee_bps: u16,
    pub pairs: Vec<PairSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSpec {
    #[serde(flatten)]
    pub index: WeightedIndex,
    /// Reference amount for the min-cap unwrap policy.
    #[serde(default = "unbounded")]
    pub reference_amount: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LenderSpec {
    pub address: Address,
    pub interface: CallbackInterface,
    pub kind: LenderKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowerSpec {
    pub address: Address,
    pub owner: Address,
    pub interface: CallbackInterface,
}

/// Market snapshot a plan is simulated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    pub timestamp: u64,
    #[serde(default)]
    pub assets: Vec<AssetSpec>,
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
    #[serde(default)]
    pub routers: Vec<RouterSpec>,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
    pub lender: LenderSpec,
    pub borrower: BorrowerSpec,
}

/// What a simulated cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub outcome: ExecutionOutcome,
    /// Loan asset left on the borrower beyond its starting balance.
    pub profit: U256,
}

impl SimulationState {
    pub fn from_json(json: &str) -> Result<Self, ArbError> {
        let state: Self = serde_json::from_str(json)
            .map_err(|e| ArbError::Config(format!("Invalid simulation state: {e}")))?;
        state.validate()?;
        Ok(state)
    }

    /// Reject fee rates no venue could charge.
    pub fn validate(&self) -> Result<(), ArbError> {
        for asset in &self.assets {
            check_bps("transfer_fee_bps", asset.transfer_fee_bps)?;
        }
        for router in &self.routers {
            check_bps("fee_bps", router.fee_bps)?;
        }
        for spec in &self.indexes {
            spec.index.validate()?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ArbError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ArbError::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn build_ledger(&self) -> Result<MemoryLedger, ArbError> {
        let mut ledger = MemoryLedger::new(self.timestamp);
        for spec in &self.assets {
            ledger.register(spec.clone())?;
        }
        for entry in &self.balances {
            ledger.mint(entry.asset, entry.holder, entry.amount)?;
        }
        Ok(ledger)
    }

    pub fn build_lender(&self) -> FlashLender {
        FlashLender::new(self.lender.address, self.lender.interface, self.lender.kind)
    }

    /// Borrower wired to every router and index in the snapshot. The plan's
    /// steps reach it through the loan's callback data.
    pub fn build_borrower(&self, plan: &CyclePlan) -> Result<ArbitrageBorrower, ArbError> {
        let mut borrower = ArbitrageBorrower::new(
            self.borrower.address,
            self.borrower.owner,
            self.borrower.interface,
        );
        for spec in &self.routers {
            let router =
                ConstantProductRouter::with_pairs(spec.address, spec.fee_bps, &spec.pairs)?;
            borrower = borrower.with_router(
                SwapAdapter::new(Arc::new(router)).with_deadline_bound(plan.deadline_bound_secs),
            );
        }
        for spec in &self.indexes {
            borrower = borrower.with_index(DebondAdapter::new(
                Arc::new(spec.index.clone()),
                spec.reference_amount,
            ));
        }
        Ok(borrower)
    }
}

/// Run `plan` once against a fresh ledger built from `state`.
pub fn simulate(
    state: &SimulationState,
    plan: &CyclePlan,
    profile: &NetworkProfile,
) -> Result<SimulationReport, ArbError> {
    if plan.lender != state.lender.address {
        return Err(ArbError::Config(format!(
            "plan lender {} is not the simulated lender {}",
            plan.lender, state.lender.address
        )));
    }

    let mut ledger = state.build_ledger()?;
    let mut borrower = state.build_borrower(plan)?;
    let mut orchestrator = Orchestrator::new(state.build_lender());

    let before = ledger.balance_of(plan.asset, state.borrower.address);
    let request = plan.loan_request(state.borrower.address)?;
    let outcome = orchestrator.execute(&mut ledger, profile, &mut borrower, request);
    let profit = retained(&ledger, state.borrower.address, plan.asset, before);

    info!("🧪 Simulation {} with profit {}", outcome, profit);
    Ok(SimulationReport { outcome, profit })
}
