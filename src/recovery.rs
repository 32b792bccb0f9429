// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Owner-only withdrawal of assets stranded on the arbitrage contract.

use crate::error::ArbError;
use crate::ledger::Ledger;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// A contract with a single privileged owner.
pub trait Owned {
    fn contract_address(&self) -> Address;
    fn owner(&self) -> Address;
}

/// Outcome of a withdrawal request. A zero balance is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Withdrawal {
    Withdrawn(U256),
    NothingToWithdraw,
}

impl Withdrawal {
    pub fn amount(&self) -> U256 {
        match self {
            Withdrawal::Withdrawn(amount) => *amount,
            Withdrawal::NothingToWithdraw => U256::ZERO,
        }
    }
}

/// Contract entry point used to pull funds out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMethod {
    #[default]
    Withdraw,
    /// Skips the contract's bookkeeping; for contracts stuck mid-cycle.
    EmergencyWithdraw,
}

impl fmt::Display for RecoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryMethod::Withdraw => write!(f, "withdraw"),
            RecoveryMethod::EmergencyWithdraw => write!(f, "emergencyWithdraw"),
        }
    }
}

/// Moves residual balances from a contract to its owner.
pub struct RecoveryManager {
    caller: Address,
}

impl RecoveryManager {
    /// Manager acting on behalf of `caller`.
    pub fn new(caller: Address) -> Self {
        Self { caller }
    }

    pub fn ensure_owner(&self, contract: &dyn Owned) -> Result<(), ArbError> {
        if self.caller != contract.owner() {
            return Err(ArbError::Unauthorized {
                caller: self.caller,
                owner: contract.owner(),
            });
        }
        Ok(())
    }

    /// Transfer the contract's entire balance of `asset` to its owner.
    pub fn withdraw(
        &self,
        ledger: &mut dyn Ledger,
        contract: &dyn Owned,
        asset: Address,
    ) -> Result<Withdrawal, ArbError> {
        self.ensure_owner(contract)?;

        let balance = ledger.balance_of(asset, contract.contract_address());
        if balance.is_zero() {
            return Ok(Withdrawal::NothingToWithdraw);
        }
        ledger.transfer(asset, contract.contract_address(), contract.owner(), balance)?;

        info!("🏦 Withdrew {} of {} to {}", balance, asset, contract.owner());
        Ok(Withdrawal::Withdrawn(balance))
    }

    /// Withdraw each asset in turn, stopping at the first failure.
    pub fn withdraw_all(
        &self,
        ledger: &mut dyn Ledger,
        contract: &dyn Owned,
        assets: &[Address],
    ) -> Result<Vec<(Address, Withdrawal)>, ArbError> {
        assets
            .iter()
            .map(|asset| Ok((*asset, self.withdraw(ledger, contract, *asset)?)))
            .collect()
    }
}
