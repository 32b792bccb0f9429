// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory ledger with checkpoint-based atomic units.
//!
//! Used by the `simulate` dry run and by the test suite in place of a chain.

use super::{CheckpointId, Ledger};
use crate::error::ArbError;
use crate::flash::{check_bps, BPS};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Static description of an asset known to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetSpec {
    pub address: Address,
    pub symbol: String,
    /// Share of each transfer withheld from the recipient, in bps.
    #[serde(default)]
    pub transfer_fee_bps: u16,
}

impl AssetSpec {
    pub fn standard(address: Address, symbol: &str) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            transfer_fee_bps: 0,
        }
    }

    pub fn fee_on_transfer(
        address: Address,
        symbol: &str,
        fee_bps: u16,
    ) -> Result<Self, ArbError> {
        Ok(Self {
            address,
            symbol: symbol.to_string(),
            transfer_fee_bps: check_bps("transfer_fee_bps", fee_bps)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct State {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    supplies: HashMap<Address, U256>,
}

/// Ledger held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    assets: HashMap<Address, AssetSpec>,
    state: State,
    checkpoints: Vec<State>,
    timestamp: u64,
}

impl MemoryLedger {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Register an asset. Unregistered assets behave as standard tokens.
    pub fn register(&mut self, spec: AssetSpec) -> Result<(), ArbError> {
        check_bps("transfer_fee_bps", spec.transfer_fee_bps)?;
        self.assets.insert(spec.address, spec);
        Ok(())
    }

    /// Open atomic units.
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Snapshot of every balance of `holders` over `assets`, for before/after
    /// comparisons.
    pub fn balances_of(&self, assets: &[Address], holders: &[Address]) -> Vec<U256> {
        assets
            .iter()
            .flat_map(|a| holders.iter().map(move |h| self.balance_of(*a, *h)))
            .collect()
    }

    fn transfer_fee(&self, asset: Address, amount: U256) -> Result<U256, ArbError> {
        match self.assets.get(&asset) {
            Some(spec) if spec.transfer_fee_bps > 0 => amount
                .checked_mul(U256::from(spec.transfer_fee_bps))
                .map(|scaled| scaled / U256::from(BPS))
                .ok_or(ArbError::Overflow("transfer fee")),
            _ => Ok(U256::ZERO),
        }
    }

    fn debit(&mut self, asset: Address, holder: Address, amount: U256) -> Result<(), ArbError> {
        let available = self.balance_of(asset, holder);
        if available < amount {
            return Err(ArbError::InsufficientBalance {
                asset,
                required: amount,
                available,
            });
        }
        self.state
            .balances
            .insert((asset, holder), available - amount);
        Ok(())
    }

    fn credit(&mut self, asset: Address, holder: Address, amount: U256) -> Result<(), ArbError> {
        let balance = self.balance_of(asset, holder);
        let updated = balance
            .checked_add(amount)
            .ok_or(ArbError::Overflow("balance"))?;
        self.state.balances.insert((asset, holder), updated);
        Ok(())
    }

    fn move_funds(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ArbError> {
        let fee = self.transfer_fee(asset, amount)?;
        let delivered = amount
            .checked_sub(fee)
            .ok_or(ArbError::Overflow("transfer fee"))?;
        self.debit(asset, from, amount)?;
        self.credit(asset, to, delivered)?;
        if !fee.is_zero() {
            let supply = self.total_supply(asset);
            self.state
                .supplies
                .insert(asset, supply.saturating_sub(fee));
            debug!("Transfer fee of {} withheld on {}", fee, asset);
        }
        Ok(())
    }
}

impl Ledger for MemoryLedger {
    fn now(&self) -> u64 {
        self.timestamp
    }

    fn balance_of(&self, asset: Address, holder: Address) -> U256 {
        self.state
            .balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or_default()
    }

    fn total_supply(&self, asset: Address) -> U256 {
        self.state.supplies.get(&asset).copied().unwrap_or_default()
    }

    fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn approve(
        &mut self,
        asset: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ArbError> {
        self.state
            .allowances
            .insert((asset, owner, spender), amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ArbError> {
        self.move_funds(asset, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        asset: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ArbError> {
        let approved = self.allowance(asset, from, spender);
        if approved < amount {
            return Err(ArbError::InsufficientAllowance {
                asset,
                spender,
                required: amount,
                approved,
            });
        }
        self.move_funds(asset, from, to, amount)?;
        if approved != U256::MAX {
            self.state
                .allowances
                .insert((asset, from, spender), approved - amount);
        }
        Ok(())
    }

    fn mint(&mut self, asset: Address, to: Address, amount: U256) -> Result<(), ArbError> {
        let supply = self
            .total_supply(asset)
            .checked_add(amount)
            .ok_or(ArbError::Overflow("supply"))?;
        self.credit(asset, to, amount)?;
        self.state.supplies.insert(asset, supply);
        Ok(())
    }

    fn burn(&mut self, asset: Address, from: Address, amount: U256) -> Result<(), ArbError> {
        self.debit(asset, from, amount)?;
        let supply = self.total_supply(asset);
        self.state
            .supplies
            .insert(asset, supply.saturating_sub(amount));
        Ok(())
    }

    fn checkpoint(&mut self) -> CheckpointId {
        self.checkpoints.push(self.state.clone());
        self.checkpoints.len() - 1
    }

    fn revert_to(&mut self, id: CheckpointId) {
        if id < self.checkpoints.len() {
            self.state = self.checkpoints[id].clone();
            self.checkpoints.truncate(id);
        }
    }

    fn commit(&mut self, id: CheckpointId) {
        self.checkpoints.truncate(id);
    }
}
