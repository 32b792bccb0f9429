// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wrapped multi-asset index with a debond (unwrap) operation.

use crate::error::ArbError;
use crate::flash::{check_bps, BPS};
use crate::ledger::Ledger;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A wrapped asset backed by a basket of underlying assets.
pub trait WrappedAsset {
    fn address(&self) -> Address;

    fn underlying(&self) -> &[Address];

    /// Burn `amount` of the wrapped asset held by `caller` and pay out the
    /// underlying assets split by `percentages`.
    fn debond(
        &self,
        ledger: &mut dyn Ledger,
        caller: Address,
        amount: U256,
        assets: &[Address],
        percentages: &[u8],
    ) -> Result<(), ArbError>;
}

/// Index whose underlying reserves are held at the index's own address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedIndex {
    pub address: Address,
    pub underlying: Vec<Address>,
    /// Share of each debond retained by the index, in bps.
    #[serde(default)]
    pub debond_fee_bps: u16,
}

impl WeightedIndex {
    pub fn new(
        address: Address,
        underlying: Vec<Address>,
        debond_fee_bps: u16,
    ) -> Result<Self, ArbError> {
        let index = Self {
            address,
            underlying,
            debond_fee_bps,
        };
        index.validate()?;
        Ok(index)
    }

    /// Check a deserialized index is usable.
    pub fn validate(&self) -> Result<(), ArbError> {
        check_bps("debond_fee_bps", self.debond_fee_bps)?;
        Ok(())
    }

    fn check_split(&self, assets: &[Address], percentages: &[u8]) -> Result<(), ArbError> {
        if assets.len() != percentages.len() {
            return Err(ArbError::InvalidDistribution(format!(
                "{} assets but {} percentages",
                assets.len(),
                percentages.len()
            )));
        }
        let total: u32 = percentages.iter().map(|p| *p as u32).sum();
        if total != 100 {
            return Err(ArbError::InvalidDistribution(format!(
                "percentages sum to {total}, expected 100"
            )));
        }
        if let Some(unknown) = assets.iter().find(|a| !self.underlying.contains(a)) {
            return Err(ArbError::InvalidDistribution(format!(
                "{unknown} is not an underlying of {}",
                self.address
            )));
        }
        Ok(())
    }
}

impl WrappedAsset for WeightedIndex {
    fn address(&self) -> Address {
        self.address
    }

    fn underlying(&self) -> &[Address] {
        &self.underlying
    }

    fn debond(
        &self,
        ledger: &mut dyn Ledger,
        caller: Address,
        amount: U256,
        assets: &[Address],
        percentages: &[u8],
    ) -> Result<(), ArbError> {
        self.check_split(assets, percentages)?;

        let supply = ledger.total_supply(self.address);
        if amount.is_zero() || supply.is_zero() {
            return Err(ArbError::NothingToUnwrap(self.address));
        }

        let fee = amount
            .checked_mul(U256::from(self.debond_fee_bps))
            .map(|scaled| scaled / U256::from(BPS))
            .ok_or(ArbError::Overflow("debond fee"))?;
        let net = amount
            .checked_sub(fee)
            .ok_or(ArbError::Overflow("debond fee"))?;

        ledger.burn(self.address, caller, amount)?;

        for (asset, pct) in assets.iter().zip(percentages) {
            if *pct == 0 {
                continue;
            }
            let reserve = ledger.balance_of(*asset, self.address);
            let out = reserve * net * U256::from(*pct) / (supply * U256::from(100));
            if !out.is_zero() {
                ledger.transfer(*asset, self.address, caller, out)?;
            }
            debug!("Debond leg {}: {}% -> {}", asset, pct, out);
        }
        Ok(())
    }
}
