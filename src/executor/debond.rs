// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Unwrap (debond) adapter for wrapped multi-asset indexes.

use crate::error::ArbError;
use crate::ledger::{balance_delta, Ledger};
use crate::venues::WrappedAsset;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// One leg of a debond split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionLeg {
    pub asset: Address,
    pub percentage: u8,
}

/// Percentage split over underlying assets, summing to exactly 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DistributionLeg>", into = "Vec<DistributionLeg>")]
pub struct Distribution(Vec<DistributionLeg>);

impl Distribution {
    pub fn new(legs: Vec<DistributionLeg>) -> Result<Self, ArbError> {
        if legs.is_empty() {
            return Err(ArbError::InvalidDistribution("no legs".to_string()));
        }
        let total: u32 = legs.iter().map(|l| l.percentage as u32).sum();
        if total != 100 {
            return Err(ArbError::InvalidDistribution(format!(
                "percentages sum to {total}, expected 100"
            )));
        }
        for (i, leg) in legs.iter().enumerate() {
            if legs[..i].iter().any(|l| l.asset == leg.asset) {
                return Err(ArbError::InvalidDistribution(format!(
                    "{} listed twice",
                    leg.asset
                )));
            }
        }
        Ok(Self(legs))
    }

    /// Everything to a single underlying asset.
    pub fn single(asset: Address) -> Self {
        Self(vec![DistributionLeg {
            asset,
            percentage: 100,
        }])
    }

    pub fn assets(&self) -> Vec<Address> {
        self.0.iter().map(|l| l.asset).collect()
    }

    pub fn percentages(&self) -> Vec<u8> {
        self.0.iter().map(|l| l.percentage).collect()
    }

    pub fn legs(&self) -> &[DistributionLeg] {
        &self.0
    }
}

impl TryFrom<Vec<DistributionLeg>> for Distribution {
    type Error = ArbError;

    fn try_from(legs: Vec<DistributionLeg>) -> Result<Self, Self::Error> {
        Self::new(legs)
    }
}

impl From<Distribution> for Vec<DistributionLeg> {
    fn from(d: Distribution) -> Self {
        d.0
    }
}

/// Stateless adapter in front of one wrapped index.
#[derive(Clone)]
pub struct DebondAdapter {
    index: Arc<dyn WrappedAsset>,
    reference_amount: U256,
}

impl DebondAdapter {
    pub fn new(index: Arc<dyn WrappedAsset>, reference_amount: U256) -> Self {
        Self {
            index,
            reference_amount,
        }
    }

    pub fn index(&self) -> Address {
        self.index.address()
    }

    /// Amount to unwrap under the min-cap policy: the smaller of the
    /// reference amount and the full balance.
    pub fn capped_amount(&self, balance: U256) -> U256 {
        self.reference_amount.min(balance)
    }

    /// Unwrap `amount` and return what each underlying asset actually
    /// credited to `caller`.
    pub fn debond(
        &self,
        ledger: &mut dyn Ledger,
        caller: Address,
        amount: U256,
        distribution: &Distribution,
    ) -> Result<BTreeMap<Address, U256>, ArbError> {
        let wrapped = self.index.address();
        let balance = ledger.balance_of(wrapped, caller);
        if balance.is_zero() {
            return Err(ArbError::NothingToUnwrap(wrapped));
        }
        if balance < amount {
            return Err(ArbError::InsufficientBalance {
                asset: wrapped,
                required: amount,
                available: balance,
            });
        }

        let assets = distribution.assets();
        let before: Vec<U256> = assets
            .iter()
            .map(|a| ledger.balance_of(*a, caller))
            .collect();

        self.index
            .debond(ledger, caller, amount, &assets, &distribution.percentages())?;

        let view: &dyn Ledger = &*ledger;
        let received: BTreeMap<Address, U256> = assets
            .iter()
            .zip(before)
            .map(|(asset, b)| (*asset, balance_delta(view, *asset, caller, b)))
            .collect();

        info!("📦 Debonded {} of {} -> {:?}", amount, wrapped, received);
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AssetSpec, MemoryLedger};
    use crate::venues::WeightedIndex;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    const INDEX: u8 = 0xB0;
    const HOLDER: u8 = 0x07;

    fn setup(debond_fee_bps: u16, underlying_fee_bps: u16) -> (MemoryLedger, DebondAdapter) {
        let mut ledger = MemoryLedger::new(0);
        if underlying_fee_bps > 0 {
            ledger
                .register(AssetSpec::fee_on_transfer(addr(1), "TAX", underlying_fee_bps).unwrap())
                .unwrap();
        }
        ledger.mint(addr(INDEX), addr(HOLDER), U256::from(10_000)).unwrap();
        ledger.mint(addr(1), addr(INDEX), U256::from(10_000)).unwrap();
        let index = WeightedIndex::new(addr(INDEX), vec![addr(1)], debond_fee_bps).unwrap();
        (ledger, DebondAdapter::new(Arc::new(index), U256::from(5_000)))
    }

    #[test]
    fn single_leg_round_trip_loses_only_unwrap_fee() {
        let (mut ledger, adapter) = setup(0, 0);
        let out = adapter
            .debond(&mut ledger, addr(HOLDER), U256::from(4_000), &Distribution::single(addr(1)))
            .unwrap();
        assert_eq!(out[&addr(1)], U256::from(4_000));

        let (mut ledger, adapter) = setup(100, 0);
        let out = adapter
            .debond(&mut ledger, addr(HOLDER), U256::from(4_000), &Distribution::single(addr(1)))
            .unwrap();
        assert_eq!(out[&addr(1)], U256::from(3_960));
    }

    #[test]
    fn fee_on_transfer_underlying_is_measured() {
        let (mut ledger, adapter) = setup(0, 100);
        let out = adapter
            .debond(&mut ledger, addr(HOLDER), U256::from(4_000), &Distribution::single(addr(1)))
            .unwrap();
        assert_eq!(out[&addr(1)], U256::from(3_960));
        assert!(out[&addr(1)] < U256::from(4_000));
    }

    #[test]
    fn zero_balance_is_nothing_to_unwrap() {
        let (mut ledger, adapter) = setup(0, 0);
        let err = adapter
            .debond(&mut ledger, addr(0x99), U256::from(1), &Distribution::single(addr(1)))
            .unwrap_err();
        assert_eq!(err, ArbError::NothingToUnwrap(addr(INDEX)));
    }

    #[test]
    fn min_cap_policy() {
        let (_, adapter) = setup(0, 0);
        assert_eq!(adapter.capped_amount(U256::from(80_000)), U256::from(5_000));
        assert_eq!(adapter.capped_amount(U256::from(1_200)), U256::from(1_200));
    }

    #[test]
    fn malformed_distributions_are_rejected() {
        let leg = |b: u8, p: u8| DistributionLeg {
            asset: addr(b),
            percentage: p,
        };
        assert!(Distribution::new(vec![]).is_err());
        assert!(Distribution::new(vec![leg(1, 60), leg(2, 30)]).is_err());
        assert!(Distribution::new(vec![leg(1, 50), leg(1, 50)]).is_err());
        assert!(Distribution::new(vec![leg(1, 100), leg(2, 0)]).is_ok());
    }
}
