// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Uniswap V2 style router over ledger balances.
//!
//! Pair reserves are the pair address's ledger balances, so a reverted unit
//! also restores every pool it touched.

use crate::error::ArbError;
use crate::flash::{check_bps, BPS};
use crate::ledger::{balance_delta, Ledger};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Router call shapes, as exposed by V2 routers on chain.
pub trait SwapRouter {
    fn address(&self) -> Address;

    fn pair_for(&self, token_a: Address, token_b: Address) -> Option<Address>;

    /// Standard shape: output is computed from the nominal `amount_in`.
    fn swap_exact_tokens_for_tokens(
        &self,
        ledger: &mut dyn Ledger,
        caller: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: u64,
    ) -> Result<Vec<U256>, ArbError>;

    /// Fee-on-transfer tolerant shape: each hop uses what the pair actually
    /// received, and the minimum is checked against the recipient's balance
    /// delta.
    fn swap_exact_tokens_for_tokens_supporting_fee_on_transfer_tokens(
        &self,
        ledger: &mut dyn Ledger,
        caller: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: u64,
    ) -> Result<(), ArbError>;
}

/// One pool registered with a router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSpec {
    pub token_a: Address,
    pub token_b: Address,
    pub pair: Address,
}

/// Constant-product router with a flat swap fee.
#[derive(Debug, Clone)]
pub struct ConstantProductRouter {
    address: Address,
    fee_bps: u16,
    pairs: HashMap<(Address, Address), Address>,
}

/// 0.3%, the V2 default.
pub const DEFAULT_SWAP_FEE_BPS: u16 = 30;

fn pair_key(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl ConstantProductRouter {
    pub fn new(address: Address, fee_bps: u16) -> Result<Self, ArbError> {
        Ok(Self {
            address,
            fee_bps: check_bps("fee_bps", fee_bps)?,
            pairs: HashMap::new(),
        })
    }

    pub fn with_pairs(
        address: Address,
        fee_bps: u16,
        pairs: &[PairSpec],
    ) -> Result<Self, ArbError> {
        let mut router = Self::new(address, fee_bps)?;
        for p in pairs {
            router.add_pair(p.token_a, p.token_b, p.pair);
        }
        Ok(router)
    }

    pub fn add_pair(&mut self, token_a: Address, token_b: Address, pair: Address) {
        self.pairs.insert(pair_key(token_a, token_b), pair);
    }

    /// Output for `amount_in` against the given reserves.
    pub fn get_amount_out(
        &self,
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> Result<U256, ArbError> {
        if amount_in.is_zero() {
            return Err(ArbError::VenueReverted("INSUFFICIENT_INPUT_AMOUNT".to_string()));
        }
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(ArbError::VenueReverted("INSUFFICIENT_LIQUIDITY".to_string()));
        }
        let kept = BPS
            .checked_sub(self.fee_bps)
            .ok_or(ArbError::Overflow("swap fee"))?;
        let in_with_fee = amount_in
            .checked_mul(U256::from(kept))
            .ok_or(ArbError::Overflow("swap input"))?;
        let numerator = in_with_fee
            .checked_mul(reserve_out)
            .ok_or(ArbError::Overflow("swap output"))?;
        let denominator = reserve_in
            .checked_mul(U256::from(BPS))
            .and_then(|r| r.checked_add(in_with_fee))
            .ok_or(ArbError::Overflow("swap reserves"))?;
        Ok(numerator / denominator)
    }

    /// Quote every hop of `path` at current reserves.
    pub fn get_amounts_out(
        &self,
        ledger: &dyn Ledger,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, ArbError> {
        let pairs = self.resolve(path)?;
        let mut amounts = Vec::with_capacity(path.len());
        amounts.push(amount_in);
        for (i, pair) in pairs.iter().enumerate() {
            let reserve_in = ledger.balance_of(path[i], *pair);
            let reserve_out = ledger.balance_of(path[i + 1], *pair);
            let out = self.get_amount_out(amounts[i], reserve_in, reserve_out)?;
            amounts.push(out);
        }
        Ok(amounts)
    }

    fn resolve(&self, path: &[Address]) -> Result<Vec<Address>, ArbError> {
        if path.len() < 2 {
            return Err(ArbError::InvalidPath(format!(
                "path needs at least 2 assets, got {}",
                path.len()
            )));
        }
        path.windows(2)
            .map(|hop| {
                self.pair_for(hop[0], hop[1]).ok_or_else(|| {
                    ArbError::InvalidPath(format!("no pair for {} -> {}", hop[0], hop[1]))
                })
            })
            .collect()
    }

    fn ensure(&self, ledger: &dyn Ledger, deadline: u64) -> Result<(), ArbError> {
        let now = ledger.now();
        if deadline < now {
            return Err(ArbError::DeadlineExceeded { deadline, now });
        }
        Ok(())
    }
}

impl SwapRouter for ConstantProductRouter {
    fn address(&self) -> Address {
        self.address
    }

    fn pair_for(&self, token_a: Address, token_b: Address) -> Option<Address> {
        self.pairs.get(&pair_key(token_a, token_b)).copied()
    }

    fn swap_exact_tokens_for_tokens(
        &self,
        ledger: &mut dyn Ledger,
        caller: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: u64,
    ) -> Result<Vec<U256>, ArbError> {
        self.ensure(ledger, deadline)?;
        let pairs = self.resolve(path)?;
        let amounts = self.get_amounts_out(ledger, amount_in, path)?;

        let quoted = amounts[amounts.len() - 1];
        if quoted < amount_out_min {
            return Err(ArbError::SlippageExceeded {
                minimum: amount_out_min,
                received: quoted,
            });
        }

        let before = ledger.balance_of(path[0], pairs[0]);
        ledger.transfer_from(path[0], self.address, caller, pairs[0], amount_in)?;
        if balance_delta(ledger, path[0], pairs[0], before) < amount_in {
            return Err(ArbError::VenueReverted("UniswapV2: K".to_string()));
        }

        for (i, pair) in pairs.iter().enumerate() {
            let token_out = path[i + 1];
            let last_hop = i + 1 == pairs.len();
            let dest = if last_hop { to } else { pairs[i + 1] };
            let before = ledger.balance_of(token_out, dest);
            ledger.transfer(token_out, *pair, dest, amounts[i + 1])?;
            if !last_hop && balance_delta(ledger, token_out, dest, before) < amounts[i + 1] {
                return Err(ArbError::VenueReverted("UniswapV2: K".to_string()));
            }
        }

        debug!("Router {} swapped {} -> {}", self.address, amount_in, quoted);
        Ok(amounts)
    }

    fn swap_exact_tokens_for_tokens_supporting_fee_on_transfer_tokens(
        &self,
        ledger: &mut dyn Ledger,
        caller: Address,
        amount_in: U256,
        amount_out_min: U256,
        path: &[Address],
        to: Address,
        deadline: u64,
    ) -> Result<(), ArbError> {
        self.ensure(ledger, deadline)?;
        let pairs = self.resolve(path)?;
        let token_final = path[path.len() - 1];
        let to_before = ledger.balance_of(token_final, to);

        let before = ledger.balance_of(path[0], pairs[0]);
        ledger.transfer_from(path[0], self.address, caller, pairs[0], amount_in)?;
        let mut received = balance_delta(ledger, path[0], pairs[0], before);

        for (i, pair) in pairs.iter().enumerate() {
            let reserve_in = ledger.balance_of(path[i], *pair) - received;
            let reserve_out = ledger.balance_of(path[i + 1], *pair);
            let out = self.get_amount_out(received, reserve_in, reserve_out)?;

            let dest = if i + 1 == pairs.len() { to } else { pairs[i + 1] };
            let before = ledger.balance_of(path[i + 1], dest);
            ledger.transfer(path[i + 1], *pair, dest, out)?;
            received = balance_delta(ledger, path[i + 1], dest, before);
        }

        let delivered = balance_delta(ledger, token_final, to, to_before);
        if delivered < amount_out_min {
            return Err(ArbError::SlippageExceeded {
                minimum: amount_out_min,
                received: delivered,
            });
        }
        debug!(
            "Router {} swapped {} -> {} (fee-on-transfer shape)",
            self.address, amount_in, delivered
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AssetSpec, MemoryLedger};

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn pool() -> (MemoryLedger, ConstantProductRouter) {
        let mut ledger = MemoryLedger::new(1_000);
        let mut router = ConstantProductRouter::new(addr(0xAA), DEFAULT_SWAP_FEE_BPS).unwrap();
        router.add_pair(addr(1), addr(2), addr(0x12));
        ledger.mint(addr(1), addr(0x12), U256::from(1_000_000)).unwrap();
        ledger.mint(addr(2), addr(0x12), U256::from(1_000_000)).unwrap();
        ledger.mint(addr(1), addr(7), U256::from(10_000)).unwrap();
        ledger
            .approve(addr(1), addr(7), addr(0xAA), U256::MAX)
            .unwrap();
        (ledger, router)
    }

    #[test]
    fn amount_out_matches_v2_formula() {
        let router = ConstantProductRouter::new(addr(0xAA), 30).unwrap();
        // 1000 * 9970 * 5000 / (5000 * 10000 + 1000 * 9970)
        let out = router
            .get_amount_out(U256::from(1000), U256::from(5000), U256::from(5000))
            .unwrap();
        assert_eq!(out, U256::from(831));
    }

    #[test]
    fn fee_above_whole_is_rejected() {
        assert!(matches!(
            ConstantProductRouter::new(addr(0xAA), 20_000),
            Err(ArbError::Config(_))
        ));

        // A 100% fee leaves nothing to trade with.
        let router = ConstantProductRouter::new(addr(0xAA), BPS).unwrap();
        let out = router
            .get_amount_out(U256::from(10), U256::from(100), U256::from(100))
            .unwrap();
        assert_eq!(out, U256::ZERO);
    }

    #[test]
    fn standard_swap_moves_quoted_amount() {
        let (mut ledger, router) = pool();
        let quoted = router
            .get_amounts_out(&ledger, U256::from(10_000), &[addr(1), addr(2)])
            .unwrap();

        let amounts = router
            .swap_exact_tokens_for_tokens(
                &mut ledger,
                addr(7),
                U256::from(10_000),
                U256::ZERO,
                &[addr(1), addr(2)],
                addr(7),
                2_000,
            )
            .unwrap();

        assert_eq!(amounts, quoted);
        assert_eq!(ledger.balance_of(addr(2), addr(7)), quoted[1]);
        assert_eq!(ledger.balance_of(addr(1), addr(7)), U256::ZERO);
    }

    #[test]
    fn standard_swap_rejects_fee_on_transfer_input() {
        let (mut ledger, router) = pool();
        ledger
            .register(AssetSpec::fee_on_transfer(addr(1), "TAX", 100).unwrap())
            .unwrap();

        let err = router
            .swap_exact_tokens_for_tokens(
                &mut ledger,
                addr(7),
                U256::from(10_000),
                U256::ZERO,
                &[addr(1), addr(2)],
                addr(7),
                2_000,
            )
            .unwrap_err();
        assert_eq!(err, ArbError::VenueReverted("UniswapV2: K".to_string()));
    }

    #[test]
    fn missing_pair_is_invalid_path() {
        let (mut ledger, router) = pool();
        let err = router
            .swap_exact_tokens_for_tokens_supporting_fee_on_transfer_tokens(
                &mut ledger,
                addr(7),
                U256::from(10),
                U256::ZERO,
                &[addr(1), addr(3)],
                addr(7),
                2_000,
            )
            .unwrap_err();
        assert!(matches!(err, ArbError::InvalidPath(_)));
    }
}
