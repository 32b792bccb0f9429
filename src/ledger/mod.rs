// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Narrow ledger interface the protocol runs against.
//!
//! The ledger owns balances, allowances and supplies, and provides atomic
//! units through checkpoints. Nothing in the protocol reads then writes shared
//! balances outside such a unit.

pub mod memory;

pub use memory::{AssetSpec, MemoryLedger};

use crate::error::ArbError;
use alloy::primitives::{Address, U256};

/// Identifier of an open checkpoint.
pub type CheckpointId = usize;

/// Balance and transfer capability of a ledger with atomic units.
pub trait Ledger {
    /// Current block timestamp in seconds.
    fn now(&self) -> u64;

    fn balance_of(&self, asset: Address, holder: Address) -> U256;

    fn total_supply(&self, asset: Address) -> U256;

    fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256;

    fn approve(
        &mut self,
        asset: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ArbError>;

    /// Move `amount` from `from` to `to`. Fee-on-transfer assets deliver less
    /// than `amount`; callers measure what arrived by balance delta.
    fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ArbError>;

    /// Like [`Ledger::transfer`], spending `spender`'s allowance over `from`.
    fn transfer_from(
        &mut self,
        asset: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ArbError>;

    fn mint(&mut self, asset: Address, to: Address, amount: U256) -> Result<(), ArbError>;

    fn burn(&mut self, asset: Address, from: Address, amount: U256) -> Result<(), ArbError>;

    /// Open an atomic unit.
    fn checkpoint(&mut self) -> CheckpointId;

    /// Discard every mutation since `id` was opened.
    fn revert_to(&mut self, id: CheckpointId);

    /// Keep every mutation since `id` was opened.
    fn commit(&mut self, id: CheckpointId);
}

/// Run `f` as one atomic unit: all of its mutations take effect, or none do.
pub fn atomically<L, T, F>(ledger: &mut L, f: F) -> Result<T, ArbError>
where
    L: Ledger + ?Sized,
    F: FnOnce(&mut L) -> Result<T, ArbError>,
{
    let id = ledger.checkpoint();
    match f(ledger) {
        Ok(value) => {
            ledger.commit(id);
            Ok(value)
        }
        Err(e) => {
            ledger.revert_to(id);
            Err(e)
        }
    }
}

/// Amount `holder` gained of `asset` since `before` was sampled.
pub fn balance_delta(
    ledger: &dyn Ledger,
    asset: Address,
    holder: Address,
    before: U256,
) -> U256 {
    ledger.balance_of(asset, holder).saturating_sub(before)
}
