// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Borrower callback contract and per-loan state machine.

use crate::error::ArbError;
use crate::ledger::Ledger;
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Callback entry points found on deployed lenders.
///
/// A lender calls exactly one of them; a borrower built for another one
/// reverts the first time it is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallbackInterface {
    /// Canonical interface.
    OnLiquidityReceived,
    /// Flash-mint lenders.
    ReceiveFlashMint,
    /// Older generic lenders.
    Callback,
}

impl CallbackInterface {
    pub const ALL: [CallbackInterface; 3] = [
        CallbackInterface::OnLiquidityReceived,
        CallbackInterface::ReceiveFlashMint,
        CallbackInterface::Callback,
    ];

    pub fn function_name(&self) -> &'static str {
        match self {
            Self::OnLiquidityReceived => "onLiquidityReceived",
            Self::ReceiveFlashMint => "receiveFlashMint",
            Self::Callback => "callback",
        }
    }
}

impl fmt::Display for CallbackInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

impl FromStr for CallbackInterface {
    type Err = ArbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.function_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ArbError::Config(format!("Unknown callback interface {s}")))
    }
}

/// Single-use capability for one loan, moved into the borrower's callback.
///
/// Only the lender can mint one, and it cannot be cloned, so a callback runs
/// at most once per loan.
#[derive(Debug)]
pub struct LoanTicket {
    lender: Address,
    borrower: Address,
    asset: Address,
    amount: U256,
    context: Bytes,
}

impl LoanTicket {
    pub(crate) fn issue(
        lender: Address,
        borrower: Address,
        asset: Address,
        amount: U256,
        context: Bytes,
    ) -> Self {
        Self {
            lender,
            borrower,
            asset,
            amount,
            context,
        }
    }

    pub fn lender(&self) -> Address {
        self.lender
    }

    pub fn borrower(&self) -> Address {
        self.borrower
    }

    pub fn asset(&self) -> Address {
        self.asset
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }

    /// Data the requester attached to the loan.
    pub fn context(&self) -> &Bytes {
        &self.context
    }
}

/// A contract able to receive flash liquidity.
pub trait FlashBorrower {
    fn address(&self) -> Address;

    /// Entry point this borrower exposes.
    fn interface(&self) -> CallbackInterface;

    /// Invoked by the lender with `ticket.amount()` already credited. Must
    /// hand back amount plus fee before returning.
    fn on_liquidity_received(
        &mut self,
        ledger: &mut dyn Ledger,
        ticket: LoanTicket,
    ) -> Result<(), ArbError>;
}

/// Lifecycle of a single loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanState {
    Idle,
    AwaitingCallback,
    InCallback,
    RepaidOk,
    RepaidShort,
    Settled,
    Reverted,
}

impl LoanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Reverted)
    }

    /// Move to `next`, rejecting anything the lifecycle does not allow.
    pub fn advance(self, next: LoanState) -> Result<LoanState, ArbError> {
        use LoanState::*;
        let legal = matches!(
            (self, next),
            (Idle, AwaitingCallback)
                | (AwaitingCallback, InCallback)
                | (InCallback, RepaidOk)
                | (InCallback, RepaidShort)
                | (RepaidOk, Settled)
                | (RepaidShort, Reverted)
        ) || (next == Reverted && !self.is_terminal());

        if legal {
            Ok(next)
        } else {
            Err(ArbError::InvalidTransition {
                from: format!("{self:?}"),
                to: format!("{next:?}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let s = LoanState::Idle
            .advance(LoanState::AwaitingCallback)
            .and_then(|s| s.advance(LoanState::InCallback))
            .and_then(|s| s.advance(LoanState::RepaidOk))
            .and_then(|s| s.advance(LoanState::Settled))
            .unwrap();
        assert!(s.is_terminal());
    }

    #[test]
    fn short_repayment_only_reverts() {
        let short = LoanState::RepaidShort;
        assert!(short.advance(LoanState::Settled).is_err());
        assert_eq!(short.advance(LoanState::Reverted), Ok(LoanState::Reverted));
    }

    #[test]
    fn terminal_states_are_final() {
        assert!(LoanState::Settled.advance(LoanState::Reverted).is_err());
        assert!(LoanState::Reverted.advance(LoanState::Idle).is_err());
        assert!(LoanState::Idle.advance(LoanState::InCallback).is_err());
    }

    #[test]
    fn interface_names_parse() {
        assert_eq!(
            "receiveFlashMint".parse::<CallbackInterface>().unwrap(),
            CallbackInterface::ReceiveFlashMint
        );
        assert_eq!(
            "CALLBACK".parse::<CallbackInterface>().unwrap(),
            CallbackInterface::Callback
        );
        assert!("executeOperation".parse::<CallbackInterface>().is_err());
    }
}
