// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Lender side of a flash loan: credit, call back, enforce repayment.

use super::callback::{CallbackInterface, FlashBorrower, LoanState, LoanTicket};
use super::fee::{compute_fee, repayment_due};
use crate::error::ArbError;
use crate::ledger::{balance_delta, Ledger};
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Liquidity request for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRequest {
    pub asset: Address,
    pub principal: U256,
    pub borrower: Address,
    /// Opaque data handed to the callback.
    pub context: Bytes,
}

impl LoanRequest {
    pub fn new(asset: Address, principal: U256, borrower: Address) -> Self {
        Self {
            asset,
            principal,
            borrower,
            context: Bytes::new(),
        }
    }

    pub fn with_context(mut self, context: Bytes) -> Self {
        self.context = context;
        self
    }
}

/// Where lent funds come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LenderKind {
    /// Lends out of its own reserves (Aave style).
    Pool,
    /// Mints the principal and burns it on repayment; keeps the fee.
    Mint,
}

/// Result of a loan that was repaid in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub repaid: U256,
    pub fee: U256,
}

/// A flash lender as the protocol sees it.
#[derive(Debug, Clone)]
pub struct FlashLender {
    address: Address,
    interface: CallbackInterface,
    kind: LenderKind,
    state: LoanState,
}

impl FlashLender {
    pub fn new(address: Address, interface: CallbackInterface, kind: LenderKind) -> Self {
        Self {
            address,
            interface,
            kind,
            state: LoanState::Idle,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn interface(&self) -> CallbackInterface {
        self.interface
    }

    /// State the most recent loan ended in.
    pub fn state(&self) -> LoanState {
        self.state
    }

    /// Fail fast when the borrower does not expose the entry point this
    /// lender calls.
    pub fn check_interface(&self, borrower: &dyn FlashBorrower) -> Result<(), ArbError> {
        if borrower.interface() != self.interface {
            return Err(ArbError::InterfaceMismatch {
                expected: self.interface.to_string(),
                found: borrower.interface().to_string(),
            });
        }
        Ok(())
    }

    /// Lend `request.principal`, invoke the borrower once, and verify the
    /// lender got back at least principal plus fee.
    ///
    /// Callers run this inside an atomic unit; on error the lender's state is
    /// `Reverted` and the unit must be discarded.
    pub fn flash_loan(
        &mut self,
        ledger: &mut dyn Ledger,
        borrower: &mut dyn FlashBorrower,
        request: &LoanRequest,
    ) -> Result<Settlement, ArbError> {
        self.state = LoanState::Idle;
        let result = self.lend(ledger, borrower, request);
        if let Err(e) = &result {
            warn!("Loan of {} {} failed: {}", request.principal, request.asset, e);
            if !self.state.is_terminal() {
                self.state = LoanState::Reverted;
            }
        }
        result
    }

    fn advance(&mut self, next: LoanState) -> Result<(), ArbError> {
        self.state = self.state.advance(next)?;
        Ok(())
    }

    fn lend(
        &mut self,
        ledger: &mut dyn Ledger,
        borrower: &mut dyn FlashBorrower,
        request: &LoanRequest,
    ) -> Result<Settlement, ArbError> {
        self.check_interface(borrower)?;
        if request.borrower != borrower.address() {
            return Err(ArbError::Unauthorized {
                caller: borrower.address(),
                owner: request.borrower,
            });
        }
        if request.principal.is_zero() {
            return Err(ArbError::VenueReverted("flash loan of zero".to_string()));
        }

        let fee = compute_fee(request.principal);
        let due = repayment_due(request.principal)?;
        self.advance(LoanState::AwaitingCallback)?;

        match self.kind {
            LenderKind::Pool => {
                let available = ledger.balance_of(request.asset, self.address);
                if available < request.principal {
                    return Err(ArbError::InsufficientBalance {
                        asset: request.asset,
                        required: request.principal,
                        available,
                    });
                }
                ledger.transfer(
                    request.asset,
                    self.address,
                    borrower.address(),
                    request.principal,
                )?;
            }
            LenderKind::Mint => {
                ledger.mint(request.asset, borrower.address(), request.principal)?;
            }
        }
        debug!("Lent {} of {} to {}", request.principal, request.asset, borrower.address());

        let before = ledger.balance_of(request.asset, self.address);
        self.advance(LoanState::InCallback)?;
        let ticket = LoanTicket::issue(
            self.address,
            borrower.address(),
            request.asset,
            request.principal,
            request.context.clone(),
        );
        borrower.on_liquidity_received(ledger, ticket)?;

        let repaid = balance_delta(ledger, request.asset, self.address, before);
        if repaid < due {
            self.advance(LoanState::RepaidShort)?;
            self.advance(LoanState::Reverted)?;
            return Err(ArbError::RepaymentShortfall {
                required: due,
                repaid,
            });
        }
        self.advance(LoanState::RepaidOk)?;

        if self.kind == LenderKind::Mint {
            ledger.burn(request.asset, self.address, request.principal)?;
        }
        self.advance(LoanState::Settled)?;

        info!("✅ Loan repaid: {} (fee {})", repaid, fee);
        Ok(Settlement { repaid, fee })
    }
}
