// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arbitrage contract: receives the loan, runs the plan's steps, repays.

use super::plan::{decode_steps, Step, StepAmount};
use crate::error::ArbError;
use crate::executor::{DebondAdapter, SwapAdapter};
use crate::flash::{repayment_due, CallbackInterface, FlashBorrower, LoanTicket};
use crate::ledger::Ledger;
use crate::recovery::Owned;
use alloy::primitives::{Address, U256};
use std::collections::HashMap;
use tracing::{debug, info};

/// Borrower contract driven by a list of [`Step`]s.
pub struct ArbitrageBorrower {
    address: Address,
    owner: Address,
    interface: CallbackInterface,
    steps: Vec<Step>,
    routers: HashMap<Address, SwapAdapter>,
    indexes: HashMap<Address, DebondAdapter>,
    /// Absolute swap deadline. When unset each swap uses its adapter's bound.
    deadline: Option<u64>,
}

impl ArbitrageBorrower {
    pub fn new(address: Address, owner: Address, interface: CallbackInterface) -> Self {
        Self {
            address,
            owner,
            interface,
            steps: Vec::new(),
            routers: HashMap::new(),
            indexes: HashMap::new(),
            deadline: None,
        }
    }

    pub fn with_router(mut self, adapter: SwapAdapter) -> Self {
        self.routers.insert(adapter.router(), adapter);
        self
    }

    pub fn with_index(mut self, adapter: DebondAdapter) -> Self {
        self.indexes.insert(adapter.index(), adapter);
        self
    }

    /// Steps executed by a callback whose loan carries no steps of its own.
    pub fn load_steps(&mut self, steps: Vec<Step>) {
        self.steps = steps;
    }

    pub fn set_deadline(&mut self, deadline: Option<u64>) {
        self.deadline = deadline;
    }

    fn router(&self, address: Address) -> Result<&SwapAdapter, ArbError> {
        self.routers
            .get(&address)
            .ok_or_else(|| ArbError::VenueReverted(format!("unknown router {address}")))
    }

    fn index(&self, address: Address) -> Result<&DebondAdapter, ArbError> {
        self.indexes
            .get(&address)
            .ok_or_else(|| ArbError::VenueReverted(format!("unknown index {address}")))
    }

    fn run_step(&self, ledger: &mut dyn Ledger, step: &Step) -> Result<(), ArbError> {
        match step {
            Step::Swap {
                router,
                path,
                amount,
                min_out,
            } => {
                let adapter = self.router(*router)?;
                let balance = ledger.balance_of(path.input(), self.address);
                let amount_in = amount.resolve(balance, None);
                let deadline = self
                    .deadline
                    .unwrap_or_else(|| adapter.deadline_from(ledger.now()));
                adapter.swap(
                    ledger,
                    self.address,
                    path,
                    amount_in,
                    *min_out,
                    self.address,
                    deadline,
                )?;
            }
            Step::Debond {
                index,
                distribution,
                amount,
            } => {
                let adapter = self.index(*index)?;
                let balance = ledger.balance_of(*index, self.address);
                let amount_in = match amount {
                    StepAmount::Capped => adapter.capped_amount(balance),
                    other => other.resolve(balance, None),
                };
                adapter.debond(ledger, self.address, amount_in, distribution)?;
            }
        }
        Ok(())
    }
}

impl FlashBorrower for ArbitrageBorrower {
    fn address(&self) -> Address {
        self.address
    }

    fn interface(&self) -> CallbackInterface {
        self.interface
    }

    fn on_liquidity_received(
        &mut self,
        ledger: &mut dyn Ledger,
        ticket: LoanTicket,
    ) -> Result<(), ArbError> {
        if ticket.borrower() != self.address {
            return Err(ArbError::Unauthorized {
                caller: ticket.borrower(),
                owner: self.address,
            });
        }
        debug!(
            "Callback {} for {} of {}",
            self.interface,
            ticket.amount(),
            ticket.asset()
        );

        let steps = if ticket.context().is_empty() {
            self.steps.clone()
        } else {
            decode_steps(ticket.context())?
        };
        for (i, step) in steps.iter().enumerate() {
            debug!("Step {}/{}", i + 1, steps.len());
            self.run_step(ledger, step)?;
        }

        let owed = repayment_due(ticket.amount())?;
        let balance = ledger.balance_of(ticket.asset(), self.address);
        if balance < owed {
            return Err(ArbError::RepaymentShortfall {
                required: owed,
                repaid: balance,
            });
        }
        ledger.transfer(ticket.asset(), self.address, ticket.lender(), owed)?;

        let kept = balance - owed;
        info!("💰 Repaid {} to {}, kept {}", owed, ticket.lender(), kept);
        Ok(())
    }
}

impl Owned for ArbitrageBorrower {
    fn contract_address(&self) -> Address {
        self.address
    }

    fn owner(&self) -> Address {
        self.owner
    }
}

/// Profit the borrower keeps in `asset` compared to `before`.
pub fn retained(ledger: &dyn Ledger, borrower: Address, asset: Address, before: U256) -> U256 {
    ledger.balance_of(asset, borrower).saturating_sub(before)
}
