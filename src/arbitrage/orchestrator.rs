// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Runs one borrow-convert-repay cycle as a single atomic unit.

use crate::error::ArbError;
use crate::flash::{FlashBorrower, FlashLender, LoanRequest};
use crate::ledger::{atomically, Ledger};
use crate::network::NetworkProfile;
use alloy::primitives::U256;
use std::fmt;
use tracing::{error, info, warn};

/// Final result of a cycle. There is no partial outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Settled { repaid: U256, fee: U256 },
    Reverted { reason: ArbError },
}

impl ExecutionOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, ExecutionOutcome::Settled { .. })
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutionOutcome::Settled { .. } => 0,
            ExecutionOutcome::Reverted { reason } => reason.exit_code(),
        }
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOutcome::Settled { repaid, fee } => {
                write!(f, "settled: repaid {repaid} (fee {fee})")
            }
            ExecutionOutcome::Reverted { reason } => write!(f, "reverted: {reason}"),
        }
    }
}

/// Drives cycles against one lender.
pub struct Orchestrator {
    lender: FlashLender,
    cycles: u64,
}

impl Orchestrator {
    pub fn new(lender: FlashLender) -> Self {
        Self { lender, cycles: 0 }
    }

    pub fn lender(&self) -> &FlashLender {
        &self.lender
    }

    /// Number of cycles attempted so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Request the loan, let the borrower's callback convert and repay, and
    /// either commit every balance change or none of them.
    pub fn execute(
        &mut self,
        ledger: &mut dyn Ledger,
        profile: &NetworkProfile,
        borrower: &mut dyn FlashBorrower,
        request: LoanRequest,
    ) -> ExecutionOutcome {
        self.cycles += 1;
        info!(
            "⚡ Cycle #{} on {}: borrowing {} of {} from {}",
            self.cycles,
            profile,
            request.principal,
            request.asset,
            self.lender.address()
        );

        let lender = &mut self.lender;
        match atomically(ledger, |unit| lender.flash_loan(unit, borrower, &request)) {
            Ok(settlement) => {
                info!("✅ Cycle #{} settled on {}", self.cycles, profile.name);
                ExecutionOutcome::Settled {
                    repaid: settlement.repaid,
                    fee: settlement.fee,
                }
            }
            Err(reason) => {
                if reason.is_ledger_revert() {
                    warn!("❌ Cycle #{} reverted: {}", self.cycles, reason);
                } else {
                    error!("❌ Cycle #{} failed: {}", self.cycles, reason);
                }
                ExecutionOutcome::Reverted { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::{CallbackInterface, LenderKind, LoanState, LoanTicket};
    use crate::ledger::{AssetSpec, MemoryLedger};
    use alloy::primitives::Address;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    const ASSET: u8 = 0x01;
    const LENDER: u8 = 0x11;
    const BORROWER: u8 = 0x22;

    /// Repays `repay` of the asset and parks `stray` on a third address so
    /// a rollback can be observed.
    struct Scripted {
        interface: CallbackInterface,
        repay: U256,
        stray: U256,
        calls: u32,
    }

    impl Scripted {
        fn new(repay: u64) -> Self {
            Self {
                interface: CallbackInterface::OnLiquidityReceived,
                repay: U256::from(repay),
                stray: U256::from(7),
                calls: 0,
            }
        }
    }

    impl FlashBorrower for Scripted {
        fn address(&self) -> Address {
            addr(BORROWER)
        }

        fn interface(&self) -> CallbackInterface {
            self.interface
        }

        fn on_liquidity_received(
            &mut self,
            ledger: &mut dyn Ledger,
            ticket: LoanTicket,
        ) -> Result<(), ArbError> {
            self.calls += 1;
            ledger.transfer(ticket.asset(), addr(BORROWER), addr(0x99), self.stray)?;
            ledger.transfer(ticket.asset(), addr(BORROWER), ticket.lender(), self.repay)
        }
    }

    fn setup(kind: LenderKind) -> (MemoryLedger, Orchestrator, NetworkProfile) {
        let mut ledger = MemoryLedger::new(1_700_000_000);
        if kind == LenderKind::Pool {
            ledger.mint(addr(ASSET), addr(LENDER), U256::from(1_000_000)).unwrap();
        }
        ledger.mint(addr(ASSET), addr(BORROWER), U256::from(1_000)).unwrap();
        let lender = FlashLender::new(addr(LENDER), CallbackInterface::OnLiquidityReceived, kind);
        let profile = NetworkProfile::builtin("sepolia").unwrap();
        (ledger, Orchestrator::new(lender), profile)
    }

    fn snapshot(ledger: &MemoryLedger) -> (Vec<U256>, U256) {
        (
            ledger.balances_of(&[addr(ASSET)], &[addr(LENDER), addr(BORROWER), addr(0x99)]),
            ledger.total_supply(addr(ASSET)),
        )
    }

    #[test]
    fn exact_repayment_settles() {
        let (mut ledger, mut orch, profile) = setup(LenderKind::Pool);
        let mut b = Scripted::new(100_100);

        let outcome = orch.execute(
            &mut ledger,
            &profile,
            &mut b,
            LoanRequest::new(addr(ASSET), U256::from(100_000), addr(BORROWER)),
        );

        assert_eq!(
            outcome,
            ExecutionOutcome::Settled {
                repaid: U256::from(100_100),
                fee: U256::from(100)
            }
        );
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(orch.lender().state(), LoanState::Settled);
        assert_eq!(b.calls, 1);
        assert_eq!(ledger.depth(), 0);
    }

    #[test]
    fn short_by_one_reverts_every_change() {
        let (mut ledger, mut orch, profile) = setup(LenderKind::Pool);
        let before = snapshot(&ledger);
        let mut b = Scripted::new(100_099);

        let outcome = orch.execute(
            &mut ledger,
            &profile,
            &mut b,
            LoanRequest::new(addr(ASSET), U256::from(100_000), addr(BORROWER)),
        );

        assert_eq!(
            outcome,
            ExecutionOutcome::Reverted {
                reason: ArbError::RepaymentShortfall {
                    required: U256::from(100_100),
                    repaid: U256::from(100_099)
                }
            }
        );
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(orch.lender().state(), LoanState::Reverted);
        assert_eq!(snapshot(&ledger), before);
        assert_eq!(ledger.depth(), 0);
    }

    #[test]
    fn minting_lender_burns_principal_and_keeps_fee() {
        let (mut ledger, mut orch, profile) = setup(LenderKind::Mint);
        let supply_before = ledger.total_supply(addr(ASSET));
        let mut b = Scripted::new(2_002);

        let outcome = orch.execute(
            &mut ledger,
            &profile,
            &mut b,
            LoanRequest::new(addr(ASSET), U256::from(2_000), addr(BORROWER)),
        );

        assert!(outcome.is_settled());
        assert_eq!(ledger.balance_of(addr(ASSET), addr(LENDER)), U256::from(2));
        assert_eq!(ledger.total_supply(addr(ASSET)), supply_before);
    }

    #[test]
    fn fee_on_transfer_loan_asset_needs_gross_up() {
        let (mut ledger, mut orch, profile) = setup(LenderKind::Pool);
        ledger
            .register(AssetSpec::fee_on_transfer(addr(ASSET), "TAX", 100).unwrap())
            .unwrap();
        ledger.mint(addr(ASSET), addr(BORROWER), U256::from(5_000)).unwrap();
        let before = snapshot(&ledger);
        // Sends exactly principal + fee, but 1% is withheld in transit.
        let mut b = Scripted::new(100_100);

        let outcome = orch.execute(
            &mut ledger,
            &profile,
            &mut b,
            LoanRequest::new(addr(ASSET), U256::from(100_000), addr(BORROWER)),
        );

        assert!(matches!(
            outcome,
            ExecutionOutcome::Reverted {
                reason: ArbError::RepaymentShortfall { .. }
            }
        ));
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn interface_mismatch_fails_before_funds_move() {
        let (mut ledger, mut orch, profile) = setup(LenderKind::Pool);
        let before = snapshot(&ledger);
        let mut b = Scripted::new(100_100);
        b.interface = CallbackInterface::ReceiveFlashMint;

        let outcome = orch.execute(
            &mut ledger,
            &profile,
            &mut b,
            LoanRequest::new(addr(ASSET), U256::from(100_000), addr(BORROWER)),
        );

        assert_eq!(
            outcome,
            ExecutionOutcome::Reverted {
                reason: ArbError::InterfaceMismatch {
                    expected: "onLiquidityReceived".to_string(),
                    found: "receiveFlashMint".to_string(),
                }
            }
        );
        assert_eq!(b.calls, 0);
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn pool_without_liquidity_reverts() {
        let (mut ledger, mut orch, profile) = setup(LenderKind::Pool);
        let mut b = Scripted::new(0);
        let outcome = orch.execute(
            &mut ledger,
            &profile,
            &mut b,
            LoanRequest::new(addr(ASSET), U256::from(5_000_000), addr(BORROWER)),
        );
        assert!(matches!(
            outcome,
            ExecutionOutcome::Reverted {
                reason: ArbError::InsufficientBalance { .. }
            }
        ));
        assert_eq!(b.calls, 0);
        assert_eq!(orch.cycles(), 1);
    }

    #[test]
    fn request_for_another_borrower_is_unauthorized() {
        let (mut ledger, mut orch, profile) = setup(LenderKind::Pool);
        let mut b = Scripted::new(100_100);
        let outcome = orch.execute(
            &mut ledger,
            &profile,
            &mut b,
            LoanRequest::new(addr(ASSET), U256::from(100_000), addr(0x55)),
        );
        assert!(matches!(
            outcome,
            ExecutionOutcome::Reverted {
                reason: ArbError::Unauthorized { .. }
            }
        ));
    }
}
