// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Flash liquidity protocol: fee model, callback contract and lender.

pub mod callback;
pub mod fee;
pub mod lender;

pub use callback::{CallbackInterface, FlashBorrower, LoanState, LoanTicket};
pub use fee::{check_bps, compute_fee, repayment_due, BPS};
pub use lender::{FlashLender, LenderKind, LoanRequest, Settlement};
