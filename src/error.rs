// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error taxonomy for flash-liquidity cycles.

use alloy::primitives::{Address, U256};
use thiserror::Error;

/// Every way a cycle, an adapter call or a submission can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbError {
    #[error("Insufficient balance of {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: Address,
        required: U256,
        available: U256,
    },

    #[error("Insufficient allowance of {asset} for {spender}: required {required}, approved {approved}")]
    InsufficientAllowance {
        asset: Address,
        spender: Address,
        required: U256,
        approved: U256,
    },

    #[error("Slippage exceeded: minimum {minimum}, received {received}")]
    SlippageExceeded { minimum: U256, received: U256 },

    #[error("Repayment shortfall: required {required}, repaid {repaid}")]
    RepaymentShortfall { required: U256, repaid: U256 },

    #[error("Callback interface mismatch: lender calls {expected}, borrower exposes {found}")]
    InterfaceMismatch { expected: String, found: String },

    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Deadline exceeded: deadline {deadline}, now {now}")]
    DeadlineExceeded { deadline: u64, now: u64 },

    #[error("Invalid swap path: {0}")]
    InvalidPath(String),

    #[error("Invalid debond distribution: {0}")]
    InvalidDistribution(String),

    #[error("Nothing to unwrap: balance of {0} is zero")]
    NothingToUnwrap(Address),

    #[error("Unauthorized: {caller} is not the owner {owner}")]
    Unauthorized { caller: Address, owner: Address },

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Invalid loan state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Venue reverted: {0}")]
    VenueReverted(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl ArbError {
    /// Failures the ledger resolves by discarding the whole atomic unit.
    pub fn is_ledger_revert(&self) -> bool {
        matches!(
            self,
            Self::SlippageExceeded { .. }
                | Self::RepaymentShortfall { .. }
                | Self::InterfaceMismatch { .. }
                | Self::DeadlineExceeded { .. }
                | Self::VenueReverted(_)
        )
    }

    /// Process exit code for the CLI boundary.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SubmissionRejected(_) => 2,
            Self::Config(_) | Self::Rpc(_) => 3,
            _ => 1,
        }
    }
}

/// Map a revert string from `eth_call` or a node error back into the taxonomy.
///
/// Matches the messages emitted by Uniswap V2 style routers, the borrower
/// contracts and common node implementations. Unknown reasons become
/// [`ArbError::VenueReverted`].
pub fn classify_revert(reason: &str) -> ArbError {
    let lower = reason.to_lowercase();

    if lower.contains("nonce too low")
        || lower.contains("replacement transaction underpriced")
        || lower.contains("already known")
        || lower.contains("fee cap less than block base fee")
        || lower.contains("max fee per gas less than block base fee")
        || lower.contains("transaction underpriced")
        || lower.contains("insufficient funds")
    {
        return ArbError::SubmissionRejected(reason.to_string());
    }

    if lower.contains("expired") || lower.contains("deadline") {
        return ArbError::DeadlineExceeded {
            deadline: 0,
            now: 0,
        };
    }

    if lower.contains("insufficient_output_amount")
        || lower.contains("insufficient output")
        || lower.contains("too little received")
        || lower.contains("slippage")
    {
        return ArbError::SlippageExceeded {
            minimum: U256::ZERO,
            received: U256::ZERO,
        };
    }

    if lower.contains("repay")
        || lower.contains("flash loan not returned")
        || lower.contains("not enough to repay")
    {
        return ArbError::RepaymentShortfall {
            required: U256::ZERO,
            repaid: U256::ZERO,
        };
    }

    if lower.contains("function selector was not recognized")
        || lower.contains("no fallback")
        || lower.contains("callback")
    {
        return ArbError::InterfaceMismatch {
            expected: "unknown".to_string(),
            found: reason.to_string(),
        };
    }

    if lower.contains("exceeds balance") || lower.contains("insufficient balance") {
        return ArbError::InsufficientBalance {
            asset: Address::ZERO,
            required: U256::ZERO,
            available: U256::ZERO,
        };
    }

    ArbError::VenueReverted(reason.to_string())
}
