// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fee policy for transaction submission.

use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use serde::{Deserialize, Serialize};

/// 1 gwei in wei.
pub const GWEI: u128 = 1_000_000_000;

/// How a network prices gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeePolicy {
    /// Legacy pricing with a fixed gas price.
    Fixed { gas_price: u128 },
    /// EIP-1559 pricing: a cap on the total fee plus a priority tip.
    Market {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

/// Concrete fee fields for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasParams {
    Legacy { gas_price: u128 },
    Eip1559 { max_fee: u128, priority_fee: u128 },
}

impl FeePolicy {
    /// Whether the policy needs the latest base fee to price a transaction.
    pub fn needs_base_fee(&self) -> bool {
        matches!(self, Self::Market { .. })
    }

    /// Price a transaction given the latest base fee.
    ///
    /// Market pricing bids `2 * base_fee + priority`, clamped to the cap.
    pub fn calculate(&self, base_fee: u128) -> GasParams {
        match *self {
            Self::Fixed { gas_price } => GasParams::Legacy { gas_price },
            Self::Market {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let bid = base_fee
                    .saturating_mul(2)
                    .saturating_add(max_priority_fee_per_gas);
                let max_fee = bid.min(max_fee_per_gas);
                GasParams::Eip1559 {
                    max_fee,
                    priority_fee: max_priority_fee_per_gas.min(max_fee),
                }
            }
        }
    }
}

impl GasParams {
    pub fn apply(&self, tx: TransactionRequest) -> TransactionRequest {
        match *self {
            Self::Legacy { gas_price } => tx.with_gas_price(gas_price),
            Self::Eip1559 {
                max_fee,
                priority_fee,
            } => tx
                .with_max_fee_per_gas(max_fee)
                .with_max_priority_fee_per_gas(priority_fee),
        }
    }
}
