// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network profiles: per-chain submission parameters.
//!
//! A profile is read once at startup and passed explicitly to everything that
//! submits or labels a cycle. Nothing in the crate holds a "current network".

use crate::error::ArbError;
use crate::executor::gas::{FeePolicy, GWEI};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default confirmation depth before a submission counts as final.
pub const DEFAULT_CONFIRMATIONS: u64 = 3;

/// Immutable description of one deployment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub fee_policy: FeePolicy,
    /// Gas ceiling per submitted operation.
    pub gas_limit: u64,
    pub confirmations: u64,
    pub testnet: bool,
}

impl NetworkProfile {
    /// Built-in profile by name: `sepolia`, `mainnet` or `arbitrum`.
    ///
    /// The RPC URL is left empty; configuration fills it in.
    pub fn builtin(name: &str) -> Result<Self, ArbError> {
        let profile = match name.to_lowercase().as_str() {
            "sepolia" => Self {
                name: "sepolia".to_string(),
                chain_id: 11_155_111,
                rpc_url: String::new(),
                fee_policy: FeePolicy::Fixed {
                    gas_price: 20 * GWEI,
                },
                gas_limit: 3_000_000,
                confirmations: DEFAULT_CONFIRMATIONS,
                testnet: true,
            },
            "mainnet" => Self {
                name: "mainnet".to_string(),
                chain_id: 1,
                rpc_url: String::new(),
                fee_policy: FeePolicy::Market {
                    max_fee_per_gas: 80 * GWEI,
                    max_priority_fee_per_gas: 2 * GWEI,
                },
                gas_limit: 1_500_000,
                confirmations: DEFAULT_CONFIRMATIONS,
                testnet: false,
            },
            "arbitrum" => Self {
                name: "arbitrum".to_string(),
                chain_id: 42_161,
                rpc_url: String::new(),
                fee_policy: FeePolicy::Market {
                    max_fee_per_gas: GWEI,
                    max_priority_fee_per_gas: 0,
                },
                gas_limit: 4_000_000,
                confirmations: DEFAULT_CONFIRMATIONS,
                testnet: false,
            },
            other => {
                return Err(ArbError::Config(format!(
                    "Unknown network {other} (expected sepolia, mainnet or arbitrum)"
                )))
            }
        };
        Ok(profile)
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_fee_policy(mut self, fee_policy: FeePolicy) -> Self {
        self.fee_policy = fee_policy;
        self
    }
}

impl fmt::Display for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (chain {})", self.name, self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles() {
        let sepolia = NetworkProfile::builtin("Sepolia").unwrap();
        assert!(sepolia.testnet);
        assert!(matches!(sepolia.fee_policy, FeePolicy::Fixed { .. }));
        assert_eq!(sepolia.confirmations, 3);

        let mainnet = NetworkProfile::builtin("mainnet").unwrap();
        assert_eq!(mainnet.chain_id, 1);
        assert!(mainnet.fee_policy.needs_base_fee());

        assert!(matches!(
            NetworkProfile::builtin("goerli"),
            Err(ArbError::Config(_))
        ));
    }

    #[test]
    fn overrides_do_not_touch_other_fields() {
        let p = NetworkProfile::builtin("arbitrum")
            .unwrap()
            .with_confirmations(12)
            .with_rpc_url("http://localhost:8545");
        assert_eq!(p.confirmations, 12);
        assert_eq!(p.rpc_url, "http://localhost:8545");
        assert_eq!(p.chain_id, 42_161);
        assert_eq!(p.to_string(), "arbitrum (chain 42161)");
    }
}
