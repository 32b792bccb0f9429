// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration module - loads settings from environment variables.

use crate::error::ArbError;
use crate::executor::{FeePolicy, DEFAULT_DEADLINE_BOUND_SECS, GWEI};
use crate::flash::CallbackInterface;
use crate::network::NetworkProfile;
use alloy::primitives::Address;
use std::str::FromStr;

/// Settings for one run of the client.
#[derive(Debug, Clone)]
pub struct Config {
    // Network
    pub profile: NetworkProfile,

    // Wallet
    pub private_key: Option<String>,
    pub wallet_address: Option<Address>,

    // Contracts
    pub arb_contract: Option<Address>,
    pub callback_interface: CallbackInterface,

    // Swaps
    pub deadline_bound_secs: u64,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ArbError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ArbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(get);
        let network = env.var_or("NETWORK", "sepolia");
        let base = NetworkProfile::builtin(&network)?;

        let rpc_var = format!("{}_RPC_URL", base.name.to_uppercase());
        let rpc_url = env.var(&rpc_var).unwrap_or_default();

        let mut profile = base
            .clone()
            .with_rpc_url(rpc_url)
            .with_confirmations(env.parse_or("CONFIRMATIONS", base.confirmations)?)
            .with_gas_limit(env.parse_or("GAS_LIMIT", base.gas_limit)?);
        profile.fee_policy = fee_policy(&env, base.fee_policy)?;

        Ok(Self {
            profile,

            private_key: env.var("PRIVATE_KEY"),
            wallet_address: env.var("WALLET_ADDRESS").map(|s| parse_address(&s)).transpose()?,

            arb_contract: env.var("ARB_CONTRACT").map(|s| parse_address(&s)).transpose()?,
            callback_interface: env
                .var_or("CALLBACK_INTERFACE", "onLiquidityReceived")
                .parse()?,

            deadline_bound_secs: env.parse_or("DEADLINE_BOUND_SECS", DEFAULT_DEADLINE_BOUND_SECS)?,
        })
    }

    pub fn private_key(&self) -> Result<&str, ArbError> {
        self.private_key
            .as_deref()
            .ok_or_else(|| ArbError::Config("PRIVATE_KEY not set".to_string()))
    }

    pub fn arb_contract(&self) -> Result<Address, ArbError> {
        self.arb_contract
            .ok_or_else(|| ArbError::Config("ARB_CONTRACT not set".to_string()))
    }

    /// Check the configured wallet matches the signer derived from the key.
    pub fn check_signer(&self, signer: Address) -> Result<(), ArbError> {
        match self.wallet_address {
            Some(wallet) if wallet != signer => Err(ArbError::Config(format!(
                "WALLET_ADDRESS {wallet} does not match PRIVATE_KEY signer {signer}"
            ))),
            _ => Ok(()),
        }
    }
}

/// `GAS_PRICE_GWEI` forces fixed pricing, `MAX_FEE_GWEI` forces market
/// pricing. Setting both is an error.
fn fee_policy<F>(env: &Env<F>, default: FeePolicy) -> Result<FeePolicy, ArbError>
where
    F: Fn(&str) -> Option<String>,
{
    let gas_price = env.gwei("GAS_PRICE_GWEI")?;
    let max_fee = env.gwei("MAX_FEE_GWEI")?;
    let priority = env.gwei("PRIORITY_FEE_GWEI")?;

    match (gas_price, max_fee, default) {
        (Some(_), Some(_), _) => Err(ArbError::Config(
            "GAS_PRICE_GWEI and MAX_FEE_GWEI are mutually exclusive".to_string(),
        )),
        (Some(gas_price), None, _) => Ok(FeePolicy::Fixed { gas_price }),
        (
            None,
            max_fee,
            FeePolicy::Market {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            },
        ) => Ok(FeePolicy::Market {
            max_fee_per_gas: max_fee.unwrap_or(max_fee_per_gas),
            max_priority_fee_per_gas: priority.unwrap_or(max_priority_fee_per_gas),
        }),
        (None, Some(max_fee_per_gas), FeePolicy::Fixed { .. }) => Ok(FeePolicy::Market {
            max_fee_per_gas,
            max_priority_fee_per_gas: priority.unwrap_or_default(),
        }),
        (None, None, fixed) => Ok(fixed),
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn var_or(&self, name: &str, default: &str) -> String {
        self.var(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, ArbError>
    where
        T::Err: std::fmt::Display,
    {
        self.var(name)
            .map(|v| {
                v.trim()
                    .parse()
                    .map_err(|e| ArbError::Config(format!("Invalid {}: {}", name, e)))
            })
            .transpose()
    }

    /// A gwei amount converted to wei.
    fn gwei(&self, name: &str) -> Result<Option<u128>, ArbError> {
        self.parse::<u128>(name)?
            .map(|g| {
                g.checked_mul(GWEI).ok_or_else(|| {
                    ArbError::Config(format!("{name} of {g} gwei is out of range"))
                })
            })
            .transpose()
    }

    fn parse_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, ArbError>
    where
        T::Err: std::fmt::Display,
    {
        Ok(self.parse(name)?.unwrap_or(default))
    }
}

fn parse_address(s: &str) -> Result<Address, ArbError> {
    Address::from_str(s.trim())
        .map_err(|e| ArbError::Config(format!("Invalid address {}: {}", s, e)))
}
