// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Swap router adapter: approve-then-swap with call shape selection.

use crate::error::ArbError;
use crate::ledger::{balance_delta, Ledger};
use crate::venues::SwapRouter;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Staleness bound added to the current time to form a swap deadline.
pub const DEFAULT_DEADLINE_BOUND_SECS: u64 = 1800;

/// An asset as seen by a swap path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub address: Address,
    /// Declared fee-on-transfer: transfers deliver less than sent.
    #[serde(default)]
    pub fee_on_transfer: bool,
}

impl Asset {
    pub fn standard(address: Address) -> Self {
        Self {
            address,
            fee_on_transfer: false,
        }
    }

    pub fn fee_on_transfer(address: Address) -> Self {
        Self {
            address,
            fee_on_transfer: true,
        }
    }
}

/// Route through a router: the first asset is sold, the last is bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Asset>", into = "Vec<Asset>")]
pub struct SwapPath(Vec<Asset>);

impl SwapPath {
    pub fn new(assets: Vec<Asset>) -> Result<Self, ArbError> {
        if assets.len() < 2 {
            return Err(ArbError::InvalidPath(format!(
                "path needs at least 2 assets, got {}",
                assets.len()
            )));
        }
        if let Some(hop) = assets.windows(2).find(|hop| hop[0].address == hop[1].address) {
            return Err(ArbError::InvalidPath(format!(
                "hop from {} to itself",
                hop[0].address
            )));
        }
        Ok(Self(assets))
    }

    pub fn input(&self) -> Address {
        self.0[0].address
    }

    pub fn output(&self) -> Address {
        self.0[self.0.len() - 1].address
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.0.iter().map(|a| a.address).collect()
    }

    pub fn has_fee_on_transfer(&self) -> bool {
        self.0.iter().any(|a| a.fee_on_transfer)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.0
    }
}

impl TryFrom<Vec<Asset>> for SwapPath {
    type Error = ArbError;

    fn try_from(assets: Vec<Asset>) -> Result<Self, Self::Error> {
        Self::new(assets)
    }
}

impl From<SwapPath> for Vec<Asset> {
    fn from(path: SwapPath) -> Self {
        path.0
    }
}

/// Which router entry point a swap goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// `swapExactTokensForTokens`
    Standard,
    /// `swapExactTokensForTokensSupportingFeeOnTransferTokens`
    FeeOnTransferTolerant,
}

impl CallShape {
    pub fn for_path(path: &SwapPath) -> Self {
        if path.has_fee_on_transfer() {
            Self::FeeOnTransferTolerant
        } else {
            Self::Standard
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallShape::Standard => write!(f, "swapExactTokensForTokens"),
            CallShape::FeeOnTransferTolerant => {
                write!(f, "swapExactTokensForTokensSupportingFeeOnTransferTokens")
            }
        }
    }
}

/// Stateless adapter in front of one router.
#[derive(Clone)]
pub struct SwapAdapter {
    router: Arc<dyn SwapRouter>,
    deadline_bound: u64,
}

impl SwapAdapter {
    pub fn new(router: Arc<dyn SwapRouter>) -> Self {
        Self {
            router,
            deadline_bound: DEFAULT_DEADLINE_BOUND_SECS,
        }
    }

    pub fn with_deadline_bound(mut self, seconds: u64) -> Self {
        self.deadline_bound = seconds;
        self
    }

    pub fn router(&self) -> Address {
        self.router.address()
    }

    /// Deadline for a swap submitted at `now`.
    pub fn deadline_from(&self, now: u64) -> u64 {
        now.saturating_add(self.deadline_bound)
    }

    /// Approve the router for at least `amount`. Returns whether an approval
    /// was issued.
    pub fn ensure_allowance(
        &self,
        ledger: &mut dyn Ledger,
        owner: Address,
        asset: Address,
        amount: U256,
    ) -> Result<bool, ArbError> {
        let spender = self.router.address();
        if ledger.allowance(asset, owner, spender) >= amount {
            return Ok(false);
        }
        ledger.approve(asset, owner, spender, amount)?;
        debug!("Approved {} of {} for router {}", amount, asset, spender);
        Ok(true)
    }

    /// Swap `amount_in` along `path` and return what `recipient` actually
    /// received.
    pub fn swap(
        &self,
        ledger: &mut dyn Ledger,
        caller: Address,
        path: &SwapPath,
        amount_in: U256,
        min_out: U256,
        recipient: Address,
        deadline: u64,
    ) -> Result<U256, ArbError> {
        let now = ledger.now();
        if deadline < now {
            return Err(ArbError::DeadlineExceeded { deadline, now });
        }

        let hops = path.addresses();
        if let Some(hop) = hops
            .windows(2)
            .find(|hop| self.router.pair_for(hop[0], hop[1]).is_none())
        {
            return Err(ArbError::InvalidPath(format!(
                "router {} has no pair for {} -> {}",
                self.router.address(),
                hop[0],
                hop[1]
            )));
        }

        let available = ledger.balance_of(path.input(), caller);
        if available < amount_in {
            return Err(ArbError::InsufficientBalance {
                asset: path.input(),
                required: amount_in,
                available,
            });
        }

        self.ensure_allowance(ledger, caller, path.input(), amount_in)?;

        let shape = CallShape::for_path(path);
        let before = ledger.balance_of(path.output(), recipient);
        match shape {
            CallShape::Standard => {
                self.router.swap_exact_tokens_for_tokens(
                    ledger, caller, amount_in, min_out, &hops, recipient, deadline,
                )?;
            }
            CallShape::FeeOnTransferTolerant => {
                self.router
                    .swap_exact_tokens_for_tokens_supporting_fee_on_transfer_tokens(
                        ledger, caller, amount_in, min_out, &hops, recipient, deadline,
                    )?;
            }
        }

        let received = balance_delta(ledger, path.output(), recipient, before);
        if received < min_out {
            return Err(ArbError::SlippageExceeded {
                minimum: min_out,
                received,
            });
        }

        info!(
            "🔄 Swapped {} {} -> {} {} via {}",
            amount_in,
            path.input(),
            received,
            path.output(),
            shape
        );
        Ok(received)
    }
}
