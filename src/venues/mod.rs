// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Swap and unwrap venues operating on ledger balances.

pub mod index;
pub mod router;

pub use index::{WeightedIndex, WrappedAsset};
pub use router::{ConstantProductRouter, PairSpec, SwapRouter, DEFAULT_SWAP_FEE_BPS};
