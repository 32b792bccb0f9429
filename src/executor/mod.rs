// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Swap, unwrap and fee-policy adapters used inside a cycle.

pub mod debond;
pub mod gas;
pub mod swap;

pub use debond::{DebondAdapter, Distribution, DistributionLeg};
pub use gas::{FeePolicy, GasParams, GWEI};
pub use swap::{Asset, CallShape, SwapAdapter, SwapPath, DEFAULT_DEADLINE_BOUND_SECS};
