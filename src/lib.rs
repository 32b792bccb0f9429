// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Flash-liquidity arbitrage: borrow, convert through swap and debond venues,
//! repay principal plus fee, all or nothing.

pub mod arbitrage;
pub mod config;
pub mod error;
pub mod executor;
pub mod flash;
pub mod ledger;
pub mod network;
pub mod recovery;
pub mod rpc;
pub mod venues;

pub use error::ArbError;
