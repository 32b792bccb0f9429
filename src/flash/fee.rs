// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Flash loan fee model.
//!
//! Both the lender's enforcement check and the borrower's repayment go through
//! [`compute_fee`], so the two sides can never disagree on what is owed.

use crate::error::ArbError;
use alloy::primitives::U256;

/// Fee divisor: 1/1000 = 0.1%.
pub const FEE_DIVISOR: u64 = 1_000;

/// Fee owed on `principal`: `max(1, floor(principal / 1000))`, or zero when
/// nothing is borrowed.
pub fn compute_fee(principal: U256) -> U256 {
    if principal.is_zero() {
        return U256::ZERO;
    }
    (principal / U256::from(FEE_DIVISOR)).max(U256::from(1))
}

/// Basis point denominator shared by transfer, swap and debond fees.
pub const BPS: u16 = 10_000;

/// Reject a basis-point rate above 100%.
pub fn check_bps(field: &str, bps: u16) -> Result<u16, ArbError> {
    if bps > BPS {
        return Err(ArbError::Config(format!("{field} of {bps} bps exceeds {BPS}")));
    }
    Ok(bps)
}

/// Principal plus fee.
pub fn repayment_due(principal: U256) -> Result<U256, ArbError> {
    principal
        .checked_add(compute_fee(principal))
        .ok_or(ArbError::Overflow("repayment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_examples() {
        assert_eq!(compute_fee(U256::ZERO), U256::ZERO);
        assert_eq!(compute_fee(U256::from(1)), U256::from(1));
        assert_eq!(compute_fee(U256::from(500)), U256::from(1));
        assert_eq!(compute_fee(U256::from(1000)), U256::from(1));
        assert_eq!(compute_fee(U256::from(1999)), U256::from(1));
        assert_eq!(compute_fee(U256::from(2000)), U256::from(2));
        assert_eq!(compute_fee(U256::from(100_000)), U256::from(100));
    }

    #[test]
    fn fee_is_monotonic() {
        let mut last = U256::ZERO;
        for p in (0u64..5_000).chain([9_999, 10_000, 10_001, 1_000_000]) {
            let fee = compute_fee(U256::from(p));
            assert!(fee >= last, "fee decreased at {p}");
            last = fee;
        }
    }

    #[test]
    fn repayment_overflow_is_reported() {
        assert_eq!(
            repayment_due(U256::MAX),
            Err(ArbError::Overflow("repayment"))
        );
        assert_eq!(repayment_due(U256::from(100_000)), Ok(U256::from(100_100)));
    }

    #[test]
    fn bps_above_whole_is_rejected() {
        assert_eq!(check_bps("fee_bps", 0), Ok(0));
        assert_eq!(check_bps("fee_bps", BPS), Ok(BPS));
        assert!(matches!(check_bps("fee_bps", BPS + 1), Err(ArbError::Config(_))));
    }
}
