// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Provider setup for a network profile.

use crate::error::ArbError;
use crate::network::NetworkProfile;
use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};

/// Create a signing provider for `profile` and return it with the signer
/// address.
pub fn create_provider(
    profile: &NetworkProfile,
    private_key: &str,
) -> Result<(impl Provider + Clone, Address), ArbError> {
    let signer: PrivateKeySigner = private_key
        .parse()
        .map_err(|e| ArbError::Config(format!("Invalid private key: {e}")))?;
    let address = signer.address();

    let url: Url = profile
        .rpc_url
        .parse()
        .map_err(|e| ArbError::Config(format!("Invalid RPC URL for {profile}: {e}")))?;

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url);

    Ok((provider, address))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key; never funded on a real network.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_signer_address() {
        let profile = NetworkProfile::builtin("sepolia")
            .unwrap()
            .with_rpc_url("http://127.0.0.1:8545");
        let (_, address) = create_provider(&profile, DEV_KEY).unwrap();
        assert_eq!(
            address,
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn rejects_bad_inputs() {
        let profile = NetworkProfile::builtin("sepolia").unwrap();
        assert!(matches!(
            create_provider(&profile, DEV_KEY),
            Err(ArbError::Config(_))
        ));
        let profile = profile.with_rpc_url("http://127.0.0.1:8545");
        assert!(create_provider(&profile, "0x1234").is_err());
    }
}
