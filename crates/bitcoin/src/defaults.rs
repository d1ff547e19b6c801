//! The default network, selected by feature flag, and the address-taking
//! conveniences that depend on it.

use crate::{
    enc::encoder::Address,
    error::TxResult,
    transaction::Transaction,
};

#[cfg(feature = "mainnet")]
/// The default network encoder, selected by feature flag.
pub mod network {
    /// The default encoder, selected by feature flag
    pub type Encoder = crate::enc::encoder::MainnetEncoder;
}

#[cfg(all(feature = "testnet", not(feature = "mainnet")))]
/// The default network encoder, selected by feature flag.
pub mod network {
    /// The default encoder, selected by feature flag
    pub type Encoder = crate::enc::encoder::TestnetEncoder;
}

impl std::str::FromStr for Address {
    type Err = crate::enc::bases::EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        network::Encoder::string_to_address(s)
    }
}

impl Transaction {
    /// Add an output paying `value` to `address`, decoded with the default
    /// network encoder.
    pub fn pay(&mut self, address: &Address, value: u64) -> TxResult<&mut Self> {
        let script = network::Encoder::decode_address(address)?;
        self.pay_script_pubkey(value, script)
    }

    /// Add a batch of payment outputs.
    pub fn pay_many(&mut self, payments: &[(Address, u64)]) -> TxResult<&mut Self> {
        for (address, value) in payments.iter() {
            self.pay(address, *value)?;
        }
        Ok(self)
    }

    /// Set the change address for this transaction. The change output
    /// itself is computed lazily, during the next signing pass.
    pub fn change(&mut self, address: &Address) -> TxResult<&mut Self> {
        let script = network::Encoder::decode_address(address)?;
        Ok(self.change_script_pubkey(script))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_parses_addresses_with_the_default_network() {
        let addr: Address = "bc1qza7dfgl2q83cf68fqkkdd754qx546h4u9vd9tg".parse().unwrap();
        assert!(matches!(addr, Address::WPKH(_)));
    }
}
