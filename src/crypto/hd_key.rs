//! BIP44 key derivation
//!
//! Every key lives at `m/44'/coin'/account'/0/index` where `coin` is 0 on
//! mainnet and 1 on every test chain, and `account` is the numeric value of
//! the [`AccountType`].

use crate::crypto::seed::validate_seed;
use crate::errors::{AppError, AppResult};
use crate::types::{AccountType, DerivedKey};
use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::secp256k1::{All, Secp256k1};
use bitcoin::{Address, CompressedPublicKey, Network, NetworkKind, PrivateKey};
use tracing::debug;

const PURPOSE: u32 = 44;
const EXTERNAL_CHAIN: u32 = 0;
/// First hardened index; normal child indices must stay below it
const MAX_CHILD_INDEX: u32 = 0x7FFF_FFFF;

pub struct HdKeyDeriver {
    network: Network,
    secp: Secp256k1<All>,
}

impl HdKeyDeriver {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            secp: Secp256k1::new(),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// SLIP-44 coin type
    pub fn coin_type(&self) -> u32 {
        match self.network {
            Network::Bitcoin => 0,
            _ => 1,
        }
    }

    pub fn derivation_path(&self, account: AccountType, index: u32) -> AppResult<DerivationPath> {
        Ok(DerivationPath::from(vec![
            ChildNumber::from_hardened_idx(PURPOSE)?,
            ChildNumber::from_hardened_idx(self.coin_type())?,
            ChildNumber::from_hardened_idx(account.derivation_value()?)?,
            ChildNumber::from_normal_idx(EXTERNAL_CHAIN)?,
            ChildNumber::from_normal_idx(index)?,
        ]))
    }

    /// Derive `count` consecutive keys for `account` starting at `start`
    pub fn derive_range(
        &self,
        seed: &[u8],
        account: AccountType,
        start: u32,
        count: u32,
    ) -> AppResult<Vec<DerivedKey>> {
        validate_seed(seed)?;
        let last = start
            .checked_add(count)
            .filter(|end| *end <= MAX_CHILD_INDEX)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "index range {}+{} exceeds the non-hardened range",
                    start, count
                ))
            })?;

        let master = Xpriv::new_master(self.network, seed)?;

        let chain_path = DerivationPath::from(vec![
            ChildNumber::from_hardened_idx(PURPOSE)?,
            ChildNumber::from_hardened_idx(self.coin_type())?,
            ChildNumber::from_hardened_idx(account.derivation_value()?)?,
            ChildNumber::from_normal_idx(EXTERNAL_CHAIN)?,
        ]);
        let chain = master.derive_priv(&self.secp, &chain_path)?;

        let mut keys = Vec::with_capacity(count as usize);
        for index in start..last {
            let child = chain.derive_priv(&self.secp, &[ChildNumber::from_normal_idx(index)?])?;
            keys.push(self.key_from_private(account, index, child.to_priv()));
        }

        debug!(
            "Derived {} keys for {} (indices {}..{})",
            keys.len(),
            account,
            start,
            last
        );
        Ok(keys)
    }

    fn key_from_private(&self, account: AccountType, index: u32, private: PrivateKey) -> DerivedKey {
        let public = CompressedPublicKey(private.inner.public_key(&self.secp));
        DerivedKey {
            account,
            index,
            p2pkh_address: Address::p2pkh(public.pubkey_hash(), self.network).to_string(),
            p2sh_segwit_address: Address::p2shwpkh(&public, self.network).to_string(),
            bech32_address: Address::p2wpkh(&public, self.network).to_string(),
            full_public_key: public.to_string(),
            wif: private.to_wif(),
        }
    }

    /// Decode a stored WIF
    ///
    /// Anything that fails here was written by this wallet, so the error is
    /// fatal for the batch rather than a per-record skip.
    pub fn decode_wif(&self, wif: &str) -> AppResult<PrivateKey> {
        let key = PrivateKey::from_wif(wif)
            .map_err(|e| AppError::CorruptKey(format!("undecodable WIF: {}", e)))?;
        self.check_network_kind(key.network)?;
        Ok(key)
    }

    /// Compressed public key (hex) belonging to a WIF
    pub fn public_key_hex(&self, wif: &str) -> AppResult<String> {
        let key = self.decode_wif(wif)?;
        Ok(CompressedPublicKey(key.inner.public_key(&self.secp)).to_string())
    }

    /// Reject an address string that does not belong to the configured chain
    pub fn check_address(&self, address: &str) -> AppResult<Address> {
        let unchecked: Address<bitcoin::address::NetworkUnchecked> = address
            .parse()
            .map_err(|e| AppError::InvalidData(format!("invalid address {}: {}", address, e)))?;
        unchecked
            .require_network(self.network)
            .map_err(|_| AppError::NetworkMismatch {
                expected: self.network.to_string(),
                found: address.to_string(),
            })
    }

    fn check_network_kind(&self, found: NetworkKind) -> AppResult<()> {
        let expected = NetworkKind::from(self.network);
        if found != expected {
            return Err(AppError::NetworkMismatch {
                expected: format!("{:?}", expected),
                found: format!("{:?}", found),
            });
        }
        Ok(())
    }
}
